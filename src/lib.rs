//! EVE inspector library
//!
//! Drives the summary tree, generic editor and fit panel of an EVE event
//! display without a browser: headless NDJSON mode plus one-shot inspection
//! of scene dumps.

pub mod headless;
pub mod inspect;

// Re-export main entry points
pub use headless::runner::run_headless;
