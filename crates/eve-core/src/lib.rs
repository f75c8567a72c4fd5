//! # eve-core - Core Domain Types
//!
//! Foundation crate for the EVE inspector. Provides scene element snapshots,
//! colour tables, backend notification types, error handling, and logging
//! setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Elements (`element`)
//! - [`Element`] - Snapshot of a backend element with its streamed members
//! - [`ElementId`] - Backend element identifier
//! - [`ElementSource`] - Read access to the live element tree
//! - [`Scene`] - Local mirror of the element tree, indexed by id
//! - [`ElementChange`] - Per-element change notification
//!
//! ### Colours (`color`)
//! - [`Rgb`] - 8-bit RGB triple
//! - [`parse_color()`] - Parse `rgb(r,g,b)`, `#hex` or CSS colour names
//! - [`ColorIndex`] - ROOT colour-index table with overrides
//!
//! ### Events (`events`)
//! - [`SceneNotification`] - Element manager notifications
//! - [`PanelMessage`] - Prefixed fit-panel frames
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use eve_core::prelude::*;
//! ```

pub mod color;
pub mod element;
pub mod error;
pub mod events;
pub mod logging;
pub mod prelude;

// Re-export commonly used types at crate root for convenience
pub use color::{named_color_hex, parse_color, parse_hex, ColorIndex, Rgb, NAMED_COLORS};
pub use element::{
    short_type_name, Element, ElementChange, ElementId, ElementSource, Scene, TYPE_NAMESPACE,
};
pub use error::{Error, Result, ResultExt};
pub use events::{PanelMessage, SceneNotification};
