//! Configuration types for the EVE inspector
//!
//! Defines:
//! - `Settings` - contents of `.eve/config.toml`
//! - `SummarySettings`, `GedSettings` - per-panel sections

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eve_core::prelude::*;
use eve_core::ColorIndex;

use crate::highlight::DEFAULT_HIGHLIGHT_DEBOUNCE_MS;
use crate::schema::{ClassSchemaDef, SchemaRegistry, SchemaRegistryBuilder};
use crate::summary::{DEFAULT_EXPAND_LEVEL, GLOBAL_HIGHLIGHT_NAME};
use crate::widget::{WidgetFactory, DEFAULT_PALETTE, DEFAULT_STRING_WIDTH_PX, DEFAULT_SWATCH_COLOR};

/// Global settings from `.eve/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub summary: SummarySettings,

    #[serde(default)]
    pub ged: GedSettings,

    /// ROOT colour index -> CSS colour, on top of the ROOT colour table
    #[serde(default)]
    pub colors: BTreeMap<String, String>,

    /// Extra class schemas for the generic editor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<ClassSchemaDef>,
}

impl Settings {
    /// Colour-index table with the configured overrides.
    ///
    /// Keys that are not colour indices are skipped with a warning.
    pub fn color_index(&self) -> ColorIndex {
        let mut colors = ColorIndex::new();
        for (key, color) in &self.colors {
            match key.trim().parse::<u32>() {
                Ok(index) => colors.insert(index, color.clone()),
                Err(_) => warn!("Ignoring colour override with non-numeric index {:?}", key),
            }
        }
        colors
    }

    /// Built-in schemas extended with the `[[schema]]` sections.
    pub fn schema_registry(&self) -> Result<SchemaRegistry> {
        Ok(SchemaRegistryBuilder::with_eve_defaults()
            .define(&self.schema)?
            .build())
    }

    pub fn widget_factory(&self) -> WidgetFactory {
        WidgetFactory {
            palette: self.ged.palette.clone(),
            default_color: self.ged.default_color.clone(),
            string_width_px: self.ged.string_width_px,
        }
    }
}

/// Summary tree settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SummarySettings {
    /// Depth expanded after a rebuild
    #[serde(default = "default_expand_level")]
    pub expand_level: usize,

    /// Quiet period before a hover highlight is sent
    #[serde(default = "default_highlight_debounce_ms")]
    pub highlight_debounce_ms: u64,

    /// Name of the selection that receives hover highlights
    #[serde(default = "default_highlight_selection")]
    pub highlight_selection: String,

    /// Most nodes a summary rebuild keeps, in tree order (0 = unlimited)
    #[serde(default)]
    pub size_limit: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            expand_level: default_expand_level(),
            highlight_debounce_ms: default_highlight_debounce_ms(),
            highlight_selection: default_highlight_selection(),
            size_limit: 0,
        }
    }
}

fn default_expand_level() -> usize {
    DEFAULT_EXPAND_LEVEL
}

fn default_highlight_debounce_ms() -> u64 {
    DEFAULT_HIGHLIGHT_DEBOUNCE_MS
}

fn default_highlight_selection() -> String {
    GLOBAL_HIGHLIGHT_NAME.to_string()
}

/// Generic editor settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GedSettings {
    /// Colours offered by the swatch palette
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    #[serde(default = "default_swatch_color")]
    pub default_color: String,

    /// Width hint for text inputs
    #[serde(default = "default_string_width_px")]
    pub string_width_px: u32,
}

impl Default for GedSettings {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            default_color: default_swatch_color(),
            string_width_px: default_string_width_px(),
        }
    }
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

fn default_swatch_color() -> String {
    DEFAULT_SWATCH_COLOR.to_string()
}

fn default_string_width_px() -> u32 {
    DEFAULT_STRING_WIDTH_PX
}
