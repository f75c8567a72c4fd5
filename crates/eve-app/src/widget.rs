//! Widget factory for the generic editor.
//!
//! Maps each [`EditorRecord`] to a typed [`Control`] and a [`ChangeHandler`]
//! that turns user edits into [`Invocation`]s. Controls are plain data: a
//! front-end renders them and feeds back [`ControlEvent`]s.

use serde::{Deserialize, Serialize};

use eve_core::parse_color;
use eve_core::prelude::*;

use crate::dispatch::{Invocation, InvocationArg};
use crate::editor_model::{EditorModel, EditorRecord, EditorValue};
use crate::schema::ValueKind;

/// Colours offered by the swatch palette.
pub const DEFAULT_PALETTE: &[&str] = &[
    "gold",
    "darkorange",
    "indianred",
    "rgb(102,51,0)",
    "cyan",
    "blue",
    "lime",
    "gray",
    "slategray",
    "rgb(204, 198, 170)",
    "white",
    "black",
    "red",
    "rgb(102,154,51)",
    "rgb(200, 0, 200)",
];

pub const DEFAULT_SWATCH_COLOR: &str = "cyan";

/// Width hint for text inputs, in pixels.
pub const DEFAULT_STRING_WIDTH_PX: u32 = 250;

/// What the control shows and how it is edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum ControlKind {
    NumberInput { value: f64 },
    TextInput { value: String, width_px: u32 },
    Toggle { checked: bool },
    ColorSwatch { palette: Vec<String>, default_color: String },
    Trigger,
}

/// Presentation attributes painted by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlStyle {
    /// Label column width, in `ex` units
    pub label_width_ex: usize,
    /// Swatch background; `None` paints the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// A user edit reported by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlEvent {
    /// Raw text of a numeric input
    Number { value: String },
    Text { value: String },
    Toggle { checked: bool },
    /// Colour picked from the palette
    Color { value: String },
    Press,
}

/// Encodes edits of one control into invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeHandler {
    pub verb: String,
    pub kind: ValueKind,
    pub quoted: bool,
}

impl ChangeHandler {
    /// Build the invocation for `event`.
    ///
    /// Returns `None` when the event does not fit the control or its payload
    /// cannot be converted (unparsable number, unknown colour).
    pub fn encode(&self, event: &ControlEvent) -> Option<Invocation> {
        let args = match (self.kind, event) {
            (ValueKind::Number, ControlEvent::Number { value }) => {
                let Ok(number) = value.trim().parse::<f64>() else {
                    debug!("Ignoring non-numeric input {:?} for {}", value, self.verb);
                    return None;
                };
                if !number.is_finite() {
                    debug!("Ignoring non-finite input for {}", self.verb);
                    return None;
                }
                vec![InvocationArg::Number(number)]
            }
            (ValueKind::String, ControlEvent::Text { value }) => {
                if self.quoted {
                    vec![InvocationArg::Str(value.clone())]
                } else {
                    vec![InvocationArg::Raw(value.clone())]
                }
            }
            (ValueKind::Bool, ControlEvent::Toggle { checked }) => {
                vec![InvocationArg::Bool(*checked)]
            }
            (ValueKind::Color, ControlEvent::Color { value }) => {
                let Some(rgb) = parse_color(value) else {
                    warn!("Cannot convert colour {:?}; {} not sent", value, self.verb);
                    return None;
                };
                rgb.components().into_iter().map(InvocationArg::Byte).collect()
            }
            (ValueKind::Action, ControlEvent::Press) => Vec::new(),
            (kind, event) => {
                warn!("Event {:?} does not apply to a {:?} control", event, kind);
                return None;
            }
        };
        Some(Invocation::new(self.verb.clone(), args))
    }
}

/// One editor row: label, control and its change handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub index: usize,
    pub label: String,
    pub kind: ControlKind,
    pub style: ControlStyle,
    pub handler: ChangeHandler,
}

impl Control {
    /// Reflect an edit in the control and encode it.
    ///
    /// The control keeps showing what the user picked until the backend
    /// confirms the change and the editor is rebuilt.
    pub fn on_event(&mut self, event: &ControlEvent) -> Option<Invocation> {
        let invocation = self.handler.encode(event)?;
        match (&mut self.kind, event) {
            (ControlKind::NumberInput { value }, ControlEvent::Number { value: text }) => {
                if let Ok(v) = text.trim().parse() {
                    *value = v;
                }
            }
            (ControlKind::TextInput { value, .. }, ControlEvent::Text { value: text }) => {
                value.clone_from(text);
            }
            (ControlKind::Toggle { checked }, ControlEvent::Toggle { checked: c }) => *checked = *c,
            (ControlKind::ColorSwatch { .. }, ControlEvent::Color { value }) => {
                self.style.background = Some(value.clone());
            }
            _ => {}
        }
        Some(invocation)
    }
}

/// Creates controls from editor records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFactory {
    pub palette: Vec<String>,
    pub default_color: String,
    pub string_width_px: u32,
}

impl Default for WidgetFactory {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            default_color: DEFAULT_SWATCH_COLOR.to_string(),
            string_width_px: DEFAULT_STRING_WIDTH_PX,
        }
    }
}

impl WidgetFactory {
    /// Control for one record; `None` for kinds without an editor.
    pub fn create_control(&self, record: &EditorRecord, index: usize, label_width: usize) -> Option<Control> {
        let entry = &record.entry;
        let mut style = ControlStyle {
            label_width_ex: label_width,
            background: None,
        };

        let kind = match (entry.value_kind, &record.value) {
            (ValueKind::Number, EditorValue::Number(v)) => ControlKind::NumberInput { value: *v },
            (ValueKind::String, EditorValue::String(s)) => ControlKind::TextInput {
                value: s.clone(),
                width_px: self.string_width_px,
            },
            (ValueKind::Bool, EditorValue::Bool(b)) => ControlKind::Toggle { checked: *b },
            (ValueKind::Color, EditorValue::Color(background)) => {
                style.background = background.clone();
                ControlKind::ColorSwatch {
                    palette: self.palette.clone(),
                    default_color: self.default_color.clone(),
                }
            }
            (ValueKind::Action, _) => ControlKind::Trigger,
            (ValueKind::Unsupported, _) => {
                debug!("No control for unsupported entry {}", entry.name);
                return None;
            }
            (kind, value) => {
                warn!("Value {:?} does not match {:?} entry {}", value, kind, entry.name);
                return None;
            }
        };

        Some(Control {
            index,
            label: record.label.clone(),
            kind,
            style,
            handler: ChangeHandler {
                verb: entry.invocation_verb.clone(),
                kind: entry.value_kind,
                quoted: entry.quoted,
            },
        })
    }

    /// Controls for every record that has one, in record order.
    pub fn create_controls(&self, model: &EditorModel) -> Vec<Control> {
        model
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| self.create_control(record, index, model.max_label_width))
            .collect()
    }
}
