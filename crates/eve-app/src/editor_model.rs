//! Editor model: the flat list of records the GED shows for one element.

use serde::Serialize;
use serde_json::Value;

use eve_core::{ColorIndex, Element, ElementId};

use crate::schema::{SchemaEntry, ValueKind};

/// Current value of one editable property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum EditorValue {
    Bool(bool),
    Number(f64),
    String(String),
    /// CSS colour of the stored colour index; `None` for an unknown index
    Color(Option<String>),
    Action,
    /// Raw member value for a kind this build cannot edit
    Unsupported(Value),
}

impl EditorValue {
    /// Convert a raw member value according to `kind`.
    ///
    /// Missing members take the kind's empty value.
    pub fn from_member(kind: ValueKind, raw: Option<Value>, colors: &ColorIndex) -> Self {
        match kind {
            ValueKind::Bool => EditorValue::Bool(match raw {
                Some(Value::Bool(b)) => b,
                Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
                _ => false,
            }),
            ValueKind::Number => EditorValue::Number(match raw {
                Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
                Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
                Some(Value::Bool(b)) => f64::from(u8::from(b)),
                _ => 0.0,
            }),
            ValueKind::String => EditorValue::String(match raw {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }),
            ValueKind::Color => EditorValue::Color(match raw {
                Some(Value::Number(n)) => n
                    .as_u64()
                    .and_then(|index| u32::try_from(index).ok())
                    .and_then(|index| colors.lookup(index))
                    .map(str::to_string),
                // already a CSS colour
                Some(Value::String(s)) => Some(s),
                _ => None,
            }),
            ValueKind::Action => EditorValue::Action,
            ValueKind::Unsupported => EditorValue::Unsupported(raw.unwrap_or(Value::Null)),
        }
    }
}

/// One row of the editor: label, value, and the entry that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorRecord {
    pub label: String,
    pub value: EditorValue,
    pub entry: SchemaEntry,
}

/// Records for one element plus display metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorModel {
    pub element_id: ElementId,
    /// Fully qualified type name, as required by the invocation target
    pub element_type: String,
    /// `"<name> (<short type>)"`
    pub title: String,
    pub records: Vec<EditorRecord>,
    /// Longest label, in characters
    pub max_label_width: usize,
}

impl EditorModel {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builds [`EditorModel`]s, mapping colour indices through a [`ColorIndex`].
#[derive(Debug, Clone, Copy)]
pub struct EditorModelBuilder<'a> {
    colors: &'a ColorIndex,
}

impl<'a> EditorModelBuilder<'a> {
    pub fn new(colors: &'a ColorIndex) -> Self {
        Self { colors }
    }

    /// Build the record list for `element` from its resolved schema.
    ///
    /// Records follow schema order; the output depends only on the element
    /// snapshot and the schema.
    pub fn build(&self, element: &Element, schema: &[SchemaEntry]) -> EditorModel {
        let records: Vec<EditorRecord> = schema
            .iter()
            .map(|entry| {
                let raw = element.field(&entry.backing_field);
                if raw.is_none() && entry.value_kind != ValueKind::Action {
                    tracing::trace!(
                        "Element {} has no member {}",
                        element.id,
                        entry.backing_field
                    );
                }
                EditorRecord {
                    label: entry.name.clone(),
                    value: EditorValue::from_member(entry.value_kind, raw, self.colors),
                    entry: entry.clone(),
                }
            })
            .collect();

        let max_label_width = schema
            .iter()
            .map(|entry| entry.name.chars().count())
            .max()
            .unwrap_or(0);

        EditorModel {
            element_id: element.id,
            element_type: element.type_name.clone(),
            title: format!("{} ({})", element.name, element.short_type_name()),
            records,
            max_label_width,
        }
    }
}
