//! Class schema registry for the generic editor (GED).
//!
//! Each editable element type declares an ordered list of [`SchemaEntry`]
//! values: which backing member to read, which remote method to invoke on
//! edit, and what kind of control to show. A type may inherit the entries of
//! other types; [`SchemaRegistry::resolve`] flattens that chain with parent
//! entries first.
//!
//! The registry is built once at startup (built-in table plus any `[[schema]]`
//! sections from the settings file) and then shared read-only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use eve_core::prelude::*;
use eve_core::short_type_name;

/// Kind of value an entry edits; selects the control type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Number,
    String,
    Color,
    Action,
    /// A kind this build does not know how to edit; no control is created
    #[serde(other)]
    Unsupported,
}

/// One editable property of an element type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaEntry {
    /// Label shown next to the control
    pub name: String,
    /// Member read from the element snapshot (`f<name>` by default)
    pub backing_field: String,
    /// Remote method invoked on edit (`Set<name>` by default)
    pub invocation_verb: String,
    pub value_kind: ValueKind,
    /// Wrap string payloads in double quotes
    pub quoted: bool,
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        let name = name.into();
        Self {
            backing_field: format!("f{name}"),
            invocation_verb: format!("Set{name}"),
            name,
            value_kind,
            quoted: false,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Bool)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Number)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::String)
    }

    /// An action trigger calling `verb` with no arguments.
    pub fn action(name: impl Into<String>, verb: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Action)
            .member("fElementId")
            .verb(verb)
    }

    /// Colour member `f<stem>` edited through `Set<stem>RGB`.
    pub fn color(stem: &str) -> Self {
        Self::new(stem, ValueKind::Color).verb(format!("Set{stem}RGB"))
    }

    /// Colour entry backed by the element's main colour.
    ///
    /// With `use_main_setter` the edit goes through `SetMainColorRGB`,
    /// otherwise through `Set<label>RGB`.
    pub fn main_color(label: &str, use_main_setter: bool) -> Self {
        let setter = if use_main_setter { "MainColor" } else { label };
        Self::new(label, ValueKind::Color)
            .member("fMainColor")
            .verb(format!("Set{setter}RGB"))
    }

    pub fn member(mut self, backing_field: impl Into<String>) -> Self {
        self.backing_field = backing_field.into();
        self
    }

    pub fn verb(mut self, invocation_verb: impl Into<String>) -> Self {
        self.invocation_verb = invocation_verb.into();
        self
    }

    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }
}

/// The schema of one element type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSchema {
    /// Types whose entries come first, in order
    pub inherits_from: Vec<String>,
    pub entries: Vec<SchemaEntry>,
}

impl ClassSchema {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self {
            inherits_from: Vec::new(),
            entries,
        }
    }

    pub fn inheriting(parents: &[&str], entries: Vec<SchemaEntry>) -> Self {
        Self {
            inherits_from: parents.iter().map(|p| p.to_string()).collect(),
            entries,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings-file definitions
// ─────────────────────────────────────────────────────────────────────────────

/// A `[[schema]]` section of the settings file.
///
/// ```toml
/// [[schema]]
/// class = "REveStraightLineSet"
/// sub = ["REveElement"]
/// entries = [
///     { name = "LineWidth", type = "Number" },
///     { name = "Label", type = "String", quote = true },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchemaDef {
    pub class: String,
    #[serde(default)]
    pub sub: Vec<String>,
    #[serde(default)]
    pub entries: Vec<SchemaEntryDef>,
}

/// One entry of a `[[schema]]` section; omitted `member`/`srv` take the
/// `f<name>` / `Set<name>` defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntryDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv: Option<String>,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub quote: bool,
}

impl From<&SchemaEntryDef> for SchemaEntry {
    fn from(def: &SchemaEntryDef) -> Self {
        let mut entry = SchemaEntry::new(def.name.clone(), def.kind);
        if let Some(member) = &def.member {
            entry.backing_field = member.clone();
        }
        if let Some(srv) = &def.srv {
            entry.invocation_verb = srv.clone();
        }
        entry.quoted = def.quote;
        entry
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable map from type name to [`ClassSchema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    classes: HashMap<String, ClassSchema>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Registry with the built-in EVE element schemas.
    pub fn eve_defaults() -> Self {
        SchemaRegistryBuilder::with_eve_defaults().build()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Whether the type has a schema. Accepts namespaced or short names.
    pub fn is_editable(&self, type_name: &str) -> bool {
        self.classes.contains_key(short_type_name(type_name))
    }

    /// Flatten the schema of `type_name`.
    ///
    /// Inherited entries come first, depth-first in declaration order, then
    /// the type's own entries. An unknown type yields an empty list.
    pub fn resolve(&self, type_name: &str) -> Vec<SchemaEntry> {
        let mut entries = Vec::new();
        let mut stack = Vec::new();
        self.resolve_into(short_type_name(type_name), &mut stack, &mut entries);
        entries
    }

    fn resolve_into<'a>(
        &'a self,
        type_name: &'a str,
        stack: &mut Vec<&'a str>,
        out: &mut Vec<SchemaEntry>,
    ) {
        let Some(class) = self.classes.get(type_name) else {
            if !stack.is_empty() {
                warn!("Schema parent {} is not registered", type_name);
            }
            return;
        };

        if stack.contains(&type_name) {
            warn!(
                "Cyclic schema inheritance through {} ({})",
                type_name,
                stack.join(" -> ")
            );
            return;
        }

        stack.push(type_name);
        for parent in &class.inherits_from {
            self.resolve_into(parent, stack, out);
        }
        out.extend(class.entries.iter().cloned());
        stack.pop();
    }
}

/// Collects class schemas before freezing them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    classes: HashMap<String, ClassSchema>,
}

impl SchemaRegistryBuilder {
    /// Start from the built-in EVE element schemas.
    pub fn with_eve_defaults() -> Self {
        let element_sub = || ClassSchema::inheriting(&["REveElement"], Vec::new());

        Self::default()
            .class(
                "REveElement",
                ClassSchema::new(vec![
                    SchemaEntry::bool("RnrSelf"),
                    SchemaEntry::bool("RnrChildren"),
                    SchemaEntry::main_color("Color", true),
                    SchemaEntry::action("Destroy", "Destroy"),
                ]),
            )
            .class("REveElementList", element_sub())
            .class(
                "REveSelection",
                ClassSchema::new(vec![
                    SchemaEntry::color("VisibleEdgeColor"),
                    SchemaEntry::color("HiddenEdgeColor"),
                ]),
            )
            .class("REveGeoShape", element_sub())
            .class("REveCompound", element_sub())
            .class(
                "REvePointSet",
                ClassSchema::inheriting(&["REveElement"], vec![SchemaEntry::number("MarkerSize")]),
            )
            .class(
                "REveJetCone",
                ClassSchema::new(vec![
                    SchemaEntry::bool("RnrSelf"),
                    SchemaEntry::main_color("ConeColor", true),
                    SchemaEntry::number("NDiv"),
                ]),
            )
            .class(
                "REveDataCollection",
                ClassSchema::new(vec![
                    SchemaEntry::string("FilterExpr").quoted(),
                    SchemaEntry::bool("CollectionVisible").member("fRnrSelf"),
                    SchemaEntry::main_color("CollectionColor", false),
                ]),
            )
            .class(
                "REveDataItem",
                ClassSchema::new(vec![
                    SchemaEntry::main_color("ItemColor", false),
                    SchemaEntry::bool("ItemRnrSelf").member("fRnrSelf"),
                    SchemaEntry::bool("Filtered"),
                ]),
            )
            .class(
                "REveTrack",
                ClassSchema::new(vec![
                    SchemaEntry::bool("RnrSelf"),
                    SchemaEntry::main_color("LineColor", true),
                    SchemaEntry::number("LineWidth"),
                    SchemaEntry::action("Destroy", "Destroy"),
                ]),
            )
    }

    /// Register (or replace) a type's schema.
    pub fn class(mut self, type_name: impl Into<String>, schema: ClassSchema) -> Self {
        let type_name = type_name.into();
        if self.classes.insert(type_name.clone(), schema).is_some() {
            debug!("Schema for {} replaced", type_name);
        }
        self
    }

    /// Register schemas from settings-file definitions.
    pub fn define(mut self, defs: &[ClassSchemaDef]) -> Result<Self> {
        for def in defs {
            if def.class.trim().is_empty() {
                return Err(Error::schema("<unnamed>", "class name is empty"));
            }
            if let Some(entry) = def.entries.iter().find(|e| e.name.trim().is_empty()) {
                return Err(Error::schema(
                    &def.class,
                    format!("entry with empty name (type {:?})", entry.kind),
                ));
            }
            let schema = ClassSchema {
                inherits_from: def.sub.clone(),
                entries: def.entries.iter().map(SchemaEntry::from).collect(),
            };
            self = self.class(short_type_name(&def.class).to_string(), schema);
        }
        Ok(self)
    }

    pub fn build(self) -> SchemaRegistry {
        info!("Schema registry built with {} classes", self.classes.len());
        SchemaRegistry {
            classes: self.classes,
        }
    }
}
