//! Inbound notifications from the backend.
//!
//! Two channels feed the inspector:
//! - scene notifications from the element manager ([`SceneNotification`]),
//!   delivered between `BeginChanges` / `EndChanges` brackets;
//! - prefixed text frames for the fit panel ([`PanelMessage`]), e.g.
//!   `MODEL:{...}`, `PARS:[...]`, `ADVANCED:{...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::element::{Element, ElementChange, ElementId};

/// Notification pushed by the element manager to registered scene receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneNotification {
    /// Full element tree is available (first connection or reload)
    ManagerInit { roots: Vec<Element> },

    /// A batch of changes starts
    BeginChanges,

    /// One element changed
    ElementChanged(ElementChange),

    /// Elements were removed from their scene
    ElementsRemoved { ids: Vec<ElementId> },

    /// The batch is complete; receivers flush their projections
    EndChanges,
}

/// Prefix of a full fit-panel model frame.
pub const MODEL_PREFIX: &str = "MODEL:";
/// Prefix of a function-parameters frame.
pub const PARS_PREFIX: &str = "PARS:";
/// Prefix of an advanced-results frame.
pub const ADVANCED_PREFIX: &str = "ADVANCED:";

/// A parsed fit-panel frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelMessage {
    Model(Value),
    Pars(Value),
    Advanced(Value),
}

impl PanelMessage {
    /// Parse a prefixed frame.
    ///
    /// Returns `None` for an unknown prefix or a payload that is not valid
    /// JSON; such frames are dropped by the caller.
    pub fn parse(text: &str) -> Option<Self> {
        let (ctor, payload): (fn(Value) -> Self, &str) =
            if let Some(rest) = text.strip_prefix(MODEL_PREFIX) {
                (PanelMessage::Model, rest)
            } else if let Some(rest) = text.strip_prefix(PARS_PREFIX) {
                (PanelMessage::Pars, rest)
            } else if let Some(rest) = text.strip_prefix(ADVANCED_PREFIX) {
                (PanelMessage::Advanced, rest)
            } else {
                tracing::debug!("Ignoring panel frame with unknown prefix: {:.40}", text);
                return None;
            };

        match serde_json::from_str(payload) {
            Ok(value) => Some(ctor(value)),
            Err(e) => {
                tracing::warn!("Malformed panel payload: {}", e);
                None
            }
        }
    }

    /// The frame kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            PanelMessage::Model(_) => "model",
            PanelMessage::Pars(_) => "pars",
            PanelMessage::Advanced(_) => "advanced",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_model_frame() {
        let msg = PanelMessage::parse(r#"MODEL:{"fLibrary":"0"}"#);
        assert_eq!(msg, Some(PanelMessage::Model(json!({"fLibrary": "0"}))));
    }

    #[test]
    fn test_parse_pars_and_advanced_frames() {
        assert!(matches!(PanelMessage::parse("PARS:[1,2]"), Some(PanelMessage::Pars(_))));
        assert!(matches!(
            PanelMessage::parse("ADVANCED:{}"),
            Some(PanelMessage::Advanced(_))
        ));
    }

    #[test]
    fn test_unknown_prefix_is_ignored() {
        assert_eq!(PanelMessage::parse("HELLO:{}"), None);
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        assert_eq!(PanelMessage::parse("MODEL:{not json"), None);
    }

    #[test]
    fn test_scene_notification_tagged_json() {
        let n: SceneNotification =
            serde_json::from_value(json!({"kind": "elements_removed", "ids": [3, 4]})).unwrap();
        assert_eq!(
            n,
            SceneNotification::ElementsRemoved {
                ids: vec![ElementId(3), ElementId(4)]
            }
        );

        let n: SceneNotification = serde_json::from_value(json!({
            "kind": "element_changed",
            "fElementId": 4,
            "fName": "Track",
            "rnr_self_changed": true
        }))
        .unwrap();
        assert!(matches!(n, SceneNotification::ElementChanged(c) if c.rnr_self_changed));
    }
}
