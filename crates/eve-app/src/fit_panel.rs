//! Fit panel model.
//!
//! The fitting backend owns the model: it pushes the full JSON object in a
//! `MODEL:` frame, and the panel edits a local copy and sends it back with
//! the request prefixes (`DOFIT:`, `SETCONTOUR:`, ...). Every method here is
//! synchronous and returns the frame to send, if any.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use eve_core::prelude::*;
use eve_core::{parse_color, PanelMessage};

pub const DOFIT_PREFIX: &str = "DOFIT:";
pub const GETPARS_PREFIX: &str = "GETPARS:";
pub const SETPARS_PREFIX: &str = "SETPARS:";
pub const SETCONTOUR_PREFIX: &str = "SETCONTOUR:";
pub const SETSCAN_PREFIX: &str = "SETSCAN:";

/// Function shown as selected after a reset.
pub const DEFAULT_FUNCTION: &str = "gaus";

/// Members derived locally from the `...All` tables; never sent back.
const DERIVED_FIELDS: &[&str] = &["fFuncList", "fMethodMin"];

/// Minimiser settings entered before a fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitInputs {
    pub min_library: String,
    #[serde(default)]
    pub error_def: Option<f64>,
    #[serde(default)]
    pub max_tolerance: Option<f64>,
    #[serde(default)]
    pub max_iterations: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourRequest {
    pub points: u32,
    pub par1: i64,
    pub par2: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub points: u32,
    pub par: i64,
    pub min: f64,
    pub max: f64,
}

/// Local state of the fit panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FitPanel {
    model: Map<String, Value>,
    /// Snapshots taken on model load and on every fit
    history: Vec<Map<String, Value>>,
    cursor: usize,
    /// Function name shown above the formula editor
    pub selected_op_text: String,
    /// Content of the formula editor
    pub operation_text: String,
    pub inputs: FitInputs,
    pub contour_color: Option<String>,
}

impl Default for FitPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl FitPanel {
    /// Panel with the placeholder model shown before the backend connects.
    pub fn new() -> Self {
        let model = match json!({
            "fSelectDataId": "2",
            "fStep": 0.01,
            "fRange": [-4, 4],
            "fUpdateRange": [-4, 4],
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            model,
            history: Vec::new(),
            cursor: 0,
            selected_op_text: DEFAULT_FUNCTION.to_string(),
            operation_text: String::new(),
            inputs: FitInputs::default(),
            contour_color: None,
        }
    }

    pub fn model(&self) -> &Map<String, Value> {
        &self.model
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.model.get(field)
    }

    /// Number of stored snapshots.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_cursor(&self) -> usize {
        self.cursor
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound frames
    // ─────────────────────────────────────────────────────────────────────

    /// Handle a backend frame. Returns `false` if the frame was ignored.
    pub fn on_message(&mut self, text: &str) -> bool {
        let Some(message) = PanelMessage::parse(text) else {
            return false;
        };
        debug!("Fit panel received {} frame", message.kind());

        match message {
            PanelMessage::Model(Value::Object(mut model)) => {
                derive_lists(&mut model);
                self.history = vec![model.clone()];
                self.cursor = 0;
                self.model = model;
            }
            PanelMessage::Pars(pars) => {
                self.model.insert("fFuncPars".to_string(), pars);
            }
            PanelMessage::Advanced(Value::Object(model)) => {
                self.model = model;
            }
            PanelMessage::Model(other) | PanelMessage::Advanced(other) => {
                warn!("Fit model is not an object: {}", other);
                return false;
            }
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────

    /// Store the minimiser settings, snapshot the model and request a fit.
    pub fn do_fit(&mut self, inputs: FitInputs) -> String {
        self.set("fMinLibrary", inputs.min_library.clone());
        self.set("fErrorDef", inputs.error_def);
        self.set("fMaxTol", inputs.max_tolerance);
        self.set("fMaxInter", inputs.max_iterations);
        self.inputs = inputs;

        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push(self.model.clone());
        self.cursor = self.history.len() - 1;

        self.frame(DOFIT_PREFIX)
    }

    /// Restore the model as first received. Returns `false` before any model.
    pub fn reset(&mut self) -> bool {
        let Some(first) = self.history.first() else {
            return false;
        };
        self.model = first.clone();
        self.cursor = 0;
        self.selected_op_text = DEFAULT_FUNCTION.to_string();
        self.operation_text.clear();
        self.inputs = FitInputs::default();
        true
    }

    /// Step back one snapshot. Returns `false` at the oldest snapshot.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        match self.history.get(self.cursor) {
            Some(snapshot) => {
                self.model = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Select a predefined function and request its parameters.
    pub fn select_function(&mut self, name: &str) -> Option<String> {
        self.set("fSelectedFunc", name);
        self.set("fFuncChange", name);
        self.operation_text = name.to_string();
        self.selected_op_text = name.to_string();

        if name.is_empty() {
            None
        } else {
            Some(format!("{GETPARS_PREFIX}{name}"))
        }
    }

    pub fn operation_text_changed(&mut self, text: &str) {
        self.operation_text = text.to_string();
        self.selected_op_text = text.to_string();
    }

    /// Pick the minimiser library and refresh its method list.
    pub fn select_library(&mut self, library: &str) {
        self.set("fLibrary", library);
        derive_lists(&mut self.model);
    }

    /// Pick the function family and refresh its function list.
    pub fn select_type_func(&mut self, type_func: &str) {
        self.set("fSelectTypeFunc", type_func);
        derive_lists(&mut self.model);
    }

    pub fn set_no_store(&mut self, no_store: bool) {
        self.set("fNoStore", no_store);
    }

    pub fn update_range(&mut self, low: f64, high: f64) {
        self.set("fUpdateRange", json!([low, high]));
    }

    pub fn set_contour_color(&mut self, color: impl Into<String>) {
        self.contour_color = Some(color.into());
    }

    /// Request a contour plot in the chosen colour.
    pub fn draw_contour(&mut self, request: ContourRequest) -> String {
        self.set("fContourPoints", request.points);
        self.set("fContourPar1", request.par1);
        self.set("fContourPar2", request.par2);

        match self.contour_color.as_deref().and_then(parse_color) {
            Some(rgb) => {
                let components: Vec<String> = rgb.components().iter().map(u8::to_string).collect();
                self.set("fColorContour", components);
            }
            None => {
                if let Some(color) = &self.contour_color {
                    warn!("Cannot convert contour colour {:?}", color);
                }
                self.model.remove("fColorContour");
            }
        }

        self.frame(SETCONTOUR_PREFIX)
    }

    pub fn draw_scan(&mut self, request: ScanRequest) -> String {
        self.set("fScanPoints", request.points);
        self.set("fScanPar", request.par);
        self.set("fScanMin", request.min);
        self.set("fScanMax", request.max);
        self.frame(SETSCAN_PREFIX)
    }

    /// Send the edited function parameters.
    pub fn apply_pars(&self) -> String {
        let pars = self.model.get("fFuncPars").cloned().unwrap_or(Value::Null);
        format!("{SETPARS_PREFIX}{pars}")
    }

    fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.model.insert(field.to_string(), value.into());
    }

    /// `prefix` + model JSON without the derived lists.
    fn frame(&self, prefix: &str) -> String {
        let mut outgoing = self.model.clone();
        for field in DERIVED_FIELDS {
            outgoing.remove(*field);
        }
        format!("{prefix}{}", Value::Object(outgoing))
    }
}

/// Recompute `fFuncList` and `fMethodMin` from their lookup tables.
fn derive_lists(model: &mut Map<String, Value>) {
    let derived = [
        ("fFuncList", "fFuncListAll", "fSelectTypeFunc"),
        ("fMethodMin", "fMethodMinAll", "fLibrary"),
    ];
    for (target, table, selector) in derived {
        let value = model
            .get(selector)
            .and_then(as_index)
            .and_then(|i| model.get(table)?.get(i).cloned());
        match value {
            Some(value) => {
                model.insert(target.to_string(), value);
            }
            None => {
                debug!("Cannot derive {} from {}[{}]", target, table, selector);
                model.remove(target);
            }
        }
    }
}

/// Selector values arrive either as numbers or as numeric strings.
fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"MODEL:{
        "fSelectTypeFunc": "1",
        "fLibrary": 0,
        "fFuncListAll": [[{"name": "x"}], [{"name": "gaus"}, {"name": "expo"}]],
        "fMethodMinAll": [["Migrad", "Simplex"], ["Fumili"]],
        "fFuncPars": null
    }"#;

    fn loaded() -> FitPanel {
        let mut panel = FitPanel::new();
        assert!(panel.on_message(MODEL));
        panel
    }

    fn payload(frame: &str, prefix: &str) -> Map<String, Value> {
        let json = frame.strip_prefix(prefix).unwrap();
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_initial_model() {
        let panel = FitPanel::new();
        assert_eq!(panel.get("fSelectDataId"), Some(&json!("2")));
        assert_eq!(panel.get("fStep"), Some(&json!(0.01)));
        assert_eq!(panel.get("fRange"), Some(&json!([-4, 4])));
        assert_eq!(panel.history_len(), 0);
        assert!(!FitPanel::new().reset());
    }

    #[test]
    fn test_model_frame_derives_lists() {
        let panel = loaded();
        assert_eq!(panel.get("fFuncList"), Some(&json!([{"name": "gaus"}, {"name": "expo"}])));
        assert_eq!(panel.get("fMethodMin"), Some(&json!(["Migrad", "Simplex"])));
        assert_eq!(panel.history_len(), 1);
    }

    #[test]
    fn test_pars_and_advanced_frames() {
        let mut panel = loaded();
        assert!(panel.on_message("PARS:[{\"name\":\"p0\",\"value\":1.5}]"));
        assert_eq!(panel.get("fFuncPars"), Some(&json!([{"name": "p0", "value": 1.5}])));

        assert!(panel.on_message("ADVANCED:{\"fLibrary\":1}"));
        assert_eq!(panel.get("fLibrary"), Some(&json!(1)));
        assert_eq!(panel.history_len(), 1);

        assert!(!panel.on_message("ADVANCED:[1]"));
        assert!(!panel.on_message("NOISE:{}"));
        assert!(!panel.on_message("MODEL:{broken"));
    }

    #[test]
    fn test_do_fit_strips_derived_fields() {
        let mut panel = loaded();
        let frame = panel.do_fit(FitInputs {
            min_library: "Minuit2".into(),
            error_def: Some(1.0),
            max_tolerance: Some(0.01),
            max_iterations: Some(100),
        });

        let sent = payload(&frame, DOFIT_PREFIX);
        assert_eq!(sent.get("fMinLibrary"), Some(&json!("Minuit2")));
        assert_eq!(sent.get("fMaxInter"), Some(&json!(100)));
        assert!(!sent.contains_key("fFuncList"));
        assert!(!sent.contains_key("fMethodMin"));
        // the local model keeps them
        assert!(panel.get("fFuncList").is_some());
        assert_eq!(panel.history_len(), 2);
    }

    #[test]
    fn test_back_and_reset() {
        let mut panel = loaded();
        panel.do_fit(FitInputs {
            min_library: "Minuit".into(),
            ..FitInputs::default()
        });
        panel.do_fit(FitInputs {
            min_library: "Fumili".into(),
            ..FitInputs::default()
        });
        assert_eq!(panel.history_cursor(), 2);

        assert!(panel.back());
        assert_eq!(panel.get("fMinLibrary"), Some(&json!("Minuit")));

        panel.select_function("expo");
        assert!(panel.reset());
        assert_eq!(panel.get("fMinLibrary"), None);
        assert_eq!(panel.selected_op_text, DEFAULT_FUNCTION);
        assert!(panel.operation_text.is_empty());
        assert!(!panel.back());
    }

    #[test]
    fn test_fit_after_back_drops_newer_snapshots() {
        let mut panel = loaded();
        panel.do_fit(FitInputs::default());
        panel.do_fit(FitInputs::default());
        panel.back();
        panel.do_fit(FitInputs::default());
        assert_eq!(panel.history_len(), 3);
        assert_eq!(panel.history_cursor(), 2);
    }

    #[test]
    fn test_select_function() {
        let mut panel = loaded();
        assert_eq!(panel.select_function("gaus"), Some("GETPARS:gaus".to_string()));
        assert_eq!(panel.get("fFuncChange"), Some(&json!("gaus")));
        assert_eq!(panel.operation_text, "gaus");
        assert_eq!(panel.select_function(""), None);

        panel.operation_text_changed("[0]*x");
        assert_eq!(panel.selected_op_text, "[0]*x");
    }

    #[test]
    fn test_selectors_recompute_lists() {
        let mut panel = loaded();
        panel.select_library("1");
        assert_eq!(panel.get("fMethodMin"), Some(&json!(["Fumili"])));
        panel.select_type_func("0");
        assert_eq!(panel.get("fFuncList"), Some(&json!([{"name": "x"}])));
        panel.select_type_func("7");
        assert_eq!(panel.get("fFuncList"), None);
    }

    #[test]
    fn test_contour_color_components() {
        let mut panel = loaded();
        let request = ContourRequest {
            points: 40,
            par1: 0,
            par2: 1,
        };

        let sent = payload(&panel.draw_contour(request), SETCONTOUR_PREFIX);
        assert!(!sent.contains_key("fColorContour"));

        panel.set_contour_color("rgb(12, 34, 56)");
        let sent = payload(&panel.draw_contour(request), SETCONTOUR_PREFIX);
        assert_eq!(sent.get("fColorContour"), Some(&json!(["12", "34", "56"])));
        assert_eq!(sent.get("fContourPoints"), Some(&json!(40)));
    }

    #[test]
    fn test_scan_pars_and_range() {
        let mut panel = loaded();
        let sent = payload(
            &panel.draw_scan(ScanRequest {
                points: 20,
                par: 1,
                min: -2.0,
                max: 2.0,
            }),
            SETSCAN_PREFIX,
        );
        assert_eq!(sent.get("fScanMax"), Some(&json!(2.0)));

        assert_eq!(panel.apply_pars(), "SETPARS:null");
        panel.on_message("PARS:[1,2]");
        assert_eq!(panel.apply_pars(), "SETPARS:[1,2]");

        panel.update_range(-1.0, 3.5);
        assert_eq!(panel.get("fUpdateRange"), Some(&json!([-1.0, 3.5])));

        panel.set_no_store(true);
        assert_eq!(panel.get("fNoStore"), Some(&json!(true)));
    }
}
