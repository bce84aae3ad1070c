//! Sampling parameter override for models that require fixed values.

use serde_json::{json, Map, Value};

/// Values the upstream insists on when thinking is enabled.
const PINNED: [(&str, f64); 4] = [
    ("temperature", 1.0),
    ("top_p", 0.95),
    ("presence_penalty", 0.0),
    ("frequency_penalty", 0.0),
];

/// Decides which models get their parameters pinned.
///
/// A model matches when its name contains any trigger, ignoring case.
#[derive(Debug, Clone)]
pub struct ModelTrigger {
    needles: Vec<String>,
}

impl ModelTrigger {
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            needles: needles
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        self.needles.iter().any(|n| model.contains(n.as_str()))
    }

    /// The payload's model name, if it is a string that matches.
    pub fn matching_model<'a>(&self, payload: &'a Value) -> Option<&'a str> {
        payload
            .get("model")
            .and_then(Value::as_str)
            .filter(|model| self.matches(model))
    }
}

impl Default for ModelTrigger {
    fn default() -> Self {
        Self::new(["kimi", "moonshot"])
    }
}

/// Overwrite the sampling parameters and drop `thinking`.
///
/// Returns whether a `thinking` field was removed.
pub fn pin_params(payload: &mut Map<String, Value>) -> bool {
    let removed_thinking = payload.remove("thinking").is_some();

    for (key, value) in PINNED {
        payload.insert(key.to_string(), json!(value));
    }
    payload.insert("n".to_string(), json!(1));

    removed_thinking
}
