//! Tree-wide cleanup of reasoning fields.
//!
//! Runs over the whole payload, not just `messages`: the fields turn up inside
//! tool arguments and content blocks too, depending on the client.

use serde_json::Value;

use crate::normalize::observer::{NormalizeEvent, NormalizeObserver};
use crate::normalize::reasoning::REASONING_CONTENT;

const REASONING: &str = "reasoning";

/// Drop string `reasoning` keys and stringify non-string `reasoning_content`
/// at every depth. Returns the number of fields touched.
pub fn sanitize_fields(node: &mut Value, observer: &dyn NormalizeObserver) -> usize {
    match node {
        Value::Object(fields) => {
            let mut touched = 0;

            if matches!(fields.get(REASONING), Some(Value::String(_))) {
                fields.remove(REASONING);
                observer.observe(&NormalizeEvent::ReasoningDropped);
                touched += 1;
            }

            if let Some(value) = fields.get_mut(REASONING_CONTENT) {
                if !value.is_string() {
                    let (text, fallback) = stringify(value);
                    *value = Value::String(text);
                    observer.observe(&NormalizeEvent::ReasoningContentStringified { fallback });
                    touched += 1;
                }
            }

            for child in fields.values_mut() {
                touched += sanitize_fields(child, observer);
            }
            touched
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| sanitize_fields(item, observer))
            .sum(),
        _ => 0,
    }
}

/// Render a value as text: JSON first, then a plain coercion if encoding
/// fails. The flag reports whether the fallback was used.
pub fn stringify(value: &Value) -> (String, bool) {
    if let Value::String(s) = value {
        return (s.clone(), false);
    }
    match serde_json::to_string(value) {
        Ok(text) => (text, false),
        Err(_) => (coerce(value), true),
    }
}

fn coerce(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(coerce).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object]".to_string(),
    }
}
