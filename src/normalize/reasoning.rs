//! `reasoning_content` injection.
//!
//! With thinking enabled the upstream rejects assistant turns that carry a
//! tool invocation but no reasoning text. Every message that needs the field
//! leaves this stage with a non-empty string in it.

use serde_json::{Map, Value};

use crate::normalize::observer::{NormalizeEvent, NormalizeObserver};
use crate::normalize::sanitize::stringify;
use crate::normalize::shape::{classify, role};

pub const REASONING_CONTENT: &str = "reasoning_content";

/// Text some clients write when serializing a missing value.
pub const UNDEFINED_SENTINEL: &str = "[undefined]";

/// What was done to a message's `reasoning_content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Absent or null; the placeholder was inserted.
    Filled,
    /// Present but not a string; converted to text.
    Coerced,
    /// Empty or the undefined sentinel; replaced with the placeholder.
    Replaced,
}

/// Repair `reasoning_content` on every message that needs it.
///
/// A message needs the field when it carries a tool invocation, or when
/// `all_assistant` is set and its role is `assistant`. Returns the number of
/// messages changed.
pub fn inject_reasoning(
    messages: &mut [Value],
    all_assistant: bool,
    placeholder: &str,
    observer: &dyn NormalizeObserver,
) -> usize {
    let mut repaired = 0;

    for (index, message) in messages.iter_mut().enumerate() {
        let shape = classify(message);
        let needs_field =
            shape.carries_tool_invocation() || (all_assistant && role(message) == Some("assistant"));
        if !needs_field {
            continue;
        }

        let Some(fields) = message.as_object_mut() else {
            continue;
        };

        if let Some(repair) = repair_field(fields, placeholder) {
            repaired += 1;
            observer.observe(&NormalizeEvent::ReasoningRepaired {
                index,
                shape,
                repair,
            });
        }
    }

    repaired
}

/// Apply the repair precedence to one message. `None` means the existing
/// value was already acceptable.
fn repair_field(fields: &mut Map<String, Value>, placeholder: &str) -> Option<Repair> {
    let (text, repair) = match fields.get(REASONING_CONTENT) {
        None | Some(Value::Null) => (placeholder.to_string(), Repair::Filled),
        Some(Value::String(s)) if s.is_empty() || s == UNDEFINED_SENTINEL => {
            (placeholder.to_string(), Repair::Replaced)
        }
        Some(Value::String(_)) => return None,
        Some(other) => {
            let (text, _) = stringify(other);
            if text.is_empty() {
                (placeholder.to_string(), Repair::Coerced)
            } else {
                (text, Repair::Coerced)
            }
        }
    };

    fields.insert(REASONING_CONTENT.to_string(), Value::String(text));
    Some(repair)
}
