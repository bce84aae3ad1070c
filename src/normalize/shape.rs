//! Message-shape classification.
//!
//! Clients encode a tool invocation in one of three ways: the current
//! `tool_calls` array, the legacy `function_call` record, or a typed block
//! inside a `content` array. Classification is a pure read of the message.

use serde_json::Value;

/// Block `type` values that count as a tool invocation.
const TOOL_BLOCK_TYPES: [&str; 3] = ["tool_use", "tool_call", "function_call"];

/// How a message carries a tool invocation, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageShape {
    /// Non-empty `tool_calls` array.
    ToolCalls,
    /// Legacy `function_call` record.
    FunctionCall,
    /// Tool invocation expressed as a content block.
    ToolBlocks,
    /// No tool invocation.
    Plain,
}

impl MessageShape {
    pub fn carries_tool_invocation(self) -> bool {
        !matches!(self, MessageShape::Plain)
    }
}

/// Classify a message. Non-object values are [`MessageShape::Plain`].
///
/// When a message mixes styles the first match in the order above wins; the
/// caller only cares whether any style is present.
pub fn classify(message: &Value) -> MessageShape {
    let Value::Object(fields) = message else {
        return MessageShape::Plain;
    };

    if let Some(Value::Array(calls)) = fields.get("tool_calls") {
        if !calls.is_empty() {
            return MessageShape::ToolCalls;
        }
    }

    match fields.get("function_call") {
        None | Some(Value::Null) => {}
        Some(_) => return MessageShape::FunctionCall,
    }

    if let Some(Value::Array(blocks)) = fields.get("content") {
        if blocks.iter().any(is_tool_block) {
            return MessageShape::ToolBlocks;
        }
    }

    MessageShape::Plain
}

fn is_tool_block(block: &Value) -> bool {
    block
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| TOOL_BLOCK_TYPES.contains(&kind))
}

/// The message's `role`, when it is a string.
pub fn role(message: &Value) -> Option<&str> {
    message.get("role").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_calls_array() {
        let msg = json!({"role": "assistant", "tool_calls": [{"id": "a"}]});
        assert_eq!(classify(&msg), MessageShape::ToolCalls);
    }

    #[test]
    fn empty_tool_calls_is_plain() {
        let msg = json!({"role": "assistant", "tool_calls": [], "content": "hi"});
        assert_eq!(classify(&msg), MessageShape::Plain);
    }

    #[test]
    fn legacy_function_call() {
        let msg = json!({"role": "assistant", "function_call": {"name": "f", "arguments": "{}"}});
        assert_eq!(classify(&msg), MessageShape::FunctionCall);

        let null_call = json!({"role": "assistant", "function_call": null});
        assert_eq!(classify(&null_call), MessageShape::Plain);
    }

    #[test]
    fn block_styles() {
        for kind in ["tool_use", "tool_call", "function_call"] {
            let msg = json!({
                "role": "assistant",
                "content": [{"type": "text", "text": "x"}, {"type": kind, "id": "t1"}]
            });
            assert_eq!(classify(&msg), MessageShape::ToolBlocks, "block type {kind}");
        }
    }

    #[test]
    fn tool_result_block_is_not_an_invocation() {
        let msg = json!({
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "t1", "content": "ok"}]
        });
        assert_eq!(classify(&msg), MessageShape::Plain);
    }

    #[test]
    fn non_object_message() {
        assert_eq!(classify(&json!("just text")), MessageShape::Plain);
        assert_eq!(classify(&json!(null)), MessageShape::Plain);
        assert_eq!(role(&json!(42)), None);
    }
}
