//! Tool identifier normalization.
//!
//! The upstream accepts only `[A-Za-z0-9_-]+` for tool identifiers. Cleaning
//! is a pure function of the original string, so a tool call and the result
//! that refers back to it still agree after rewriting.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

use crate::normalize::observer::{NormalizeEvent, NormalizeObserver};

const FALLBACK_PREFIX: &str = "tooluse_";

/// Source of fallback identifiers for ids that clean down to nothing.
///
/// One instance lives for the whole process and is shared by every request,
/// so generated ids are never reused until restart.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next fallback id. The counter is bumped before use, so the first id is
    /// `tooluse_1`.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{FALLBACK_PREFIX}{n}")
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Clean an identifier into the allowed character class.
///
/// Ids that are already valid come back borrowed and unchanged. Otherwise each
/// run of disallowed characters becomes a single `_` and underscores at either
/// end are trimmed. The result may be empty.
pub fn clean_id(raw: &str) -> Cow<'_, str> {
    if !raw.is_empty() && raw.chars().all(is_allowed) {
        return Cow::Borrowed(raw);
    }

    let mut cleaned = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if is_allowed(c) {
            cleaned.push(c);
            in_run = false;
        } else if !in_run {
            cleaned.push('_');
            in_run = true;
        }
    }

    Cow::Owned(cleaned.trim_matches('_').to_string())
}

/// Where an identifier sits: on a tool invocation, or on a result that
/// refers back to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Invocation,
    Reference,
}

/// Rewrites identifier fields during one walk over a payload.
///
/// Every invocation whose id cleans down to nothing gets a fresh fallback.
/// A back-reference with the same original string picks up the fallback most
/// recently assigned to an invocation, so a call and its result stay linked.
pub struct IdRewriter<'a> {
    ids: &'a IdGenerator,
    observer: &'a dyn NormalizeObserver,
    fallbacks: HashMap<String, String>,
    rewritten: usize,
}

impl<'a> IdRewriter<'a> {
    pub fn new(ids: &'a IdGenerator, observer: &'a dyn NormalizeObserver) -> Self {
        Self {
            ids,
            observer,
            fallbacks: HashMap::new(),
            rewritten: 0,
        }
    }

    /// Number of fields rewritten so far.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    /// Walk `node` and rewrite every identifier in a known position.
    pub fn visit(&mut self, node: &mut Value) {
        match node {
            Value::Object(fields) => {
                if let Some(Value::Object(tool_use)) = fields.get_mut("tool_use") {
                    self.rewrite(tool_use, "id", "tool_use.id", Position::Invocation);
                }

                let is_tool_use = fields.get("type").and_then(Value::as_str) == Some("tool_use");
                if is_tool_use {
                    self.rewrite(fields, "id", "id", Position::Invocation);
                }

                // Covers `tool_result` blocks as well as bare back-references.
                self.rewrite(fields, "tool_use_id", "tool_use_id", Position::Reference);
                self.rewrite(fields, "tool_call_id", "tool_call_id", Position::Reference);

                if let Some(Value::Array(calls)) = fields.get_mut("tool_calls") {
                    for call in calls.iter_mut() {
                        if let Value::Object(call) = call {
                            self.rewrite(call, "id", "tool_calls.id", Position::Invocation);
                        }
                    }
                }

                for child in fields.values_mut() {
                    self.visit(child);
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.visit(item);
                }
            }
            _ => {}
        }
    }

    /// Replace `fields[key]` with its normalized form. Non-string values and
    /// ids that are already valid are left alone.
    fn rewrite(
        &mut self,
        fields: &mut Map<String, Value>,
        key: &str,
        label: &'static str,
        position: Position,
    ) {
        let Some(Value::String(raw)) = fields.get(key) else {
            return;
        };
        let Some(normalized) = self.normalize(raw, label, position) else {
            return;
        };
        fields.insert(key.to_string(), Value::String(normalized));
        self.rewritten += 1;
    }

    /// `None` when `raw` needs no change.
    fn normalize(&mut self, raw: &str, label: &'static str, position: Position) -> Option<String> {
        let cleaned = match clean_id(raw) {
            Cow::Borrowed(_) => return None,
            Cow::Owned(cleaned) => cleaned,
        };

        if !cleaned.is_empty() {
            self.observer.observe(&NormalizeEvent::IdRewritten {
                field: label,
                from: raw,
                to: &cleaned,
            });
            return Some(cleaned);
        }

        let linked = match position {
            Position::Reference => self.fallbacks.get(raw).cloned(),
            Position::Invocation => None,
        };
        let generated = match linked {
            Some(existing) => existing,
            None => {
                let id = self.ids.next_id();
                self.fallbacks.insert(raw.to_string(), id.clone());
                id
            }
        };
        self.observer.observe(&NormalizeEvent::IdGenerated {
            field: label,
            from: raw,
            to: &generated,
        });
        Some(generated)
    }
}
