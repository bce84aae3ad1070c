//! Observation hooks for the normalization pipeline.
//!
//! The stages never log directly. They report what they changed through a
//! [`NormalizeObserver`] handed in by the caller, so the transforms stay pure
//! and tests can inspect exactly which repairs were made.

use crate::normalize::reasoning::Repair;
use crate::normalize::shape::MessageShape;
use crate::observability::metrics;

/// A single change made by one of the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeEvent<'a> {
    /// Sampling parameters were pinned for a matching model.
    ParamsPinned { model: &'a str, removed_thinking: bool },
    /// `reasoning_content` on a message was filled in or coerced.
    ReasoningRepaired {
        index: usize,
        shape: MessageShape,
        repair: Repair,
    },
    /// A string `reasoning` key was dropped.
    ReasoningDropped,
    /// A non-string `reasoning_content` was turned into text.
    ReasoningContentStringified { fallback: bool },
    /// An identifier was cleaned into the allowed character class.
    IdRewritten { field: &'a str, from: &'a str, to: &'a str },
    /// An identifier cleaned down to nothing and got a generated replacement.
    IdGenerated { field: &'a str, from: &'a str, to: &'a str },
}

impl NormalizeEvent<'_> {
    /// Short stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizeEvent::ParamsPinned { .. } => "params_pinned",
            NormalizeEvent::ReasoningRepaired { .. } => "reasoning_repaired",
            NormalizeEvent::ReasoningDropped => "reasoning_dropped",
            NormalizeEvent::ReasoningContentStringified { .. } => "reasoning_content_stringified",
            NormalizeEvent::IdRewritten { .. } => "id_rewritten",
            NormalizeEvent::IdGenerated { .. } => "id_generated",
        }
    }
}

/// Receives pipeline events.
pub trait NormalizeObserver: Send + Sync {
    fn observe(&self, event: &NormalizeEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl NormalizeObserver for NoopObserver {
    fn observe(&self, _event: &NormalizeEvent<'_>) {}
}

/// Logs events through `tracing` and counts them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl NormalizeObserver for TracingObserver {
    fn observe(&self, event: &NormalizeEvent<'_>) {
        metrics::record_normalize_event(event.kind());

        match event {
            NormalizeEvent::ParamsPinned {
                model,
                removed_thinking,
            } => {
                tracing::debug!(model = %model, removed_thinking, "Pinned sampling parameters");
            }
            NormalizeEvent::ReasoningRepaired {
                index,
                shape,
                repair,
            } => {
                tracing::debug!(index, shape = ?shape, repair = ?repair, "Repaired reasoning_content");
            }
            NormalizeEvent::ReasoningDropped => {
                tracing::trace!("Dropped string reasoning field");
            }
            NormalizeEvent::ReasoningContentStringified { fallback } => {
                tracing::debug!(fallback, "Stringified non-string reasoning_content");
            }
            NormalizeEvent::IdRewritten { field, from, to } => {
                tracing::debug!(field = %field, from = %from, to = %to, "Normalized tool identifier");
            }
            NormalizeEvent::IdGenerated { field, from, to } => {
                tracing::info!(field = %field, from = %from, to = %to, "Generated fallback tool identifier");
            }
        }
    }
}
