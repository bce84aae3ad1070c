//! Request payload normalization.
//!
//! # Data Flow
//! ```text
//! parsed JSON body
//!     → params.rs    (pin sampling parameters for matching models)
//!     → reasoning.rs (ensure reasoning_content on messages that need it)
//!     → sanitize.rs  (drop string `reasoning`, stringify `reasoning_content`)
//!     → tool_ids.rs  (clean tool identifiers, generate fallbacks)
//!     → serialized and forwarded
//! ```
//!
//! Every stage is total over arbitrary JSON: unexpected shapes are skipped,
//! never rejected. Running the pipeline on its own output changes nothing.

pub mod observer;
pub mod params;
pub mod reasoning;
pub mod sanitize;
pub mod shape;
pub mod tool_ids;

use std::sync::Arc;

use serde_json::Value;

use crate::config::NormalizerConfig;
pub use observer::{NoopObserver, NormalizeEvent, NormalizeObserver, TracingObserver};
pub use params::ModelTrigger;
pub use shape::{classify, MessageShape};
pub use tool_ids::{clean_id, IdGenerator};

/// Summary of what one pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub params_pinned: bool,
    pub reasoning_repaired: usize,
    pub fields_sanitized: usize,
    pub ids_rewritten: usize,
}

impl NormalizeReport {
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

/// The four-stage payload normalizer.
///
/// Cheap to share: clone the `Arc` it is usually held in. The id generator is
/// the only state that outlives a single call.
pub struct Normalizer {
    trigger: ModelTrigger,
    placeholder: String,
    ids: Arc<IdGenerator>,
    observer: Arc<dyn NormalizeObserver>,
}

impl Normalizer {
    pub fn new(
        config: &NormalizerConfig,
        ids: Arc<IdGenerator>,
        observer: Arc<dyn NormalizeObserver>,
    ) -> Self {
        Self {
            trigger: ModelTrigger::new(&config.model_triggers),
            placeholder: config.reasoning_placeholder.clone(),
            ids,
            observer,
        }
    }

    /// Normalizer with default settings, its own id generator and the
    /// tracing observer.
    pub fn with_defaults() -> Self {
        Self::new(
            &NormalizerConfig::default(),
            Arc::new(IdGenerator::new()),
            Arc::new(TracingObserver),
        )
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Rewrite `payload` in place.
    pub fn normalize(&self, payload: &mut Value) -> NormalizeReport {
        let observer = self.observer.as_ref();
        let mut report = NormalizeReport::default();

        let pinned_model = self.trigger.matching_model(payload).map(str::to_string);
        if let (Some(model), Value::Object(fields)) = (pinned_model.as_deref(), &mut *payload) {
            let removed_thinking = params::pin_params(fields);
            observer.observe(&NormalizeEvent::ParamsPinned {
                model,
                removed_thinking,
            });
            report.params_pinned = true;
        }

        if let Some(Value::Array(messages)) = payload.get_mut("messages") {
            report.reasoning_repaired = reasoning::inject_reasoning(
                messages,
                report.params_pinned,
                &self.placeholder,
                observer,
            );
        }

        report.fields_sanitized = sanitize::sanitize_fields(payload, observer);

        let mut rewriter = tool_ids::IdRewriter::new(&self.ids, observer);
        rewriter.visit(payload);
        report.ids_rewritten = rewriter.rewritten();

        report
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("trigger", &self.trigger)
            .field("placeholder", &self.placeholder)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}
