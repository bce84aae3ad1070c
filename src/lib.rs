//! Compatibility shim for a strict chat-completion upstream.
//!
//! Accepts OpenAI/Anthropic-style requests, rewrites the JSON body so the
//! upstream's parameter and message-shape rules hold, and forwards it.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod normalize;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::ShimError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use normalize::{NormalizeReport, Normalizer};
