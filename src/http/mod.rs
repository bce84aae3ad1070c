//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS, OPTIONS short-circuit)
//!     → body buffered and parsed
//!     → crate::normalize (payload rewritten in place)
//!     → forward.rs (upstream request, streamed response)
//!     → response.rs (hop-by-hop stripping, JSON errors)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, ForwarderError};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
