//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Ctrl+C, or Shutdown::trigger()
//!     → shutdown_signal() resolves
//!     → axum stops accepting, finishes in-flight requests
//!     → HttpServer::run returns
//! ```

pub mod shutdown;

pub use shutdown::{shutdown_signal, Shutdown};
