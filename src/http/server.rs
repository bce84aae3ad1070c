//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all handler
//! - Wire up middleware (request ID, tracing, CORS headers)
//! - Short-circuit `OPTIONS` preflight
//! - Buffer and parse the body, run the normalizer, forward upstream
//! - Relay the upstream response

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ShimError;
use crate::http::forward::{relay, Forwarder, ForwarderError};
use crate::http::request::{request_id_of, UuidRequestId};
use crate::http::response::cors_headers;
use crate::lifecycle::shutdown_signal;
use crate::normalize::{IdGenerator, NormalizeObserver, Normalizer, TracingObserver};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Arc<Normalizer>,
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the shim.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    normalizer: Arc<Normalizer>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration, logging
    /// normalization through `tracing`.
    pub fn new(config: ProxyConfig) -> Result<Self, ForwarderError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create a server that reports normalization events to `observer`.
    pub fn with_observer(
        config: ProxyConfig,
        observer: Arc<dyn NormalizeObserver>,
    ) -> Result<Self, ForwarderError> {
        let forwarder = Arc::new(Forwarder::new(&config.upstream)?);
        let normalizer = Arc::new(Normalizer::new(
            &config.normalizer,
            Arc::new(IdGenerator::new()),
            observer,
        ));

        let state = AppState {
            normalizer: normalizer.clone(),
            forwarder,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            normalizer,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let [origin, methods, headers] = cors_headers();

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::overriding(origin.0, origin.1))
                    .layer(SetResponseHeaderLayer::overriding(methods.0, methods.1))
                    .layer(SetResponseHeaderLayer::overriding(headers.0, headers.1)),
            )
    }

    /// Run the server until Ctrl+C or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The normalizer shared by all requests.
    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }
}

/// Catch-all handler: preflight, or normalize and forward.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id_of(&request).to_string();
    let method = request.method().clone();

    if method == Method::OPTIONS {
        metrics::record_request(method.as_str(), 200, start_time);
        return StatusCode::OK.into_response();
    }

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    let response = match forward(&state, request, &request_id).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ShimError::Upstream(_) | ShimError::Request(_) => {
                    metrics::record_upstream_error();
                    tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                }
                _ => tracing::warn!(request_id = %request_id, error = %e, "Rejected request"),
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(state: &AppState, request: Request<Body>, request_id: &str) -> Result<Response, ShimError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(ShimError::Body)?;
    let outbound = normalize_body(&state.normalizer, bytes, request_id)?;

    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));

    let upstream = state
        .forwarder
        .send(parts.method, path_and_query, authorization, outbound)
        .await?;

    tracing::debug!(
        request_id = %request_id,
        status = %upstream.status(),
        "Upstream responded"
    );
    Ok(relay(upstream))
}

/// Parse and normalize a buffered body.
///
/// An empty body is forwarded as-is. When the normalizer changes nothing the
/// original bytes go out untouched.
fn normalize_body(normalizer: &Normalizer, bytes: Bytes, request_id: &str) -> Result<Bytes, ShimError> {
    if bytes.is_empty() {
        return Ok(bytes);
    }

    let mut payload: Value = serde_json::from_slice(&bytes).map_err(ShimError::MalformedBody)?;
    let report = normalizer.normalize(&mut payload);
    let model = payload.get("model").and_then(Value::as_str).unwrap_or("");

    tracing::debug!(
        request_id = %request_id,
        model = %model,
        params_pinned = report.params_pinned,
        reasoning_repaired = report.reasoning_repaired,
        fields_sanitized = report.fields_sanitized,
        ids_rewritten = report.ids_rewritten,
        "Normalized payload"
    );

    if report.is_unchanged() {
        return Ok(bytes);
    }
    serde_json::to_vec(&payload)
        .map(Bytes::from)
        .map_err(|e| ShimError::Request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_skips_pipeline() {
        let normalizer = Normalizer::with_defaults();
        let out = normalize_body(&normalizer, Bytes::new(), "t").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn malformed_body_is_rejected() {
        let normalizer = Normalizer::with_defaults();
        let err = normalize_body(&normalizer, Bytes::from_static(b"{not json"), "t").unwrap_err();
        assert!(matches!(err, ShimError::MalformedBody(_)));
    }

    #[test]
    fn unchanged_payload_keeps_original_bytes() {
        let normalizer = Normalizer::with_defaults();
        let raw = Bytes::from_static(br#"{ "model": "gpt-4",  "messages": [] , "temperature": 0.7 }"#);
        let out = normalize_body(&normalizer, raw.clone(), "t").unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn changed_payload_is_reserialized() {
        let normalizer = Normalizer::with_defaults();
        let raw = Bytes::from(json!({"model": "kimi-k2", "temperature": 0.1}).to_string());
        let out = normalize_body(&normalizer, raw, "t").unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["temperature"].as_f64(), Some(1.0));
    }
}
