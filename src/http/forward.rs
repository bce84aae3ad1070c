//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send the (normalized) body to the fixed upstream host with the inbound
//!   method, path and query
//! - Pass `Authorization` through verbatim and force `Content-Type: application/json`
//! - Relay the upstream status, headers and streamed body back unchanged
//!
//! No retries: a failed upstream call is reported to the caller as-is.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::response::Response;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ShimError;
use crate::http::response::strip_hop_by_hop;

/// Failure to set up the upstream client at startup.
#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("invalid upstream URL {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Client for the upstream chat-completion host.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    base_url: String,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ForwarderError> {
        let base_url = config.base_url();
        Url::parse(&base_url).map_err(|source| ForwarderError::Url {
            url: base_url.clone(),
            source,
        })?;

        // A 3xx from upstream is relayed to the caller, not followed.
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Upstream URL for an inbound path (and query).
    ///
    /// The path is appended to the base rather than resolved against it, so
    /// an inbound `//host/...` cannot redirect the request elsewhere.
    pub fn target_url(&self, path_and_query: &str) -> Result<Url, ShimError> {
        let joined = if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        };
        Url::parse(&joined).map_err(|e| ShimError::Request(e.to_string()))
    }

    /// Issue the upstream request.
    pub async fn send(
        &self,
        method: Method,
        path_and_query: &str,
        authorization: HeaderValue,
        body: Bytes,
    ) -> Result<reqwest::Response, ShimError> {
        let url = self.target_url(path_and_query)?;

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !body.is_empty() {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}

/// Turn an upstream response into one for the caller, streaming the body.
pub fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
