//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;

use compat_shim::config::ProxyConfig;
use compat_shim::lifecycle::Shutdown;
use compat_shim::normalize::Normalizer;
use compat_shim::HttpServer;

/// One request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("upstream received non-JSON body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone)]
struct Backend {
    seen: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
    body: &'static str,
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a mock upstream that records every request and answers with a
/// fixed status and JSON body.
pub async fn start_mock_upstream(status: StatusCode, body: &'static str) -> MockUpstream {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let backend = Backend {
        seen: seen.clone(),
        status,
        body,
    };

    let app = Router::new()
        .fallback(record)
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, seen }
}

async fn record(
    State(backend): State<Backend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    backend.seen.lock().unwrap().push(Captured {
        method,
        uri: uri.to_string(),
        headers,
        body,
    });
    (
        backend.status,
        [("content-type", "application/json"), ("x-upstream", "mock")],
        backend.body,
    )
}

/// Start an upstream that answers every path with a 302 to `/elsewhere`,
/// except `/elsewhere` itself, which answers 200 "followed".
pub async fn start_redirecting_upstream() -> SocketAddr {
    async fn route(uri: Uri) -> axum::response::Response {
        if uri.path() == "/elsewhere" {
            (StatusCode::OK, "followed").into_response()
        } else {
            (StatusCode::FOUND, [("location", "/elsewhere")], "moved").into_response()
        }
    }

    let app = Router::new().fallback(route);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A shim running on a random local port.
pub struct RunningShim {
    pub addr: SocketAddr,
    pub normalizer: Arc<Normalizer>,
    shutdown: Shutdown,
}

impl RunningShim {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningShim {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the shim pointed at `upstream` over plain HTTP.
pub async fn start_shim(upstream: SocketAddr) -> RunningShim {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.host = upstream.ip().to_string();
    config.upstream.port = upstream.port();
    config.upstream.scheme = "http".to_string();
    config.upstream.connect_timeout_secs = Some(2);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let normalizer = server.normalizer().clone();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningShim {
        addr,
        normalizer,
        shutdown,
    }
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
