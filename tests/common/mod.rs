#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_stream::wrappers::ReceiverStream;

use ucdn_gateway::config::{AnchorConfig, Config};
use ucdn_gateway::AppState;

pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn state_with(config: Config, anchor: AnchorConfig) -> AppState {
    AppState::new(config, &anchor)
}

pub fn test_state() -> AppState {
    state_with(
        Config {
            forward_proxy: "http://127.0.0.1:1".into(),
            target_host: "cdn.test".into(),
            target_scheme: "https".into(),
            cors_url: "http://relay.test/".into(),
            port: 0,
        },
        AnchorConfig::default(),
    )
}

pub fn req(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn assert_cors(headers: &HeaderMap) {
    for (name, value) in ucdn_gateway::cors::CORS_HEADERS {
        let vals: Vec<_> = headers.get_all(&name).iter().collect();
        assert_eq!(vals, vec![value], "{name}");
    }
}

// --- origin double ---

#[derive(Clone, Default)]
pub struct RequestLog {
    pub requests: Arc<Mutex<Vec<(String, HeaderMap)>>>,
    pub bodies: Arc<Mutex<Vec<Bytes>>>,
}

impl RequestLog {
    pub fn record(&self, uri: &Uri, headers: HeaderMap) -> usize {
        let mut reqs = self.requests.lock().unwrap();
        reqs.push((uri.to_string(), headers));
        reqs.len()
    }

    pub fn record_body(&self, body: Bytes) {
        self.bodies.lock().unwrap().push(body);
    }

    pub fn bodies(&self) -> Vec<Bytes> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serves a DASH manifest with a cookie and a CDN header the gateway must drop.
pub fn origin_app(log: RequestLog) -> Router {
    Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, upload: Bytes| {
        let log = log.clone();
        async move {
            log.record(&uri, headers);
            log.record_body(upload);
            let body = if method == Method::HEAD { "" } else { "<MPD/>" };
            (
                StatusCode::OK,
                [
                    ("content-type", "application/dash+xml"),
                    ("set-cookie", "sid=abc; Path=/"),
                    ("x-cdn-pop", "SIN"),
                    ("cache-control", "max-age=2"),
                ],
                body,
            )
        }
    })
}

// --- forwarding proxy double ---

/// Plain HTTP forward proxy: takes absolute-form requests and re-issues them.
pub fn forwarder_app(hits: Arc<AtomicUsize>) -> Router {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Router::new()
        .fallback(forward)
        .with_state((client, hits))
}

async fn forward(
    State((client, hits)): State<(reqwest::Client, Arc<AtomicUsize>)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    upload: Bytes,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let mut upstream_headers = headers.clone();
    for name in ["host", "proxy-connection", "content-length", "transfer-encoding"] {
        upstream_headers.remove(name);
    }
    let mut outbound = client
        .request(method, uri.to_string())
        .headers(upstream_headers);
    if !upload.is_empty() {
        outbound = outbound.body(upload);
    }
    let resp = match outbound.send().await {
        Ok(r) => r,
        Err(e) => return (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    };
    let status = resp.status();
    let headers = resp.headers().clone();
    // streamed, so a client hanging up reaches the origin
    let mut out = Response::new(Body::from_stream(resp.bytes_stream()));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out.headers_mut().remove("transfer-encoding");
    out
}

// --- slow origins ---

/// Answers only after `delay`.
pub fn slow_app(delay: Duration) -> Router {
    Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    })
}

/// Streams 1 KiB every 20ms for ~10s. Sets `aborted` once nobody is reading.
pub fn trickle_app(aborted: Arc<AtomicBool>) -> Router {
    Router::new().fallback(move || {
        let aborted = aborted.clone();
        async move {
            let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(1);
            tokio::spawn(async move {
                for _ in 0..500 {
                    if tx.send(Ok(Bytes::from(vec![b'x'; 1024]))).await.is_err() {
                        aborted.store(true, Ordering::SeqCst);
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            });
            (
                [("content-type", "video/iso.segment")],
                Body::from_stream(ReceiverStream::new(rx)),
            )
        }
    })
}

// --- relay double ---

/// Redirects `redirects` times (Location `/next/<n>`), then serves a playlist.
pub fn relay_app(log: RequestLog, redirects: usize) -> Router {
    Router::new().fallback(move |uri: Uri, headers: HeaderMap| {
        let log = log.clone();
        async move {
            let n = log.record(&uri, headers);
            if n <= redirects {
                (
                    StatusCode::FOUND,
                    [("location", format!("/next/{n}")), ("x-relay-hop", n.to_string())],
                )
                    .into_response()
            } else {
                (
                    StatusCode::OK,
                    [
                        ("content-type", "application/vnd.apple.mpegurl"),
                        ("set-cookie", "edge=1"),
                        ("x-relay-final", "yes"),
                    ],
                    "#EXTM3U\n",
                )
                    .into_response()
            }
        }
    })
}
