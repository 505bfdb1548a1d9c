//! Proxy mode: fetch the origin through the forwarding proxy and stream it back.

pub mod stream;

use std::future::Future;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody as _},
    http::{HeaderMap, Method},
    response::Response,
};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::GatewayError;
use crate::{cors, headers};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE: usize = 100;

/// Outbound side of proxy mode. Built once; a bad forwarding-proxy URL is
/// remembered so that requests fail with 500 instead of dialling anything.
#[derive(Clone)]
pub struct ProxyRelay {
    client: Result<reqwest::Client, String>,
    header_timeout: Duration,
}

impl ProxyRelay {
    pub fn new(forward_proxy: &str) -> Self {
        let client = build_client(forward_proxy).map_err(|e| {
            error!(forward_proxy, "forwarding proxy unusable: {e}");
            e
        });
        Self {
            client,
            header_timeout: RESPONSE_HEADER_TIMEOUT,
        }
    }

    /// Override how long the origin may take to answer once the request is out.
    pub fn with_header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_ok()
    }

    fn client(&self) -> Result<&reqwest::Client, GatewayError> {
        self.client
            .as_ref()
            .map_err(|e| GatewayError::InvalidForwardProxy(e.clone()))
    }

    /// One attempt against `target`; no retries.
    pub async fn forward(
        &self,
        method: Method,
        target: &str,
        inbound_headers: &HeaderMap,
        body: Body,
    ) -> Result<Response, GatewayError> {
        let client = self.client()?;
        let url = reqwest::Url::parse(target)
            .map_err(|e| GatewayError::InvalidTarget(format!("{target}: {e}")))?;

        let mut req = client
            .request(method, url)
            .headers(headers::filter_request_headers(inbound_headers));
        let mut uploaded = None;
        if !body.is_end_stream() {
            let (upload, done) = stream::request_body(body);
            req = req.body(upload);
            uploaded = Some(done);
        }

        let upstream = match await_headers(req.send(), uploaded, self.header_timeout).await {
            Some(Ok(r)) => r,
            Some(Err(e)) => {
                error!(url = target, "upstream fetch error: {e}");
                return Err(e.into());
            }
            None => {
                error!(url = target, timeout = ?self.header_timeout, "upstream did not answer in time");
                return Err(GatewayError::Upstream(format!(
                    "no response headers within {:?}",
                    self.header_timeout
                )));
            }
        };

        let status = upstream.status();
        debug!(url = target, status = status.as_u16(), "upstream responded");

        let mut res_headers = headers::filter_response_headers(upstream.headers());
        cors::apply(&mut res_headers);

        let mut response = Response::new(stream::relay_body(upstream));
        *response.status_mut() = status;
        *response.headers_mut() = res_headers;
        Ok(response)
    }
}

/// Wait for the response head. The timeout only starts once any upload has
/// been handed over, so slow uploads are bounded by the client, not by us.
/// `None` means the origin took longer than `limit` after that point.
async fn await_headers<F>(
    send: F,
    uploaded: Option<oneshot::Receiver<()>>,
    limit: Duration,
) -> Option<Result<reqwest::Response, reqwest::Error>>
where
    F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    tokio::pin!(send);
    if let Some(uploaded) = uploaded {
        tokio::select! {
            res = &mut send => return Some(res),
            _ = uploaded => {}
        }
    }
    tokio::time::timeout(limit, send).await.ok()
}

fn build_client(forward_proxy: &str) -> Result<reqwest::Client, String> {
    let url = reqwest::Url::parse(forward_proxy).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(format!("unsupported forwarding proxy {forward_proxy}"));
    }
    let proxy = reqwest::Proxy::all(url).map_err(|e| e.to_string())?;

    reqwest::Client::builder()
        .proxy(proxy)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .pool_max_idle_per_host(POOL_MAX_IDLE)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())
}
