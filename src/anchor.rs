//! Fixed relay + origin passthrough that keeps every redirect hop on the relay.
//!
//! Redirects are followed by hand: each `Location` is resolved, re-anchored
//! under `<relay>/<origin>`, and re-issued with the spoofed player identity.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use reqwest::Url;
use tracing::{debug, error};

use crate::config::AnchorConfig;
use crate::error::GatewayError;

/// Redirects followed before the last response is handed back as-is.
pub const MAX_REDIRECTS: usize = 10;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AnchorClient {
    client: reqwest::Client,
    relay: String,
    origin: String,
    identity: HeaderMap,
}

impl AnchorClient {
    pub fn new(cfg: &AnchorConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Internal(format!("relay client: {e}")))?;

        let mut identity = HeaderMap::new();
        identity.insert(header::USER_AGENT, header_value(&cfg.user_agent)?);
        identity.insert("x-forwarded-for", header_value(&cfg.forwarded_for)?);

        Ok(Self {
            client,
            relay: cfg.relay.trim_end_matches('/').to_string(),
            origin: cfg.origin.trim_end_matches('/').to_string(),
            identity,
        })
    }

    /// `<relay>/<origin>/<path>[?query]`
    pub fn initial_url(&self, path: &str, query: Option<&str>) -> Result<Url, GatewayError> {
        let mut raw = format!("{}/{}/{}", self.relay, self.origin, path);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            raw.push('?');
            raw.push_str(q);
        }
        Url::parse(&raw).map_err(|e| GatewayError::InvalidTarget(format!("{raw}: {e}")))
    }

    /// Where the next hop goes, or `None` if `resp` is not a followable redirect.
    pub fn next_hop(&self, current: &Url, status: StatusCode, headers: &HeaderMap) -> Option<Url> {
        if !is_followable(status) {
            return None;
        }
        let location = headers.get(header::LOCATION)?.to_str().ok()?;
        let resolved = current.join(location).ok()?;

        let mut next = Url::parse(&self.relay).ok()?;
        next.set_path(&format!("/{}{}", self.origin, resolved.path()));
        next.set_query(resolved.query());
        Some(next)
    }

    /// Fetch `path` through the relay, following at most [`MAX_REDIRECTS`].
    pub async fn fetch(&self, path: &str, query: Option<&str>) -> Result<reqwest::Response, GatewayError> {
        let mut url = self.initial_url(path, query)?;
        let mut followed = 0;

        loop {
            let resp = self
                .client
                .get(url.clone())
                .headers(self.identity.clone())
                .send()
                .await
                .map_err(|e| {
                    error!(%url, hop = followed, "relay request failed: {e}");
                    GatewayError::from(e)
                })?;

            if followed >= MAX_REDIRECTS {
                if is_followable(resp.status()) {
                    debug!(%url, "redirect limit reached, returning last response");
                }
                return Ok(resp);
            }
            let Some(next) = self.next_hop(&url, resp.status(), resp.headers()) else {
                return Ok(resp);
            };

            followed += 1;
            debug!(from = %url, to = %next, hop = followed, "re-anchoring redirect");
            url = next;
        }
    }
}

fn is_followable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn header_value(v: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(v)
        .map_err(|e| GatewayError::Internal(format!("identity header {v:?}: {e}")))
}
