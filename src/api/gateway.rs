//! `/api/qwerty` and `/qwerty`: map the request onto the origin, then either
//! send the browser to the relay or proxy the origin ourselves.

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{cors, AppState};

const ROUTE_PREFIX: &str = "/api/qwerty/";
const DIRECT_PREFIX: &str = "/qwerty/";

pub const USAGE: &str = concat!(
    "UCdn Gateway — usage:\n",
    " - rewrite: /qwerty/<path>\n",
    " - or direct: /api/qwerty?path=<path>\n",
    "Example:\n",
    " /qwerty/HubSports1HDnew1/output/manifest.mpd\n",
);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GatewayQuery {
    pub path: Option<String>,
    pub mode: Option<String>,
}

impl GatewayQuery {
    /// First occurrence of each key wins; repeated keys never discard the rest.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "path" if query.path.is_none() => query.path = Some(value),
                "mode" if query.mode.is_none() => query.mode = Some(value),
                _ => {}
            }
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Redirect,
    Proxy,
}

impl Mode {
    /// Case-insensitive; anything but `proxy` means redirect.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(m) if m.eq_ignore_ascii_case("proxy") => Self::Proxy,
            _ => Self::Redirect,
        }
    }
}

/// `path` query parameter first, then the routed suffix, then the direct one.
pub fn resolve_path<'a>(query_path: Option<&'a str>, uri_path: &'a str) -> Option<&'a str> {
    query_path
        .filter(|p| !p.is_empty())
        .or_else(|| uri_path.strip_prefix(ROUTE_PREFIX))
        .or_else(|| uri_path.strip_prefix(DIRECT_PREFIX))
        .filter(|p| !p.is_empty())
}

/// `scheme://host/` + path without its leading slashes. `None` if nothing is left.
pub fn target_url(scheme: &str, host: &str, path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}/{path}"))
}

pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    cors::with_cors(dispatch(state, method, uri, query, headers, body).await)
}

async fn dispatch(
    state: AppState,
    method: Method,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let query = GatewayQuery::from_pairs(query.map(|Query(pairs)| pairs).unwrap_or_default());
    let cfg = &state.config;

    let Some(target) = resolve_path(query.path.as_deref(), uri.path())
        .and_then(|p| target_url(&cfg.target_scheme, &cfg.target_host, p))
    else {
        return usage();
    };

    match Mode::parse(query.mode.as_deref()) {
        Mode::Proxy => {
            debug!(%method, url = %target, "proxy mode");
            match state.relay.forward(method, &target, &headers, body).await {
                Ok(resp) => resp,
                Err(e) => e.into_response(),
            }
        }
        Mode::Redirect => {
            let location = format!("{}/{}", cfg.relay_base(), target);
            debug!(location = %location, "redirect mode");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
    }
}

fn usage() -> Response {
    USAGE.into_response()
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
