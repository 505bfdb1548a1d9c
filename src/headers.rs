//! Header policies applied at the proxy boundary.
//!
//! Client → origin: everything except hop-by-hop / proxy-control headers.
//! Origin → client: only the metadata a media player needs.

use axum::http::header::{self, HeaderName};
use axum::http::{HeaderMap, HeaderValue};

/// Sent upstream when the client supplied no `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = concat!("UCdn-Gateway/", env!("CARGO_PKG_VERSION"));

/// Never forwarded from the client to the origin.
pub const REQUEST_DENY: &[&str] = &[
    "host",
    "connection",
    "proxy-authorization",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The only origin headers the client gets to see.
pub const RESPONSE_ALLOW: &[HeaderName] = &[
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::ACCEPT_RANGES,
    header::CONTENT_RANGE,
];

fn is_denied(name: &HeaderName) -> bool {
    // HeaderName is always lower-case, but keep the comparison explicit
    REQUEST_DENY
        .iter()
        .any(|d| name.as_str().eq_ignore_ascii_case(d))
}

/// Copy client headers for the origin request, preserving every value of
/// every retained name in order.
pub fn filter_request_headers(src: &HeaderMap) -> HeaderMap {
    let mut dst = HeaderMap::with_capacity(src.len() + 1);
    for (name, value) in src {
        if !is_denied(name) {
            dst.append(name.clone(), value.clone());
        }
    }
    if !dst.contains_key(header::USER_AGENT) {
        dst.insert(
            header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_USER_AGENT),
        );
    }
    dst
}

/// Copy only allow-listed origin headers. Name matching is case-insensitive
/// since `HeaderName` normalises to lower case on parse.
pub fn filter_response_headers(src: &HeaderMap) -> HeaderMap {
    let mut dst = HeaderMap::new();
    for name in RESPONSE_ALLOW {
        for value in src.get_all(name) {
            dst.append(name.clone(), value.clone());
        }
    }
    dst
}
