use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::proxy::stream::relay_body;
use crate::AppState;

const PREFIX: &str = "/starhub/";

/// `GET /starhub/<path>`: fixed relay + origin, headers passed through untouched.
pub async fn handle(State(state): State<AppState>, uri: Uri) -> Response {
    match fetch(&state, &uri).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn fetch(state: &AppState, uri: &Uri) -> Result<Response, GatewayError> {
    let path = uri
        .path()
        .strip_prefix(PREFIX)
        .filter(|p| !p.is_empty())
        .ok_or(GatewayError::EmptyPath)?;
    let anchor = state
        .anchor
        .as_ref()
        .ok_or_else(|| GatewayError::Internal("relay-anchored client unavailable".into()))?;

    let upstream = anchor.fetch(path, uri.query()).await?;

    let status = upstream.status();
    let headers = upstream.headers().clone();
    let mut response = Response::new(relay_body(upstream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
