use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("Invalid proxy URL: {0}")]
    InvalidForwardProxy(String),

    #[error("failed to build upstream request: {0}")]
    InvalidTarget(String),

    #[error("Upstream fetch error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyPath => StatusCode::BAD_REQUEST,
            Self::InvalidForwardProxy(_) | Self::InvalidTarget(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
