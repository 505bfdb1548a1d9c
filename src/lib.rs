pub mod anchor;
pub mod api;
pub mod config;
pub mod cors;
pub mod error;
pub mod headers;
pub mod proxy;

use std::sync::Arc;

use config::{AnchorConfig, Config};

/// Everything a handler needs. Built once at startup and cloned per request;
/// nothing in here is mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: proxy::ProxyRelay,
    pub anchor: Option<anchor::AnchorClient>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(config: Config, anchor_cfg: &AnchorConfig) -> Self {
        let relay = proxy::ProxyRelay::new(&config.forward_proxy);
        let anchor = match anchor::AnchorClient::new(anchor_cfg) {
            Ok(a) => Some(a),
            Err(e) => {
                tracing::error!("relay-anchored client disabled: {e}");
                None
            }
        };
        Self {
            config: Arc::new(config),
            relay,
            anchor,
            started_at: std::time::Instant::now(),
        }
    }
}
