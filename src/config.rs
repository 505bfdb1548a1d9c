//! Process-wide settings, read once at startup.

use clap::Parser;

pub const DEFAULT_FORWARD_PROXY: &str = "http://203.117.83.181:203";
pub const DEFAULT_TARGET_HOST: &str = "ucdn.starhubgo.com";
pub const DEFAULT_TARGET_SCHEME: &str = "https";
pub const DEFAULT_CORS_URL: &str = "http://cors-buster.fly.dev";

#[derive(Parser, Debug, Clone)]
#[command(name = "ucdn-gateway", version, about = "CORS gateway for a media CDN origin")]
pub struct Config {
    /// Forwarding proxy every proxy-mode origin call is routed through
    #[arg(long, default_value = DEFAULT_FORWARD_PROXY, env = "XFORWARDER")]
    pub forward_proxy: String,

    /// Origin host the gateway fronts
    #[arg(long, default_value = DEFAULT_TARGET_HOST, env = "TARGET_HOST")]
    pub target_host: String,

    /// Origin scheme (http or https)
    #[arg(long, default_value = DEFAULT_TARGET_SCHEME, env = "TARGET_SCHEME")]
    pub target_scheme: String,

    /// Public CORS relay base used for redirect mode
    #[arg(long, default_value = DEFAULT_CORS_URL, env = "CORS_URL")]
    pub cors_url: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forward_proxy: DEFAULT_FORWARD_PROXY.into(),
            target_host: DEFAULT_TARGET_HOST.into(),
            target_scheme: DEFAULT_TARGET_SCHEME.into(),
            cors_url: DEFAULT_CORS_URL.into(),
            port: 3000,
        }
    }
}

impl Config {
    /// Relay base with any trailing slash removed.
    pub fn relay_base(&self) -> &str {
        self.cors_url.trim_end_matches('/')
    }
}

/// Fixed relay + origin pair used by the `/starhub` passthrough.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    pub relay: String,
    pub origin: String,
    pub user_agent: String,
    pub forwarded_for: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            relay: "https://cors-buster.fly.dev".into(),
            origin: "https://ucdn.starhubgo.com".into(),
            user_agent: "ExoPlayerDemo/2.15.1 (Linux; Android 13) ExoPlayerLib/2.15.1".into(),
            forwarded_for: "203.117.83.181".into(),
        }
    }
}
