use std::time::Duration;

use runtime::ServerConfig;
use serde::{Deserialize, Serialize};

/// HTTP host settings, derived from the `server` section of the app config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// 0 disables the handler timeout.
    #[serde(default)]
    pub timeout_sec: u64,
    pub body_limit_bytes: usize,
}

impl ApiIngressConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_sec > 0).then(|| Duration::from_secs(self.timeout_sec))
    }
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ApiIngressConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            bind_addr: format!("{}:{}", server.host, server.port),
            enable_docs: server.enable_docs,
            cors_enabled: server.cors_enabled,
            timeout_sec: server.timeout_sec,
            body_limit_bytes: server.body_limit_bytes,
        }
    }
}
