use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH: &str = "checkers_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub server_addr: String,
    /// How long a request may wait for its reply. `None` waits forever.
    pub reply_timeout_ms: Option<u64>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl NetConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: NetConfig = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|_| Self::default())
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            server_addr: "127.0.0.1:8080".to_string(),
            reply_timeout_ms: Some(10_000),
            log_filter: "info".to_string(),
        }
    }
}
