//! Development server configuration types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevServerConfig {
    /// Swap stylesheets in place and keep the live-reload client attached
    #[serde(default)]
    pub hot: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Path fragments ignored by the file watcher, in addition to the output root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watch_ignore: Vec<String>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            hot: false,
            host: default_host(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            watch_ignore: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_debounce_ms() -> u64 {
    100
}
