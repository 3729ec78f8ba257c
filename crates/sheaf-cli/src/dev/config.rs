//! Development server settings.
//!
//! Combines the manifest's `dev_server` table with `sheaf dev` flags.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use sheaf_config::{DevServerConfig, SheafConfig};

use crate::cli::DevArgs;
use crate::error::{CliError, Result};

#[derive(Debug, Clone)]
pub struct DevConfig {
    pub addr: SocketAddr,

    /// Swap stylesheets in place; the bundles carry the live reload client
    pub hot: bool,

    /// Directory watched for changes
    pub project_root: PathBuf,

    /// Output root; served from disk when a file is not in memory
    pub out_dir: PathBuf,

    /// The manifest file; changes to it need a restart
    pub manifest: PathBuf,

    /// Path fragments ignored by the watcher
    pub watch_ignore: Vec<String>,

    pub debounce_ms: u64,
}

impl DevConfig {
    /// Merge flags over the manifest's `dev_server` settings
    pub fn new(
        config: &SheafConfig,
        args: &DevArgs,
        project_root: PathBuf,
        manifest: PathBuf,
    ) -> Result<Self> {
        let defaults = DevServerConfig::default();
        let dev = config.dev_server.as_ref().unwrap_or(&defaults);

        let host = args.host.as_deref().unwrap_or(&dev.host);
        let ip: IpAddr = match host {
            "localhost" => Ipv4Addr::LOCALHOST.into(),
            _ => host
                .parse()
                .map_err(|_| CliError::InvalidArgument(format!("invalid host address: {host}")))?,
        };
        let port = args.port.unwrap_or(dev.port);

        let mut watch_ignore = vec!["node_modules".to_string()];
        watch_ignore.extend(dev.watch_ignore.iter().cloned());

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            hot: args.hot || config.hot_enabled(),
            out_dir: config.output_dir(&project_root),
            project_root,
            manifest,
            watch_ignore,
            debounce_ms: dev.debounce_ms,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigArgs;
    use serde_json::json;

    fn args() -> DevArgs {
        DevArgs {
            config: ConfigArgs::default(),
            host: None,
            port: None,
            hot: false,
        }
    }

    #[test]
    fn defaults_without_dev_server_table() {
        let config = SheafConfig::default();
        let dev = DevConfig::new(
            &config,
            &args(),
            PathBuf::from("/site"),
            PathBuf::from("/site/sheaf.toml"),
        )
        .unwrap();

        assert_eq!(dev.server_url(), "http://127.0.0.1:8080");
        assert!(!dev.hot);
        assert_eq!(dev.out_dir, PathBuf::from("/site/dist"));
        assert_eq!(dev.watch_ignore, ["node_modules"]);
    }

    #[test]
    fn flags_override_manifest() {
        let config = SheafConfig::from_value(json!({
            "dev_server": { "port": 9000, "watch_ignore": ["tmp"] }
        }))
        .unwrap();
        let mut args = args();
        args.port = Some(3000);
        args.hot = true;

        let dev = DevConfig::new(
            &config,
            &args,
            PathBuf::from("/site"),
            PathBuf::from("/site/sheaf.toml"),
        )
        .unwrap();
        assert_eq!(dev.addr.port(), 3000);
        assert!(dev.hot);
        assert_eq!(dev.watch_ignore, ["node_modules", "tmp"]);
    }

    #[test]
    fn invalid_host_is_rejected() {
        let mut args = args();
        args.host = Some("not a host".to_string());
        let result = DevConfig::new(
            &SheafConfig::default(),
            &args,
            PathBuf::from("/site"),
            PathBuf::from("/site/sheaf.toml"),
        );
        assert!(matches!(result.unwrap_err(), CliError::InvalidArgument(_)));
    }
}
