//! Configuration loading utilities for the bridge API service.

use std::path::Path;

use eyre::WrapErr as _;
use tokio::fs;

use crate::config::BridgeConfig;

/// Reads and parses the bridge config from a TOML file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<BridgeConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(&path).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: BridgeConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    #[tokio::test]
    async fn load_bridge_config_file() {
        let toml_str = r#"
            [server]
            port = 9090
            bind = "127.0.0.1"

            [tool]
            path = "./matrix"
            workdir = ".."
            timeout_secs = 10

            [sites]
            root = "/srv/wordpress"
            dir_prefix = "wp_"
        "#;
        let tmp = env::temp_dir().join("sitebridge_api_test_config.toml");
        fs::write(&tmp, toml_str).unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.tool.path, "./matrix");
        assert_eq!(cfg.tool.workdir.as_deref(), Some(".."));
        assert_eq!(cfg.tool.timeout_secs, 10);
        assert_eq!(cfg.sites.root, "/srv/wordpress");
        // Unspecified section falls back wholesale.
        assert_eq!(cfg.compose.bin, "docker-compose");
    }

    #[tokio::test]
    async fn load_bridge_config_missing_file() {
        let missing = env::temp_dir().join("sitebridge_api_no_such_config.toml");
        let err = load(&missing).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[tokio::test]
    async fn empty_config_uses_defaults() {
        let tmp = env::temp_dir().join("sitebridge_api_empty_config.toml");
        fs::write(&tmp, "").unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg, BridgeConfig::default());
    }
}
