//! Configuration types and loading for the file-sync service.

use std::path::{Component, Path, PathBuf};

use eyre::WrapErr as _;
use serde::Deserialize;
use tokio::fs;

/// HTTP server binding configuration section.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port for the websocket/health listener.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

/// Which paths are watched and how bursts are coalesced.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchSection {
    /// Directories to watch recursively. Relative paths are resolved against
    /// the config file's directory.
    #[serde(default = "default_watch_paths")]
    pub paths: Vec<String>,
    /// Gitignore-style globs that never trigger a reload.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Quiet period after the last event before the action fires.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: default_watch_paths(),
            ignore: default_ignore(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Container-side cache invalidation settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReloadSection {
    /// Containers that get their caches cleared on source changes.
    #[serde(default)]
    pub containers: Vec<String>,
    /// Docker client binary used for `exec`.
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
    /// WordPress install path inside the containers.
    #[serde(default = "default_wp_path")]
    pub wp_path: String,
    /// Hard timeout for each cache-clear exec, in seconds.
    #[serde(default = "default_exec_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            docker_bin: default_docker_bin(),
            wp_path: default_wp_path(),
            timeout_secs: default_exec_timeout_secs(),
        }
    }
}

/// Root config structure for the file-sync service.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub reload: ReloadSection,
}

const fn default_port() -> u16 {
    3001
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_watch_paths() -> Vec<String> {
    vec![".".to_string()]
}

fn default_ignore() -> Vec<String> {
    // A leading "**/" keeps multi-segment patterns unanchored; gitignore
    // rules anchor any pattern containing an interior slash.
    [
        "node_modules/",
        ".git/",
        "cache/",
        "*.log",
        "**/wp-content/uploads/",
    ]
    .map(str::to_string)
    .to_vec()
}

const fn default_delay_ms() -> u64 {
    500
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

fn default_wp_path() -> String {
    "/var/www/html".to_string()
}

const fn default_exec_timeout_secs() -> u64 {
    10
}

/// Reads and parses the file-sync config from a TOML file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<WatchConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(&path).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: WatchConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(config)
}

/// Resolves a configured path against the config file's directory.
pub fn resolve_config_relative_path(config_path: &Path, relative_path: &str) -> PathBuf {
    let path = Path::new(relative_path);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_path
            .parent()
            .map_or_else(|| path.to_path_buf(), |d| d.join(path))
    };
    normalize_path(&resolved)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        use Component as C;
        match component {
            C::Normal(c) => {
                result.push(c);
            }
            C::ParentDir => {
                result.pop();
            }
            C::CurDir => {}
            C::RootDir | C::Prefix(_) => {
                result.push(component);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    #[tokio::test]
    async fn load_filesync_config_file() {
        let toml_str = r#"
            [server]
            port = 4001

            [watch]
            paths = ["./themes", "./plugins"]
            delay_ms = 250

            [reload]
            containers = ["wp_blog"]
        "#;
        let tmp = env::temp_dir().join("sitebridge_filesync_test_config.toml");
        fs::write(&tmp, toml_str).unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg.server.port, 4001);
        assert_eq!(cfg.watch.paths, vec!["./themes", "./plugins"]);
        assert_eq!(cfg.watch.delay_ms, 250);
        assert_eq!(cfg.reload.containers, vec!["wp_blog"]);
        // Unset fields keep their defaults.
        assert_eq!(cfg.watch.ignore.len(), 5);
        assert_eq!(cfg.reload.docker_bin, "docker");
    }

    #[tokio::test]
    async fn empty_config_uses_defaults() {
        let tmp = env::temp_dir().join("sitebridge_filesync_empty_config.toml");
        fs::write(&tmp, "").unwrap();
        let cfg = load(&tmp).await.unwrap();
        assert_eq!(cfg, WatchConfig::default());
        assert_eq!(cfg.watch.delay_ms, 500);
    }
}
