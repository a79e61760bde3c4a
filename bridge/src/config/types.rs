//! Configuration data types for the bridge API service.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// HTTP server binding configuration section.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port for the API service.
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

/// Invocation settings for the external site-management executable.
///
/// The executable path is configuration, never request input; request bodies
/// only ever contribute validated arguments.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Path to the site-management executable.
    #[serde(default = "default_tool_path")]
    pub path: String,
    /// Working directory for tool invocations. Relative paths are resolved
    /// against the config file's directory.
    #[serde(default)]
    pub workdir: Option<String>,
    /// Hard wall-clock timeout for every subprocess, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: default_tool_path(),
            workdir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// On-disk site discovery settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SitesConfig {
    /// Directory containing per-site directories. Relative paths are resolved
    /// against the config file's directory.
    #[serde(default = "default_sites_root")]
    pub root: String,
    /// Prefix that marks a directory as a site directory (`<prefix><name>`).
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            root: default_sites_root(),
            dir_prefix: default_dir_prefix(),
        }
    }
}

/// Container status querying settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ComposeConfig {
    /// The compose binary used for `ps --format json`.
    #[serde(default = "default_compose_bin")]
    pub bin: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            bin: default_compose_bin(),
        }
    }
}

/// Root config structure for the bridge API service.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// HTTP server binding configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// External tool invocation settings.
    #[serde(default)]
    pub tool: ToolConfig,
    /// On-disk site discovery settings.
    #[serde(default)]
    pub sites: SitesConfig,
    /// Container status settings.
    #[serde(default)]
    pub compose: ComposeConfig,
}

const fn default_port() -> u16 {
    3000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_tool_path() -> String {
    "./wp-simple".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_sites_root() -> String {
    ".".to_string()
}

fn default_dir_prefix() -> String {
    "wp_".to_string()
}

fn default_compose_bin() -> String {
    "docker-compose".to_string()
}

/// Resolves a configured path to an absolute one.
///
/// If the path is absolute, returns it as-is. If relative, joins it with the
/// config file's parent directory and normalizes the result to remove
/// redundant components like `./`.
pub fn resolve_config_relative_path(config_path: &Path, relative_path: &str) -> PathBuf {
    let path = Path::new(relative_path);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_path
            .parent()
            .map_or_else(|| path.to_path_buf(), |d| d.join(path))
    };

    // Can't use canonicalize() because the target may not exist yet.
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
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.tool.path, "./wp-simple");
        assert_eq!(cfg.tool.timeout_secs, 30);
        assert_eq!(cfg.sites.dir_prefix, "wp_");
        assert_eq!(cfg.compose.bin, "docker-compose");
    }

    #[test]
    fn resolves_relative_paths_against_the_config_dir() {
        let resolved =
            resolve_config_relative_path(Path::new("/etc/sitebridge/bridge.toml"), "./sites");
        assert_eq!(resolved, PathBuf::from("/etc/sitebridge/sites"));
    }

    #[test]
    fn absolute_paths_are_untouched() {
        let resolved =
            resolve_config_relative_path(Path::new("/etc/sitebridge/bridge.toml"), "/srv/sites");
        assert_eq!(resolved, PathBuf::from("/srv/sites"));
    }
}
