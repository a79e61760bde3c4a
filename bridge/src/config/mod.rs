//! Configuration management for the bridge API service.

mod loader;
mod types;

pub use loader::load;
pub use types::{
    BridgeConfig, ComposeConfig, ServerConfig, SitesConfig, ToolConfig,
    resolve_config_relative_path,
};
