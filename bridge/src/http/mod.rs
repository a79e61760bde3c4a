//! HTTP server for the bridge API.
//!
//! Routes, shared state, middleware, and server startup. Requests are handled
//! concurrently; each invocation of the external tool is an independent
//! subprocess and the only shared state is the read-only configuration.

pub mod api;

use core::time::Duration;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use sitebridge_common::{CommandRunner, ToolRunner, shutdown_signal};
use tower::ServiceBuilder;
use tower_http::{ServiceBuilderExt as _, request_id::MakeRequestUuid, timeout::TimeoutLayer};
use tracing::info;

use crate::config::{self, BridgeConfig, resolve_config_relative_path};

/// Shared state for request handlers.
///
/// The runner is held as a trait object so tests can substitute a scripted
/// mock and assert on (or rule out) invocations.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub runner: Arc<dyn CommandRunner>,
    /// Resolved site-directory root (config-relative paths already applied).
    pub sites_root: PathBuf,
}

impl AppState {
    pub fn new(config: Arc<BridgeConfig>, runner: Arc<dyn CommandRunner>, sites_root: PathBuf) -> Self {
        Self {
            config,
            runner,
            sites_root,
        }
    }

    /// Wall-clock budget for one subprocess.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.tool.timeout_secs)
    }
}

/// Build the route table. Exposed for in-process router tests.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/sites", get(api::list_sites))
        .route("/services", get(api::list_services))
        .route("/status", get(api::tool_status))
        .route("/help", get(api::tool_help))
        .route("/create-site", post(api::create_site))
        .route("/remove-site", post(api::remove_site))
        // Legacy name used by the PHP-era dashboard.
        .route("/delete-site", post(api::remove_site))
        .route("/start-site", post(api::start_site))
        .route("/stop-site", post(api::stop_site))
        .route("/import-db", post(api::import_db))
        .route("/export-db", post(api::export_db))
        .fallback(api::endpoint_not_found)
        .with_state(state)
}

fn create_app(state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .propagate_x_request_id()
        // must be after request-id
        .trace_for_http()
        // Outer bound over the whole request; individual subprocesses have
        // their own tighter timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(60),
        ));

    create_router(state).layer(middleware_stack)
}

/// Load config and serve the API until shutdown.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the bind address
/// does not parse, or the listener cannot bind.
pub async fn start(
    config_path: &Path,
    port_override: Option<u16>,
    bind_override: Option<&str>,
) -> eyre::Result<()> {
    let config = Arc::new(config::load(config_path).await?);

    let sites_root = resolve_config_relative_path(config_path, &config.sites.root);
    let runner: Arc<dyn CommandRunner> = Arc::new(match config.tool.workdir {
        Some(ref workdir) => {
            ToolRunner::with_workdir(resolve_config_relative_path(config_path, workdir))
        }
        None => ToolRunner::new(),
    });

    let listen_port = port_override.unwrap_or(config.server.port);
    let bind = bind_override.unwrap_or(&config.server.bind);
    let listen_ip: IpAddr = bind.parse()?;
    let addr = SocketAddr::from((listen_ip, listen_port));

    let app = create_app(AppState::new(config, runner, sites_root));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    let server = axum::serve(listener, app);
    tokio::select! {
        res = server => res?,
        () = shutdown_signal() => {
            info!("Received shutdown, shutting down");
        }
    }

    Ok(())
}
