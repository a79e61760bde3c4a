//! Service wiring and HTTP server startup.
//!
//! `start` loads the config, spawns the watch loop, and serves the websocket
//! and health endpoints until shutdown. The watch loop and the HTTP side only
//! meet at the broadcast channel.

use core::time::Duration;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};
use chrono::Utc;
use sitebridge_common::{CommandRunner, ToolRunner, shutdown_signal};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{ServiceBuilderExt as _, request_id::MakeRequestUuid, timeout::TimeoutLayer};
use tracing::{error, info};

use crate::classify::classify;
use crate::config::{self, WatchConfig, resolve_config_relative_path};
use crate::debounce::FireAction;
use crate::dispatch;
use crate::ignore::IgnoreRules;
use crate::watcher;
use crate::ws::{self, WsMessage};

/// Shared state for the websocket handlers.
#[derive(Clone)]
pub struct SyncState {
    pub ws_tx: broadcast::Sender<WsMessage>,
}

/// Build the route table. Exposed for in-process router tests.
pub fn create_router(state: SyncState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(ws::health))
        .with_state(state)
}

fn create_app(state: SyncState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .propagate_x_request_id()
        // must be after request-id
        .trace_for_http()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    create_router(state).layer(middleware_stack)
}

fn extension_label(path: &Path) -> String {
    path.extension()
        .map_or_else(String::new, |e| format!(".{}", e.to_string_lossy()))
}

/// The action run for every settled change: clear container caches, then
/// broadcast the reload.
fn make_on_fire(
    config: Arc<WatchConfig>,
    runner: Arc<dyn CommandRunner>,
    ws_tx: broadcast::Sender<WsMessage>,
) -> FireAction {
    Arc::new(move |path: PathBuf| {
        let config = Arc::clone(&config);
        let runner = Arc::clone(&runner);
        let ws_tx = ws_tx.clone();
        Box::pin(async move {
            let class = classify(&path);
            info!(path = %path.display(), ?class, "File changed");

            dispatch::handle_change(&path, class, &config.reload, runner.as_ref()).await;

            let msg = WsMessage::Reload {
                file: path.display().to_string(),
                extension: extension_label(&path),
                timestamp: Utc::now().timestamp_millis(),
            };
            // Err just means no browser is connected right now.
            drop(ws_tx.send(msg));
        })
    })
}

/// Load config, start the watch loop, and serve until shutdown.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the ignore globs
/// do not compile, the bind address does not parse, or the listener cannot
/// bind.
pub async fn start(
    config_path: &Path,
    port_override: Option<u16>,
    bind_override: Option<&str>,
) -> eyre::Result<()> {
    let config = Arc::new(config::load(config_path).await?);

    let rules = IgnoreRules::new(&config.watch.ignore)?;
    let watch_paths: Vec<PathBuf> = config
        .watch
        .paths
        .iter()
        .map(|p| resolve_config_relative_path(config_path, p))
        .collect();
    let delay = Duration::from_millis(config.watch.delay_ms);

    let runner: Arc<dyn CommandRunner> = Arc::new(ToolRunner::new());
    let (ws_tx, _) = broadcast::channel(32);
    let on_fire = make_on_fire(Arc::clone(&config), runner, ws_tx.clone());

    tokio::spawn(async move {
        if let Err(e) = watcher::run_watch_loop(watch_paths, rules, delay, on_fire).await {
            error!("Watch loop failed: {:#}", e);
        }
    });

    let listen_port = port_override.unwrap_or(config.server.port);
    let bind = bind_override.unwrap_or(&config.server.bind);
    let listen_ip: IpAddr = bind.parse()?;
    let addr = SocketAddr::from((listen_ip, listen_port));

    let app = create_app(SyncState { ws_tx });

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
