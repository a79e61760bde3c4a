//! Request handlers for the bridge API.
//!
//! Every response carries a `success` flag independent of the HTTP status:
//! a well-formed request whose underlying tool invocation failed is a 200
//! with `success:false` and the tool's own output, so callers can tell
//! "request malformed" apart from "requested operation failed".

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sitebridge_common::{CommandResult, RunError};
use thiserror::Error as ThisError;
use tracing::{error, info, warn};

use crate::{
    http::AppState,
    inventory::{reconcile, scan_site_dirs},
    parser::{parse_compose_services, parse_listing},
    validate,
};

/// Normalized JSON response body for command-style actions.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors that terminate a request before or outside a tool invocation.
///
/// Tool failures and timeouts are not represented here; they travel inside a
/// 200 [`Envelope`] (see [`ToolOutcome`]).
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// Bad or missing input; the subprocess is never spawned.
    #[error("{0}")]
    Validation(String),
    /// No such route.
    #[error("Endpoint not found")]
    NotFound,
    /// Unexpected failure inside the bridge itself.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => {
                error!(error = %self, "Internal bridge error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// How one bounded tool invocation ended, with failure kept as data.
enum ToolOutcome {
    Finished(CommandResult),
    TimedOut { command: String, secs: u64 },
}

/// Run the given program through the shared runner, folding timeouts into a
/// reportable outcome and surfacing only spawn/IO problems as errors.
async fn run_checked(
    state: &AppState,
    program: &str,
    args: Vec<String>,
) -> Result<ToolOutcome, ApiError> {
    match state.runner.run(program, &args, state.timeout()).await {
        Ok(result) => Ok(ToolOutcome::Finished(result)),
        Err(RunError::Timeout { command, timeout }) => Ok(ToolOutcome::TimedOut {
            command,
            secs: timeout.as_secs(),
        }),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

fn action_envelope(outcome: ToolOutcome) -> Json<Envelope> {
    match outcome {
        ToolOutcome::Finished(result) => {
            if !result.success {
                info!(command = %result.command, exit_code = ?result.exit_code, "Tool reported failure");
            }
            Json(Envelope {
                success: result.success,
                message: Some(result.combined_output()),
                data: Some(json!({
                    "command": result.command,
                    "exit_code": result.exit_code,
                    "stdout": result.stdout,
                    "stderr": result.stderr,
                })),
                error: None,
            })
        }
        ToolOutcome::TimedOut { command, secs } => Json(Envelope {
            success: false,
            message: None,
            data: Some(json!({ "command": command })),
            error: Some(format!("Command timed out after {secs}s")),
        }),
    }
}

/// Body for the single-site lifecycle actions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteActionBody {
    pub name: String,
}

/// Body for database import/export actions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DbActionBody {
    pub site: String,
    pub file: String,
}

/// Shared path for create/remove/start/stop: validate, then invoke the tool
/// with a discrete argv.
async fn site_action(
    state: &AppState,
    subcommand: &str,
    name: &str,
) -> Result<Json<Envelope>, ApiError> {
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    validate::site_name(name).map_err(|msg| ApiError::Validation(msg.to_string()))?;

    let args = vec![subcommand.to_string(), name.to_string()];
    let outcome = run_checked(state, &state.config.tool.path, args).await?;
    Ok(action_envelope(outcome))
}

pub async fn create_site(
    State(state): State<AppState>,
    Json(body): Json<SiteActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    site_action(&state, "create", &body.name).await
}

pub async fn remove_site(
    State(state): State<AppState>,
    Json(body): Json<SiteActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    site_action(&state, "remove", &body.name).await
}

pub async fn start_site(
    State(state): State<AppState>,
    Json(body): Json<SiteActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    site_action(&state, "start", &body.name).await
}

pub async fn stop_site(
    State(state): State<AppState>,
    Json(body): Json<SiteActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    site_action(&state, "stop", &body.name).await
}

pub async fn import_db(
    State(state): State<AppState>,
    Json(body): Json<DbActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    if body.site.is_empty() {
        return Err(ApiError::Validation("site is required".to_string()));
    }
    if body.file.is_empty() {
        return Err(ApiError::Validation("file is required".to_string()));
    }
    validate::site_name(&body.site).map_err(|msg| ApiError::Validation(msg.to_string()))?;
    validate::file_path(&body.file).map_err(|msg| ApiError::Validation(msg.to_string()))?;

    let args = vec!["import-db".to_string(), body.site, body.file];
    let outcome = run_checked(&state, &state.config.tool.path, args).await?;
    Ok(action_envelope(outcome))
}

pub async fn export_db(
    State(state): State<AppState>,
    Json(body): Json<DbActionBody>,
) -> Result<Json<Envelope>, ApiError> {
    if body.site.is_empty() {
        return Err(ApiError::Validation("site is required".to_string()));
    }
    validate::site_name(&body.site).map_err(|msg| ApiError::Validation(msg.to_string()))?;

    let mut args = vec!["export-db".to_string(), body.site];
    // No trailing empty argument when the destination is left to the tool.
    if !body.file.is_empty() {
        validate::file_path(&body.file).map_err(|msg| ApiError::Validation(msg.to_string()))?;
        args.push(body.file);
    }
    let outcome = run_checked(&state, &state.config.tool.path, args).await?;
    Ok(action_envelope(outcome))
}

/// `GET /sites`: tool-reported inventory merged with on-disk directories.
///
/// A failing or missing tool degrades to the directory-only inventory rather
/// than an error; the endpoint stays useful while the tool is down.
pub async fn list_sites(State(state): State<AppState>) -> Response {
    let args = vec!["list".to_string()];
    let parsed = match state
        .runner
        .run(&state.config.tool.path, &args, state.timeout())
        .await
    {
        Ok(result) => {
            if !result.success {
                warn!(
                    command = %result.command,
                    exit_code = ?result.exit_code,
                    "Site listing failed; merging directory inventory only"
                );
            }
            parse_listing(&result.stdout).sites
        }
        Err(e) => {
            warn!(error = %e, "Site listing unavailable; falling back to directory inventory");
            Vec::new()
        }
    };

    let on_disk = match scan_site_dirs(&state.sites_root, &state.config.sites.dir_prefix) {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, root = %state.sites_root.display(), "Cannot scan site directories");
            Vec::new()
        }
    };

    Json(reconcile(parsed, &on_disk)).into_response()
}

/// `GET /services`: compose container status, one record per service.
pub async fn list_services(State(state): State<AppState>) -> Result<Response, ApiError> {
    let args = vec![
        "ps".to_string(),
        "--format".to_string(),
        "json".to_string(),
    ];
    match run_checked(&state, &state.config.compose.bin, args).await? {
        ToolOutcome::Finished(result) if result.success => {
            Ok(Json(parse_compose_services(&result.stdout)).into_response())
        }
        outcome => Ok(action_envelope(outcome).into_response()),
    }
}

/// Passthrough response for the tool's own status/help text.
#[derive(Debug, Serialize)]
pub struct Passthrough {
    pub success: bool,
    pub output: String,
}

async fn passthrough(state: &AppState, subcommand: &str) -> Result<Response, ApiError> {
    let args = vec![subcommand.to_string()];
    match run_checked(state, &state.config.tool.path, args).await? {
        ToolOutcome::Finished(result) => Ok(Json(Passthrough {
            success: result.success,
            output: result.combined_output(),
        })
        .into_response()),
        outcome @ ToolOutcome::TimedOut { .. } => Ok(action_envelope(outcome).into_response()),
    }
}

pub async fn tool_status(State(state): State<AppState>) -> Result<Response, ApiError> {
    passthrough(&state, "status").await
}

pub async fn tool_help(State(state): State<AppState>) -> Result<Response, ApiError> {
    passthrough(&state, "help").await
}

/// Fallback for unknown routes.
pub async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound
}
