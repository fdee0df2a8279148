/*!
 * HTTP surface of the validation service.
 *
 * Routes:
 * - `GET /`          service metadata
 * - `GET /health`    tool availability
 * - `POST /validate` multipart upload of `wiring` (required) and `fab` (optional)
 */

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use log::{debug, warn};
use std::sync::Arc;

use crate::app_config::ServerConfig;
use crate::errors::ValidationError;
use crate::response::{HealthResponse, InfoResponse, UnhealthyResponse, ValidateResponse};
use crate::validation_service::ValidationService;
use crate::workflow::{ValidationRequest, WorkflowVariant};

pub const SERVICE_NAME: &str = "ONF Validator";
pub const SERVICE_DESCRIPTION: &str = "Validates Hedgehog Open Network Fabric configuration files";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Form field carrying the wiring diagram
pub const WIRING_FIELD: &str = "wiring";
/// Form field carrying the fabricator config
pub const FAB_FIELD: &str = "fab";

/// Shared, read-only state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub service: ValidationService,
}

impl AppState {
    /// Production state: the `hhfab` backend configured from `config`
    pub fn from_config(config: ServerConfig) -> Self {
        let service = ValidationService::from_config(&config);
        Self::new(config, service)
    }

    pub fn new(config: ServerConfig, service: ValidationService) -> Self {
        Self {
            config: Arc::new(config),
            service,
        }
    }
}

/// Build the router with all routes and the body size limit
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();
    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/validate", post(validate_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn info_handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        service: SERVICE_NAME.to_string(),
        description: SERVICE_DESCRIPTION.to_string(),
        version: VERSION.to_string(),
        endpoints: vec![
            "POST /validate".to_string(),
            "GET /health".to_string(),
            "GET /".to_string(),
        ],
    })
}

async fn health_handler(State(state): State<AppState>) -> Response {
    if !state.service.tool_available() {
        warn!("Health check failed: {} not found", state.service.tool_program());
        let body = UnhealthyResponse {
            status: "unhealthy".to_string(),
            error: format!("{} utility not available", state.service.tool_program()),
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    let body = HealthResponse {
        status: "healthy".to_string(),
        service: "validator".to_string(),
        version: VERSION.to_string(),
        timestamp: chrono::Utc::now(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn validate_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request = match multipart {
        Ok(multipart) => read_upload(multipart, &state.config).await,
        Err(rejection) => Err(ValidationError::MalformedUpload(rejection.body_text())),
    };

    let request = match request {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected upload: {}", e);
            return error_response(&e, None);
        }
    };

    let variant = request.variant();
    match state.service.validate(request).await {
        Ok(result) => {
            let status = if result.succeeded() {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(ValidateResponse::from_result(&result))).into_response()
        }
        Err(e) => error_response(&e, Some(variant)),
    }
}

/// Collect the `wiring` and `fab` uploads from the form
///
/// Only file parts count: a part without a file name (a plain form value
/// or an input with no file chosen) is skipped like an unknown field. The
/// first file part of each name is used.
async fn read_upload(
    mut multipart: Multipart,
    config: &ServerConfig,
) -> Result<ValidationRequest, ValidationError> {
    let mut wiring: Option<Bytes> = None;
    let mut fab: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "request", config.max_body_bytes()))?
    {
        if !is_file_part(&field) {
            debug!("Skipping non-file part {:?}", field.name());
            continue;
        }
        let slot = match field.name() {
            Some(WIRING_FIELD) if wiring.is_none() => &mut wiring,
            Some(FAB_FIELD) if fab.is_none() => &mut fab,
            _ => continue,
        };
        *slot = Some(read_field(field, config.max_file_bytes).await?);
    }

    let wiring = wiring.ok_or(ValidationError::MissingRequiredFile)?;
    Ok(ValidationRequest { wiring, fab })
}

fn is_file_part(field: &Field<'_>) -> bool {
    field.file_name().is_some_and(|name| !name.is_empty())
}

async fn read_field(field: Field<'_>, max_file_bytes: usize) -> Result<Bytes, ValidationError> {
    let name = field.name().unwrap_or_default().to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, &name, max_file_bytes))?;
    if data.len() > max_file_bytes {
        return Err(ValidationError::FileTooLarge {
            field: name,
            limit: max_file_bytes,
        });
    }
    Ok(data)
}

fn multipart_error(error: MultipartError, field: &str, limit: usize) -> ValidationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::FileTooLarge {
            field: field.to_string(),
            limit,
        };
    }
    ValidationError::MalformedUpload(error.body_text())
}

/// HTTP status for each error kind
pub fn status_for(error: &ValidationError) -> StatusCode {
    match error {
        ValidationError::MalformedUpload(_) | ValidationError::MissingRequiredFile => {
            StatusCode::BAD_REQUEST
        }
        ValidationError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ValidationError::Workspace(_)
        | ValidationError::InitFailed { .. }
        | ValidationError::ToolCrashed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ValidationError::ToolUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ValidationError::ToolTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn error_response(error: &ValidationError, variant: Option<WorkflowVariant>) -> Response {
    (status_for(error), Json(ValidateResponse::from_error(error, variant))).into_response()
}
