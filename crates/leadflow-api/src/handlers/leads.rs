//! Lead creation handler.
//!
//! Hands the submitted document to `IngestionService` for the tenant
//! resolved by the auth middleware and maps the outcome to a response.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use leadflow_core::{CorrelationId, LeadId, LeadflowError, TenantId, ValidationError};
use leadflow_ingest::IngestOutcome;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::AppState;

/// Body of a `201 Created` response.
#[derive(Debug, Serialize)]
pub struct LeadCreatedResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: &'static str,
    /// Identifiers of the new lead.
    pub data: LeadCreatedData,
}

/// Identifiers returned for a created lead.
#[derive(Debug, Serialize)]
pub struct LeadCreatedData {
    /// Storage-assigned id.
    pub lead_id: LeadId,
    /// Correlation id, generated when the client sent none.
    pub correlation_id: CorrelationId,
}

/// Body of a `422 Unprocessable Entity` response.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Messages grouped by field; document-level errors under `schema`.
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Body of every other error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Client-safe description.
    pub message: String,
    /// Error code from the `E1001`-`E3002` taxonomy.
    pub code: &'static str,
}

/// Creates a lead for the authenticated tenant.
///
/// # Responses
///
/// - 201: stored and announced
/// - 400: body is not a JSON document
/// - 409: correlation id already used
/// - 422: schema violations
/// - 500: storage or queue failure, or the schema cannot be loaded
#[instrument(name = "create_lead", skip_all)]
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let document = match payload {
        Ok(Json(document)) => document,
        Err(rejection) => {
            warn!(%tenant_id, error = %rejection.body_text(), "Unreadable lead body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    success: false,
                    message: "Request body must be a JSON document".to_string(),
                    code: "E1001",
                }),
            )
                .into_response();
        },
    };

    match state.ingestion.ingest(tenant_id, &document).await {
        IngestOutcome::Completed(receipt) => {
            info!(
                %tenant_id,
                lead_id = %receipt.lead_id,
                correlation_id = %receipt.correlation_id,
                "Lead accepted"
            );
            (
                StatusCode::CREATED,
                Json(LeadCreatedResponse {
                    success: true,
                    message: "Lead created successfully",
                    data: LeadCreatedData {
                        lead_id: receipt.lead_id,
                        correlation_id: receipt.correlation_id,
                    },
                }),
            )
                .into_response()
        },
        IngestOutcome::Rejected(errors)
            if errors.iter().any(ValidationError::is_schema_failure) =>
        {
            let detail = errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");
            error!(%tenant_id, error = %detail, "Lead schema unavailable");
            error_response(&LeadflowError::Configuration(detail))
        },
        IngestOutcome::Rejected(errors) => validation_response(&errors),
        IngestOutcome::Failed(failure) => error_response(&LeadflowError::from(failure)),
    }
}

fn validation_response(errors: &[ValidationError]) -> Response {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for error in errors {
        grouped.entry(error.field_key().to_string()).or_default().push(error.message.clone());
    }

    let error = LeadflowError::Validation(errors.to_vec());
    (
        status_for(&error),
        Json(ValidationErrorResponse {
            success: false,
            message: error.public_message(),
            errors: grouped,
        }),
    )
        .into_response()
}

/// Maps a service error to a response without leaking its internal detail.
pub fn error_response(error: &LeadflowError) -> Response {
    (
        status_for(error),
        Json(ErrorResponse { success: false, message: error.public_message(), code: error.code() }),
    )
        .into_response()
}

/// HTTP status for each error in the taxonomy.
pub const fn status_for(error: &LeadflowError) -> StatusCode {
    match error {
        LeadflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadflowError::Conflict { .. } => StatusCode::CONFLICT,
        LeadflowError::Unauthorized => StatusCode::UNAUTHORIZED,
        LeadflowError::PublishFailed(_)
        | LeadflowError::Storage(_)
        | LeadflowError::Configuration(_)
        | LeadflowError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
