//! API key authentication middleware with tenant isolation.
//!
//! Extracts the bearer key, resolves it to a tenant through an
//! `Authenticator` and injects the `TenantId` into request extensions.
//! Keys are only ever compared by their SHA-256 digest.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use leadflow_core::{storage::api_keys, LeadflowError, TenantId};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::AppState;

/// Resolves API keys to tenants.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the tenant owning `api_key`, or `None` if the key is unknown.
    async fn authenticate(&self, api_key: &str) -> Result<Option<TenantId>, AuthError>;
}

/// Looks keys up in the `api_keys` table.
#[derive(Clone)]
pub struct PostgresAuthenticator {
    api_keys: Arc<api_keys::Repository>,
}

impl PostgresAuthenticator {
    /// Wraps the API key repository.
    pub fn new(api_keys: Arc<api_keys::Repository>) -> Self {
        Self { api_keys }
    }
}

#[async_trait]
impl Authenticator for PostgresAuthenticator {
    async fn authenticate(&self, api_key: &str) -> Result<Option<TenantId>, AuthError> {
        let key_hash = sha256::digest(api_key.as_bytes());

        self.api_keys.validate(&key_hash).await.map_err(|e| AuthError::Database(e.to_string()))
    }
}

/// Fixed key set for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    keys: HashMap<String, TenantId>,
}

impl StaticAuthenticator {
    /// Creates an authenticator accepting no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `api_key` on behalf of `tenant_id`.
    #[must_use]
    pub fn with_key(mut self, api_key: &str, tenant_id: TenantId) -> Self {
        self.keys.insert(sha256::digest(api_key.as_bytes()), tenant_id);
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, api_key: &str) -> Result<Option<TenantId>, AuthError> {
        Ok(self.keys.get(&sha256::digest(api_key.as_bytes())).copied())
    }
}

/// Extracts API key from Authorization header.
/// Supports Bearer token format: "Bearer <api-key>"
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(String::from)
}

/// Errors that can occur during API key authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provided API key is unknown or revoked.
    #[error("invalid API key")]
    InvalidApiKey,
    /// The key store could not be queried.
    #[error("key lookup failed: {0}")]
    Database(String),
    /// The Authorization header is missing or not a bearer token.
    #[error("missing Authorization header")]
    MissingHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            Self::InvalidApiKey | Self::MissingHeader => {
                let error = LeadflowError::Unauthorized;
                (StatusCode::UNAUTHORIZED, error.public_message(), error.code())
            },
            Self::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string(), "E3001")
            },
        };

        (status, Json(json!({ "success": false, "message": message, "code": code })))
            .into_response()
    }
}

/// Axum middleware that authenticates requests using API keys.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let api_key = extract_api_key(req.headers()).ok_or_else(|| {
        debug!("request without bearer token");
        AuthError::MissingHeader
    })?;

    let tenant_id = match state.authenticator.authenticate(&api_key).await {
        Ok(Some(tenant_id)) => tenant_id,
        Ok(None) => {
            warn!("rejected unknown API key");
            return Err(AuthError::InvalidApiKey);
        },
        Err(e) => {
            error!(error = %e, "API key lookup failed");
            return Err(e);
        },
    };

    req.extensions_mut().insert(tenant_id);

    Ok(next.run(req).await)
}
