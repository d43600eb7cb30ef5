//! Service description served at the API root.

use axum::Json;
use serde::Serialize;

/// Name, version and purpose of the service.
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    /// Service name.
    pub name: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Describes the service. Unauthenticated.
pub async fn api_info() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "Leadflow API",
        version: env!("CARGO_PKG_VERSION"),
        description: "Lead ingestion gateway publishing LeadCreated events with switchable logging",
    })
}
