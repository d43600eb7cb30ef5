//! Leadflow HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use leadflow_core::Clock;
use leadflow_ingest::IngestionService;

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use config::Config;
pub use middleware::auth::{AuthError, Authenticator, PostgresAuthenticator, StaticAuthenticator};
pub use server::{create_router, start_server};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline.
    pub ingestion: IngestionService,
    /// Resolves API keys to tenants.
    pub authenticator: Arc<dyn Authenticator>,
    /// Time source for health responses.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Bundles the collaborators the router needs.
    pub fn new(
        ingestion: IngestionService,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ingestion, authenticator, clock }
    }
}
