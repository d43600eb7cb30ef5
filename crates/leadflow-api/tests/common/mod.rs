//! Router fixture wired to in-memory storage, transport and diagnostics.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, Response},
    Router,
};
use leadflow_api::{create_router, AppState, StaticAuthenticator};
use leadflow_core::{TenantId, TestClock};
use leadflow_ingest::{storage::mock::MockLeadStorage, IngestionService};
use leadflow_logging::{LogMode, LogRouter, RecordingDiagnostics};
use leadflow_publish::{
    transport::mock::MockTransport, Destination, EventPublisher, PublisherConfig,
};
use leadflow_schema::{InMemorySchemaLoader, SchemaValidator, LEAD_SCHEMA_REF};
use serde_json::Value;
use tower::ServiceExt;

pub const API_KEY: &str = "lf_test_key_0123456789";
pub const LEADS_QUEUE: &str = "http://localhost:4566/000000000000/leads";
pub const LOGS_QUEUE: &str = "http://localhost:4566/000000000000/logs";

pub struct TestApp {
    pub router: Router,
    pub tenant: TenantId,
    pub storage: MockLeadStorage,
    pub transport: MockTransport,
    pub diagnostics: RecordingDiagnostics,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mode(LogMode::Local)
    }

    pub fn with_mode(mode: LogMode) -> Self {
        Self::build(mode, LEAD_SCHEMA_REF)
    }

    pub fn with_schema_ref(schema_ref: &str) -> Self {
        Self::build(LogMode::Local, schema_ref)
    }

    fn build(mode: LogMode, schema_ref: &str) -> Self {
        let tenant = TenantId::new();
        let storage = MockLeadStorage::new();
        let transport = MockTransport::new();
        let diagnostics = RecordingDiagnostics::new();
        let clock = Arc::new(TestClock::new());

        let publisher = Arc::new(EventPublisher::new(
            Arc::new(transport.clone()),
            PublisherConfig {
                leads_destination: Destination::new(LEADS_QUEUE),
                log_destination: Destination::new(LOGS_QUEUE),
            },
            clock.clone(),
        ));
        let logger =
            LogRouter::new(mode, Arc::new(diagnostics.clone()), publisher.clone(), clock.clone());
        let ingestion = IngestionService::new(
            SchemaValidator::new(Arc::new(InMemorySchemaLoader::with_lead_schema())),
            Arc::new(storage.clone()),
            publisher,
            logger,
            clock.clone(),
            schema_ref,
        );
        let authenticator = Arc::new(StaticAuthenticator::new().with_key(API_KEY, tenant));

        let state = AppState::new(ingestion, authenticator, clock);
        let router = create_router(state, Duration::from_secs(5));

        Self { router, tenant, storage, transport, diagnostics }
    }

    pub async fn send(&self, request: Request<Body>) -> (Response<Body>, Value) {
        let response = self.router.clone().oneshot(request).await.expect("request execution");
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("body extraction");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (Response::from_parts(parts, Body::empty()), json)
    }

    pub async fn post_lead(&self, body: &str) -> (Response<Body>, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/leads")
            .header(AUTHORIZATION, format!("Bearer {API_KEY}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (Response<Body>, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).expect("request build");

        self.send(request).await
    }
}
