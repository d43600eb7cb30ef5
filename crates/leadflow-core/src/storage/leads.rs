//! Repository for lead records.
//!
//! Inserts run inside a caller-owned transaction, so the ingestion service
//! can hold the row invisible until the lead-created event has been
//! acknowledged.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{CorrelationId, LeadId, LeadRecord, StoredLead, TenantId},
};

/// Repository for lead database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Runs a trivial query against the pool.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.pool).await?;

        Ok(())
    }

    /// Opens a transaction on the underlying pool.
    ///
    /// # Errors
    ///
    /// Returns error if no connection can be acquired.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Inserts a lead within a transaction.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conflict` if the correlation id already exists.
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lead: &LeadRecord,
    ) -> Result<LeadId> {
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO leads (
                tenant_id, correlation_id, email, first_name, last_name,
                phone, company, source, metadata
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9
            )
            RETURNING id
            ",
        )
        .bind(lead.tenant_id)
        .bind(lead.correlation_id)
        .bind(&lead.email)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(lead.source.map(|s| s.as_str()))
        .bind(lead.metadata.as_ref().map(sqlx::types::Json))
        .fetch_one(&mut **tx)
        .await?;

        Ok(LeadId(id))
    }

    /// Finds a lead by its correlation id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Option<StoredLead>> {
        let lead = sqlx::query_as::<_, StoredLead>(
            r"
            SELECT id, tenant_id, correlation_id, email, first_name, last_name,
                   phone, company, source, metadata, created_at
            FROM leads
            WHERE correlation_id = $1
            ",
        )
        .bind(correlation_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(lead)
    }

    /// Counts the leads owned by a tenant.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_for_tenant(&self, tenant_id: TenantId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
