//! Repository for API key lookups.
//!
//! Keys are stored as SHA-256 hex digests; the plaintext never reaches the
//! database. Keys are provisioned out of band by inserting a digest row.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{error::Result, models::TenantId};

/// Repository for API key database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Resolves a key digest to its tenant and stamps `last_used_at`.
    ///
    /// Revoked keys resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn validate(&self, key_hash: &str) -> Result<Option<TenantId>> {
        let tenant_id = sqlx::query_scalar::<_, TenantId>(
            r"
            UPDATE api_keys
            SET last_used_at = NOW()
            WHERE key_hash = $1
              AND revoked_at IS NULL
            RETURNING tenant_id
            ",
        )
        .bind(key_hash)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(tenant_id)
    }
}
