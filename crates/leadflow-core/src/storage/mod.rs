//! Database access layer implementing the repository pattern.
//!
//! The repository layer translates between domain models and database
//! schemas. All SQL lives in these repositories; the ingestion crate reaches
//! the database only through them.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api_keys;
pub mod leads;

use crate::error::Result;

/// Container for all repository instances providing unified database access.
#[derive(Clone)]
pub struct Storage {
    /// Repository for lead records.
    pub leads: Arc<leads::Repository>,

    /// Repository for API key lookups.
    pub api_keys: Arc<api_keys::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self {
            leads: Arc::new(leads::Repository::new(pool.clone())),
            api_keys: Arc::new(api_keys::Repository::new(pool)),
        }
    }
}

/// Creates the tables and indexes the service needs.
///
/// Idempotent; safe to run on every start-up.
///
/// # Errors
///
/// Returns error if any DDL statement fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS leads (
            id BIGSERIAL PRIMARY KEY,
            tenant_id UUID NOT NULL,
            correlation_id UUID NOT NULL UNIQUE,
            email VARCHAR(255) NOT NULL,
            first_name VARCHAR(255),
            last_name VARCHAR(255),
            phone VARCHAR(20),
            company VARCHAR(255),
            source VARCHAR(32),
            metadata JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_leads_tenant_created
        ON leads(tenant_id, created_at)
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_email ON leads(email)")
        .execute(pool)
        .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS api_keys (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            tenant_id UUID NOT NULL,
            key_hash TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            revoked_at TIMESTAMPTZ,
            last_used_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        // Actual database testing happens against a live instance
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _storage = Storage::new(pool);
    }
}
