//! Storage abstraction for the ingestion service.
//!
//! The service needs a transaction it can write into, then commit or roll
//! back depending on whether the lead-created event was published. Production
//! wraps `leadflow_core::storage::leads::Repository`; tests use
//! `mock::MockLeadStorage`, which enforces correlation-id uniqueness across
//! in-flight transactions the way the database's unique index does.

use std::{future::Future, pin::Pin, sync::Arc};

use leadflow_core::{
    error::Result,
    storage::leads::Repository,
    CorrelationId, LeadId, LeadRecord, StoredLead, TenantId,
};
use sqlx::{Postgres, Transaction};

/// Lead storage operations required by the ingestion service.
pub trait LeadStorage: Send + Sync + 'static {
    /// Opens a transaction.
    fn begin(&self) -> Pin<Box<dyn Future<Output = Result<Box<dyn LeadTransaction>>> + Send + '_>>;

    /// Finds a committed lead by correlation id.
    fn find_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StoredLead>>> + Send + '_>>;

    /// Counts committed leads owned by a tenant.
    fn count_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + '_>>;

    /// Checks that the storage engine answers.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// An open storage transaction.
///
/// Writes stay invisible to other readers until `commit`. Dropping a
/// transaction without closing it discards its writes.
pub trait LeadTransaction: Send {
    /// Writes a lead.
    ///
    /// Returns `CoreError::Conflict` when the correlation id is taken,
    /// including by another open transaction.
    fn insert<'a>(
        &'a mut self,
        record: &'a LeadRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LeadId>> + Send + 'a>>;

    /// Makes the writes visible.
    fn commit(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;

    /// Discards the writes.
    fn rollback(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// PostgreSQL-backed lead storage.
#[derive(Clone)]
pub struct PostgresLeadStorage {
    leads: Arc<Repository>,
}

impl PostgresLeadStorage {
    /// Wraps the lead repository.
    pub fn new(leads: Arc<Repository>) -> Self {
        Self { leads }
    }
}

impl LeadStorage for PostgresLeadStorage {
    fn begin(&self) -> Pin<Box<dyn Future<Output = Result<Box<dyn LeadTransaction>>> + Send + '_>> {
        Box::pin(async move {
            let tx = self.leads.begin().await?;
            Ok(Box::new(PostgresTransaction { tx, leads: self.leads.clone() })
                as Box<dyn LeadTransaction>)
        })
    }

    fn find_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StoredLead>>> + Send + '_>> {
        Box::pin(async move { self.leads.find_by_correlation_id(correlation_id).await })
    }

    fn count_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + '_>> {
        Box::pin(async move { self.leads.count_for_tenant(tenant_id).await })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.leads.health_check().await })
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
    leads: Arc<Repository>,
}

impl LeadTransaction for PostgresTransaction {
    fn insert<'a>(
        &'a mut self,
        record: &'a LeadRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LeadId>> + Send + 'a>> {
        Box::pin(async move { self.leads.create_in_tx(&mut self.tx, record).await })
    }

    fn commit(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            let this = *self;
            this.tx.commit().await?;
            Ok(())
        })
    }

    fn rollback(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            let this = *self;
            this.tx.rollback().await?;
            Ok(())
        })
    }
}

pub mod mock {
    //! In-memory lead storage for testing.
    //!
    //! Committed rows live in a shared vector; an open transaction reserves
    //! the correlation ids it has written until it commits or rolls back.
    //! Counters record how the service drove the storage, and failures can
    //! be injected per operation.

    use std::{
        collections::HashSet,
        future::Future,
        pin::Pin,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
    };

    use chrono::Utc;
    use leadflow_core::{
        error::Result, CoreError, CorrelationId, LeadId, LeadRecord, StoredLead, TenantId,
    };

    use super::{LeadStorage, LeadTransaction};

    #[derive(Debug, Default)]
    struct State {
        committed: Vec<StoredLead>,
        reserved: HashSet<CorrelationId>,
        next_id: i64,
        begins: usize,
        inserts: usize,
        commits: usize,
        rollbacks: usize,
        begin_error: Option<String>,
        insert_error: Option<String>,
        commit_error: Option<String>,
    }

    /// Mock storage for testing ingestion without a database.
    #[derive(Debug, Clone, Default)]
    pub struct MockLeadStorage {
        state: Arc<Mutex<State>>,
    }

    impl MockLeadStorage {
        /// Creates empty storage.
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> MutexGuard<'_, State> {
            lock(&self.state)
        }

        /// Makes `begin` fail with `message`.
        pub fn fail_begin(&self, message: impl Into<String>) {
            self.state().begin_error = Some(message.into());
        }

        /// Makes `insert` fail with `message`.
        pub fn fail_insert(&self, message: impl Into<String>) {
            self.state().insert_error = Some(message.into());
        }

        /// Makes `commit` fail with `message`.
        pub fn fail_commit(&self, message: impl Into<String>) {
            self.state().commit_error = Some(message.into());
        }

        /// Committed leads, in commit order.
        pub fn committed(&self) -> Vec<StoredLead> {
            self.state().committed.clone()
        }

        /// Number of transactions opened.
        pub fn begin_count(&self) -> usize {
            self.state().begins
        }

        /// Number of insert attempts.
        pub fn insert_count(&self) -> usize {
            self.state().inserts
        }

        /// Number of successful commits.
        pub fn commit_count(&self) -> usize {
            self.state().commits
        }

        /// Number of rollbacks.
        pub fn rollback_count(&self) -> usize {
            self.state().rollbacks
        }

        /// Correlation ids held by open transactions.
        pub fn reserved_count(&self) -> usize {
            self.state().reserved.len()
        }
    }

    impl LeadStorage for MockLeadStorage {
        fn begin(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Box<dyn LeadTransaction>>> + Send + '_>> {
            Box::pin(async move {
                let mut state = self.state();
                if let Some(message) = &state.begin_error {
                    return Err(CoreError::Database(message.clone()));
                }
                state.begins += 1;

                Ok(Box::new(MockTransaction {
                    state: self.state.clone(),
                    pending: Vec::new(),
                    closed: false,
                }) as Box<dyn LeadTransaction>)
            })
        }

        fn find_by_correlation_id(
            &self,
            correlation_id: CorrelationId,
        ) -> Pin<Box<dyn Future<Output = Result<Option<StoredLead>>> + Send + '_>> {
            Box::pin(async move {
                Ok(self
                    .state()
                    .committed
                    .iter()
                    .find(|lead| lead.record.correlation_id == correlation_id)
                    .cloned())
            })
        }

        fn count_for_tenant(
            &self,
            tenant_id: TenantId,
        ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + '_>> {
            Box::pin(async move {
                let count = self
                    .state()
                    .committed
                    .iter()
                    .filter(|l| l.record.tenant_id == tenant_id)
                    .count();
                Ok(i64::try_from(count).unwrap_or(i64::MAX))
            })
        }

        fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                match &self.state().begin_error {
                    Some(message) => Err(CoreError::Database(message.clone())),
                    None => Ok(()),
                }
            })
        }
    }

    struct MockTransaction {
        state: Arc<Mutex<State>>,
        pending: Vec<StoredLead>,
        closed: bool,
    }

    impl MockTransaction {
        fn release(&mut self, state: &mut State) {
            for lead in &self.pending {
                state.reserved.remove(&lead.record.correlation_id);
            }
            self.closed = true;
        }
    }

    impl LeadTransaction for MockTransaction {
        fn insert<'a>(
            &'a mut self,
            record: &'a LeadRecord,
        ) -> Pin<Box<dyn Future<Output = Result<LeadId>> + Send + 'a>> {
            Box::pin(async move {
                let mut state = lock(&self.state);
                state.inserts += 1;

                if let Some(message) = &state.insert_error {
                    return Err(CoreError::Database(message.clone()));
                }

                let correlation_id = record.correlation_id;
                let taken = state.reserved.contains(&correlation_id)
                    || state.committed.iter().any(|l| l.record.correlation_id == correlation_id);
                if taken {
                    return Err(CoreError::Conflict(format!(
                        "duplicate key value violates unique constraint \
                         \"leads_correlation_id_key\": {}",
                        record.correlation_id
                    )));
                }

                state.next_id += 1;
                let id = LeadId(state.next_id);
                state.reserved.insert(record.correlation_id);
                self.pending.push(StoredLead {
                    id,
                    record: record.clone(),
                    created_at: Utc::now(),
                });

                Ok(id)
            })
        }

        fn commit(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
            Box::pin(async move {
                let shared = self.state.clone();
                let mut state = lock(&shared);
                self.release(&mut state);

                if let Some(message) = &state.commit_error {
                    return Err(CoreError::Database(message.clone()));
                }

                state.committed.append(&mut self.pending);
                state.commits += 1;
                Ok(())
            })
        }

        fn rollback(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
            Box::pin(async move {
                let shared = self.state.clone();
                let mut state = lock(&shared);
                self.release(&mut state);
                state.rollbacks += 1;
                Ok(())
            })
        }
    }

    impl Drop for MockTransaction {
        fn drop(&mut self) {
            if !self.closed {
                let shared = self.state.clone();
                let mut state = lock(&shared);
                self.release(&mut state);
            }
        }
    }

    fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
        state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
