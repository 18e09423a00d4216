use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::domain::{ListingId, ListingRecord, ReviewStatus};
use super::migration::{CatalogFactory, MigrationEngine, MigrationError, MigrationFailure};
use super::query::{CatalogStats, ListingQueries, PageLimits, ValidationError};
use super::repository::{ListingFilter, ListingStore, Page, StoreError};
use super::status::{self, ReviewRuleError};

/// Review workflow knobs carried from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReviewSettings {
    pub page_limits: PageLimits,
    pub migration_timeout: Duration,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            page_limits: PageLimits::default(),
            migration_timeout: Duration::from_secs(30),
        }
    }
}

/// Facade composing the query layer, the state machine, and the migration
/// engine. Callers (HTTP routes, CLI, batch scripts) only ever talk to this
/// type; it translates collaborator errors into one taxonomy and contains no
/// status logic of its own.
pub struct CatalogReviewService<S, F> {
    store: Arc<S>,
    queries: ListingQueries<S>,
    migrator: MigrationEngine<S, F>,
}

impl<S, F> CatalogReviewService<S, F>
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    pub fn new(store: Arc<S>, factory: Arc<F>, settings: ReviewSettings) -> Self {
        let queries = ListingQueries::new(store.clone(), settings.page_limits);
        let migrator = MigrationEngine::new(store.clone(), factory, settings.migration_timeout);

        Self {
            store,
            queries,
            migrator,
        }
    }

    /// Paginated search over the review queue.
    pub async fn list(
        &self,
        filter: &ListingFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<ListingRecord>, CatalogServiceError> {
        let request = self.queries.page_request(page, page_size)?;
        self.queries
            .search(filter, request)
            .await
            .map_err(store_failure)
    }

    pub async fn get(&self, id: &ListingId) -> Result<ListingRecord, CatalogServiceError> {
        self.queries.get_by_id(id).await.map_err(store_failure)
    }

    /// Reviewer-driven status change, applied atomically through the store.
    pub async fn set_status(
        &self,
        id: &ListingId,
        target: ReviewStatus,
        notes: Option<String>,
    ) -> Result<ListingRecord, CatalogServiceError> {
        let now = Utc::now();
        let updated = self
            .store
            .update(
                id,
                Box::new(move |record| status::apply_transition(record, target, notes, now)),
            )
            .await
            .map_err(store_failure)?;

        tracing::info!(listing = %updated.id.0, status = %updated.status, "review status updated");
        Ok(updated)
    }

    /// Promotes an approved listing into the target catalog.
    pub async fn migrate(&self, id: &ListingId) -> Result<ListingRecord, CatalogServiceError> {
        Ok(self.migrator.migrate(id).await?)
    }

    pub async fn stats(&self) -> Result<CatalogStats, CatalogServiceError> {
        self.queries.stats().await.map_err(store_failure)
    }
}

/// Boundary error taxonomy exposed to every caller of the facade.
#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Review(#[from] ReviewRuleError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("migration failed: {0}")]
    MigrationFailed(#[source] MigrationFailure),
    #[error("catalog store unavailable: {0}")]
    Store(String),
}

impl From<MigrationError> for CatalogServiceError {
    fn from(value: MigrationError) -> Self {
        match value {
            MigrationError::NotFound => Self::NotFound,
            MigrationError::Rule(rule) => Self::Review(rule),
            MigrationError::Failed(cause) => Self::MigrationFailed(cause),
            MigrationError::Store(message) => Self::Store(message),
        }
    }
}

fn store_failure(error: StoreError) -> CatalogServiceError {
    match error {
        StoreError::NotFound => CatalogServiceError::NotFound,
        StoreError::Rejected(rule) => CatalogServiceError::Review(rule),
        other => CatalogServiceError::Store(other.to_string()),
    }
}
