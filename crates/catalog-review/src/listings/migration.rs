use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::canonical::CanonicalListing;
use super::domain::{CatalogRecordId, ListingId, ListingRecord, ReviewStatus};
use super::repository::{ListingStore, StoreError};
use super::status::{self, ReviewRuleError};

/// Failure surfaced by the target catalog when a canonical record cannot be
/// created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("target catalog rejected the listing: {0}")]
    Rejected(String),
    #[error("target catalog unavailable: {0}")]
    Unavailable(String),
}

/// Creation contract of the target catalog. The engine only needs "create a
/// canonical record, get back its id"; everything else about the catalog is
/// out of scope.
#[async_trait]
pub trait CatalogFactory: Send + Sync {
    async fn create(&self, listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError>;
}

/// Cause attached to a failed migration attempt. The source record stays
/// `approved` in every case, so retrying is always safe at this layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationFailure {
    #[error("target catalog call timed out after {waited:?}")]
    Timeout { waited: Duration },
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Rule(#[from] ReviewRuleError),
    #[error("migration failed: {0}")]
    Failed(#[from] MigrationFailure),
    #[error("listing store unavailable: {0}")]
    Store(String),
}

/// Drives the only path by which a listing becomes `migrated`.
///
/// The engine never marks a record migrated without a confirmed id from the
/// factory, and the final write re-checks the status so a concurrent reject
/// cannot be overwritten.
pub struct MigrationEngine<S, F> {
    store: Arc<S>,
    factory: Arc<F>,
    timeout: Duration,
}

impl<S, F> MigrationEngine<S, F>
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    pub fn new(store: Arc<S>, factory: Arc<F>, timeout: Duration) -> Self {
        Self {
            store,
            factory,
            timeout,
        }
    }

    pub async fn migrate(&self, id: &ListingId) -> Result<ListingRecord, MigrationError> {
        let record = self
            .store
            .get(id)
            .await
            .map_err(store_failure)?
            .ok_or(MigrationError::NotFound)?;

        match record.status {
            ReviewStatus::Approved => {}
            ReviewStatus::Migrated => return Err(ReviewRuleError::AlreadyMigrated.into()),
            status => return Err(ReviewRuleError::NotApproved { status }.into()),
        }

        let canonical = CanonicalListing::from_record(&record);
        tracing::info!(listing = %record.id.0, slug = %canonical.slug, "submitting listing to target catalog");

        let created = match tokio::time::timeout(self.timeout, self.factory.create(canonical)).await
        {
            Ok(Ok(catalog_id)) => catalog_id,
            Ok(Err(error)) => {
                tracing::warn!(listing = %record.id.0, %error, "target catalog refused the listing");
                return Err(MigrationFailure::Factory(error).into());
            }
            Err(_) => {
                tracing::warn!(listing = %record.id.0, waited = ?self.timeout, "target catalog call timed out");
                return Err(MigrationFailure::Timeout {
                    waited: self.timeout,
                }
                .into());
            }
        };

        let catalog_ref = created.0.clone();
        let now = Utc::now();
        let migrated = self
            .store
            .update(
                id,
                Box::new(move |record| status::apply_migration(record, created, now)),
            )
            .await
            .map_err(store_failure)?;

        tracing::info!(listing = %migrated.id.0, catalog = %catalog_ref, "listing migrated");
        Ok(migrated)
    }
}

fn store_failure(error: StoreError) -> MigrationError {
    match error {
        StoreError::NotFound => MigrationError::NotFound,
        StoreError::Rejected(rule) => MigrationError::Rule(rule),
        other => MigrationError::Store(other.to_string()),
    }
}
