//! Review and migration engine for listings imported from the retired WPL
//! site.
//!
//! A record enters as `pending`, moves through the review state machine in
//! [`status`], and leaves either archived or promoted into the target catalog
//! by the [`migration`] engine. All mutation funnels through the store's
//! atomic update contract so the migration bookkeeping invariant (catalog id
//! present iff `migrated`) holds at every observable point.

pub mod canonical;
pub mod domain;
pub mod migration;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use canonical::{CanonicalAddress, CanonicalListing};
pub use domain::{
    CatalogRecordId, LegacyPayload, LegacySourceId, ListingId, ListingPurpose, ListingRecord,
    ListingSummary, PropertyKind, ReviewStatus,
};
pub use migration::{
    CatalogFactory, FactoryError, MigrationEngine, MigrationError, MigrationFailure,
};
pub use query::{CatalogStats, ListingQueries, PageLimits, ValidationError};
pub use repository::{
    queue_order, CatalogAggregates, ListingFilter, ListingStore, Page, PageRequest,
    RecordMutation, StatusCounts, StoreError,
};
pub use router::catalog_router;
pub use service::{CatalogReviewService, CatalogServiceError, ReviewSettings};
pub use status::{apply_transition, ReviewRuleError};
