use std::sync::Arc;

use serde::Serialize;

use super::domain::{ListingId, ListingRecord};
use super::repository::{
    CatalogAggregates, ListingFilter, ListingStore, Page, PageRequest, StatusCounts, StoreError,
};

/// Pagination bounds carried from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 30,
            max_page_size: 100,
        }
    }
}

/// Malformed caller input on the read side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("page numbers start at 1")]
    PageOutOfRange,
    #[error("page_size must be at least 1")]
    EmptyPage,
    #[error("unknown review status '{value}'")]
    UnknownStatus { value: String },
}

/// Read side of the engine: validated search plus dashboard stats.
pub struct ListingQueries<S> {
    store: Arc<S>,
    limits: PageLimits,
}

impl<S> ListingQueries<S>
where
    S: ListingStore + 'static,
{
    pub fn new(store: Arc<S>, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// Validates caller pagination. Missing values fall back to the defaults;
    /// oversized page sizes are clamped rather than rejected so dashboards
    /// keep working when the configured maximum shrinks.
    pub fn page_request(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<PageRequest, ValidationError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ValidationError::PageOutOfRange);
        }

        let page_size = page_size.unwrap_or(self.limits.default_page_size);
        if page_size == 0 {
            return Err(ValidationError::EmptyPage);
        }

        Ok(PageRequest {
            page,
            page_size: page_size.min(self.limits.max_page_size),
        })
    }

    pub async fn search(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<Page<ListingRecord>, StoreError> {
        tracing::debug!(
            status = filter.status.map(|status| status.label()),
            text = filter.text.as_deref(),
            page = page.page,
            page_size = page.page_size,
            "searching review queue"
        );
        self.store.search(filter, page).await
    }

    pub async fn get_by_id(&self, id: &ListingId) -> Result<ListingRecord, StoreError> {
        self.store.get(id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn stats(&self) -> Result<CatalogStats, StoreError> {
        let aggregates = self.store.aggregate().await?;
        Ok(CatalogStats::from_aggregates(aggregates))
    }
}

/// Stats payload for the dashboard. `ready_to_migrate` mirrors the approved
/// count so the migration tab can show its badge without a second query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: u64,
    pub by_status: StatusCounts,
    pub with_photos: u64,
    pub without_photos: u64,
    pub ready_to_migrate: u64,
}

impl CatalogStats {
    pub fn from_aggregates(aggregates: CatalogAggregates) -> Self {
        Self {
            total: aggregates.statuses.total(),
            by_status: aggregates.statuses,
            with_photos: aggregates.with_photos,
            without_photos: aggregates.without_photos,
            ready_to_migrate: aggregates.statuses.approved,
        }
    }
}
