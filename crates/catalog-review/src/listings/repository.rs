use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::{ListingId, ListingRecord, ReviewStatus};
use super::status::ReviewRuleError;

/// Search filter for the review queue. `status: None` matches every status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub status: Option<ReviewStatus>,
    pub text: Option<String>,
}

impl ListingFilter {
    pub fn with_status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            text: None,
        }
    }

    /// Case-insensitive match against the fields the engine is allowed to
    /// read: title, street line, neighborhood, and city.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        let needle = match self.text.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(text) => text.to_lowercase(),
        };

        [
            record.payload.title(),
            record.payload.street(),
            record.payload.neighborhood(),
            record.payload.city(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Review queue order: newest imports first, ties broken by id ascending so
/// pagination stays stable across requests.
pub fn queue_order(a: &ListingRecord, b: &ListingRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// One-based page selector. The query layer validates and clamps values
/// before a store ever sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

/// One page of results plus enough metadata to render a pager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size)) as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
        }
    }
}

/// Per-status tallies with all six keys always present, zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub reviewing: u64,
    pub approved: u64,
    pub migrated: u64,
    pub rejected: u64,
    pub archived: u64,
}

impl StatusCounts {
    pub fn tally(&mut self, status: ReviewStatus) {
        *self.slot_mut(status) += 1;
    }

    fn slot_mut(&mut self, status: ReviewStatus) -> &mut u64 {
        match status {
            ReviewStatus::Pending => &mut self.pending,
            ReviewStatus::Reviewing => &mut self.reviewing,
            ReviewStatus::Approved => &mut self.approved,
            ReviewStatus::Migrated => &mut self.migrated,
            ReviewStatus::Rejected => &mut self.rejected,
            ReviewStatus::Archived => &mut self.archived,
        }
    }

    pub const fn get(self, status: ReviewStatus) -> u64 {
        match status {
            ReviewStatus::Pending => self.pending,
            ReviewStatus::Reviewing => self.reviewing,
            ReviewStatus::Approved => self.approved,
            ReviewStatus::Migrated => self.migrated,
            ReviewStatus::Rejected => self.rejected,
            ReviewStatus::Archived => self.archived,
        }
    }

    pub fn total(self) -> u64 {
        self.pending + self.reviewing + self.approved + self.migrated + self.rejected + self.archived
    }
}

/// Single-pass aggregation result backing the dashboard stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogAggregates {
    pub statuses: StatusCounts,
    pub with_photos: u64,
    pub without_photos: u64,
}

/// Closure applied inside a store's atomic read-modify-write. Returning an
/// error aborts the write and leaves the stored record untouched.
pub type RecordMutation = Box<dyn FnOnce(&mut ListingRecord) -> Result<(), ReviewRuleError> + Send>;

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing not found")]
    NotFound,
    #[error("listing already exists")]
    Conflict,
    #[error(transparent)]
    Rejected(#[from] ReviewRuleError),
    #[error("listing store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over imported listings so the engine can be exercised
/// against in-memory fixtures as well as a real database.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(&self, record: ListingRecord) -> Result<ListingRecord, StoreError>;

    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, StoreError>;

    /// Atomic read-modify-write keyed by listing id. The store must apply the
    /// mutation against the current value under exclusion and persist only on
    /// `Ok`, so concurrent reviewers cannot interleave partial updates.
    async fn update(&self, id: &ListingId, mutation: RecordMutation)
        -> Result<ListingRecord, StoreError>;

    async fn search(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<Page<ListingRecord>, StoreError>;

    /// Counts per status plus photo tallies, computed in one pass so the
    /// numbers are mutually consistent. Photo tallies key off the imported
    /// `photo_count`, not the url list, matching the legacy dashboard.
    async fn aggregate(&self) -> Result<CatalogAggregates, StoreError>;
}
