use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::listings::canonical::CanonicalListing;
use crate::listings::domain::{
    CatalogRecordId, LegacyPayload, LegacySourceId, ListingId, ListingRecord, ReviewStatus,
};
use crate::listings::migration::{CatalogFactory, FactoryError};
use crate::listings::query::PageLimits;
use crate::listings::repository::{
    queue_order, CatalogAggregates, ListingFilter, ListingStore, Page, PageRequest,
    RecordMutation, StoreError,
};
use crate::listings::service::{CatalogReviewService, ReviewSettings};
use crate::listings::status;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn payload_of(value: Value) -> LegacyPayload {
    serde_json::from_value(value).expect("payload deserializes")
}

pub(super) fn wpl_payload() -> LegacyPayload {
    payload_of(json!({
        "field_313": "Apartamento com varanda no Centro",
        "field_308": "<p>Dois dormitórios com sol da manhã.</p>",
        "field_42": "Rua Dona Laurinda, 180",
        "location2_name": "São Paulo",
        "location3_name": "Guararema",
        "location4_name": "Centro",
        "mls_id": "GM2154",
        "listing": 9,
        "property_type": 6,
        "price": 385000,
        "bedrooms": 2,
        "bathrooms": 1,
        "living_area": 74.5,
        "pic_numb": 8
    }))
}

/// Pending record aged by `minutes_old` so ordering tests get distinct
/// creation times.
pub(super) fn imported_record(id: &str, minutes_old: i64) -> ListingRecord {
    let created_at = base_time() - Duration::minutes(minutes_old);
    ListingRecord::imported(
        ListingId(id.to_string()),
        LegacySourceId(4000 + minutes_old),
        wpl_payload(),
        vec![format!("https://legacy.example.com/img/{id}-1.jpg")],
        1,
        created_at,
    )
}

pub(super) fn record_in(status: ReviewStatus) -> ListingRecord {
    let mut record = imported_record("lst-0001", 0);
    record.status = status;
    if status == ReviewStatus::Migrated {
        record.catalog_id = Some(CatalogRecordId("cat-seeded".to_string()));
        record.migrated_at = Some(record.created_at);
    }
    record
}

pub(super) fn quick_settings() -> ReviewSettings {
    ReviewSettings {
        page_limits: PageLimits {
            default_page_size: 30,
            max_page_size: 100,
        },
        migration_timeout: StdDuration::from_secs(5),
    }
}

pub(super) fn build_service(
    records: Vec<ListingRecord>,
) -> (
    CatalogReviewService<MemoryStore, FixedFactory>,
    Arc<MemoryStore>,
    Arc<FixedFactory>,
) {
    let store = Arc::new(MemoryStore::with_records(records));
    let factory = Arc::new(FixedFactory::new("cat-42"));
    let service = CatalogReviewService::new(store.clone(), factory.clone(), quick_settings());
    (service, store, factory)
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: RwLock<HashMap<ListingId, ListingRecord>>,
}

impl MemoryStore {
    pub(super) fn with_records(records: impl IntoIterator<Item = ListingRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub(super) async fn snapshot(&self, id: &ListingId) -> ListingRecord {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .expect("record present")
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn insert(&self, record: ListingRecord) -> Result<ListingRecord, StoreError> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, StoreError> {
        let guard = self.records.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn update(
        &self,
        id: &ListingId,
        mutation: RecordMutation,
    ) -> Result<ListingRecord, StoreError> {
        let mut guard = self.records.write().await;
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        let mut candidate = record.clone();
        mutation(&mut candidate)?;
        *record = candidate.clone();
        Ok(candidate)
    }

    async fn search(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<Page<ListingRecord>, StoreError> {
        let guard = self.records.read().await;
        let mut matches: Vec<ListingRecord> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matches.sort_by(queue_order);

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn aggregate(&self) -> Result<CatalogAggregates, StoreError> {
        let guard = self.records.read().await;
        let mut aggregates = CatalogAggregates::default();
        for record in guard.values() {
            aggregates.statuses.tally(record.status);
            if record.photo_count == 0 {
                aggregates.without_photos += 1;
            } else {
                aggregates.with_photos += 1;
            }
        }
        Ok(aggregates)
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl ListingStore for UnavailableStore {
    async fn insert(&self, _record: ListingRecord) -> Result<ListingRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn get(&self, _id: &ListingId) -> Result<Option<ListingRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update(
        &self,
        _id: &ListingId,
        _mutation: RecordMutation,
    ) -> Result<ListingRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn search(
        &self,
        _filter: &ListingFilter,
        _page: PageRequest,
    ) -> Result<Page<ListingRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn aggregate(&self) -> Result<CatalogAggregates, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Always succeeds with the same catalog id and counts invocations so tests
/// can assert the factory was or was not reached.
pub(super) struct FixedFactory {
    id: String,
    calls: AtomicUsize,
}

impl FixedFactory {
    pub(super) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogFactory for FixedFactory {
    async fn create(&self, _listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CatalogRecordId(self.id.clone()))
    }
}

pub(super) struct FailingFactory {
    pub(super) error: FactoryError,
}

#[async_trait]
impl CatalogFactory for FailingFactory {
    async fn create(&self, _listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError> {
        Err(self.error.clone())
    }
}

/// Takes longer than any test timeout so the engine's deadline fires first.
pub(super) struct SlowFactory {
    pub(super) delay: StdDuration,
}

#[async_trait]
impl CatalogFactory for SlowFactory {
    async fn create(&self, _listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError> {
        tokio::time::sleep(self.delay).await;
        Ok(CatalogRecordId("cat-late".to_string()))
    }
}

/// Rejects the listing through the store while the engine is waiting on the
/// factory, simulating a reviewer racing the migration.
pub(super) struct RacingRejectFactory {
    pub(super) store: Arc<MemoryStore>,
    pub(super) target: ListingId,
}

#[async_trait]
impl CatalogFactory for RacingRejectFactory {
    async fn create(&self, _listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError> {
        let now = Utc::now();
        self.store
            .update(
                &self.target,
                Box::new(move |record| {
                    status::apply_transition(
                        record,
                        ReviewStatus::Rejected,
                        Some("rejected while migrating".to_string()),
                        now,
                    )
                }),
            )
            .await
            .expect("racing reject applies");
        Ok(CatalogRecordId("cat-race".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
