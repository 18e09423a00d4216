use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use catalog_review::listings::{
    queue_order, CanonicalListing, CatalogAggregates, CatalogFactory, CatalogRecordId,
    FactoryError, LegacyPayload, LegacySourceId, ListingFilter, ListingId, ListingRecord,
    ListingStore, Page, PageRequest, RecordMutation, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local listing store. The production deployment points the engine
/// at the imported-listings database; this stand-in keeps the same atomic
/// update contract so the service behaves identically under test and demo.
#[derive(Default)]
pub(crate) struct InMemoryListingStore {
    records: RwLock<HashMap<ListingId, ListingRecord>>,
}

impl InMemoryListingStore {
    pub(crate) async fn seed(&self, records: Vec<ListingRecord>) -> usize {
        let mut inserted = 0;
        for record in records {
            if self.insert(record).await.is_ok() {
                inserted += 1;
            }
        }
        inserted
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn insert(&self, record: ListingRecord) -> Result<ListingRecord, StoreError> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(
        &self,
        id: &ListingId,
        mutation: RecordMutation,
    ) -> Result<ListingRecord, StoreError> {
        let mut guard = self.records.write().await;
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        // Mutate a copy so a rejected mutation leaves the stored value intact.
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

/// In-process stand-in for the target catalog: accepts every canonical
/// listing and hands out sequential ids keyed by the legacy source id, so
/// retries of the same listing stay recognizable in demo output.
#[derive(Default)]
pub(crate) struct SequentialCatalogFactory {
    counter: AtomicUsize,
}

#[async_trait]
impl CatalogFactory for SequentialCatalogFactory {
    async fn create(&self, listing: CanonicalListing) -> Result<CatalogRecordId, FactoryError> {
        let serial = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(slug = %listing.slug, serial, "canonical record created");
        Ok(CatalogRecordId(format!(
            "cat-{:04}-{}",
            serial, listing.legacy_id.0
        )))
    }
}

fn fixture_time(days_old: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 20, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        - Duration::days(days_old)
}

fn fixture(id: &str, legacy_id: i64, days_old: i64, photos: usize, payload: Value) -> ListingRecord {
    let payload: LegacyPayload =
        serde_json::from_value(payload).unwrap_or_else(|_| LegacyPayload::default());
    let photo_urls = (1..=photos)
        .map(|n| format!("https://legacy.example.com/wpl/{legacy_id}/{n:02}.jpg"))
        .collect();

    ListingRecord::imported(
        ListingId(id.to_string()),
        LegacySourceId(legacy_id),
        payload,
        photo_urls,
        photos as u32,
        fixture_time(days_old),
    )
}

/// WPL-shaped sample listings for `serve --seed` and the CLI demo.
pub(crate) fn demo_listings() -> Vec<ListingRecord> {
    vec![
        fixture(
            "lst-0001",
            2154,
            1,
            8,
            json!({
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
            }),
        ),
        fixture(
            "lst-0002",
            2201,
            3,
            12,
            json!({
                "field_313": "Casa com quintal no Bairro Itapema",
                "field_308": "<p>Três dormitórios, área gourmet e pomar.</p>",
                "field_42": "Estrada do Itapema, 455",
                "location2_name": "São Paulo",
                "location3_name": "Guararema",
                "location4_name": "Itapema",
                "mls_id": "GM2201",
                "listing": 9,
                "property_type": 7,
                "price": "520000",
                "bedrooms": 3,
                "bathrooms": 2,
                "living_area": 140,
                "lot_area": 300,
                "pic_numb": 14
            }),
        ),
        fixture(
            "lst-0003",
            2230,
            5,
            0,
            json!({
                "field_312": "Sala comercial na Rua 23 de Maio",
                "field_42": "Rua 23 de Maio, 902",
                "location2_name": "São Paulo",
                "location3_name": "Guararema",
                "location4_name": "Nogueira",
                "mls_id": 2230,
                "listing": 10,
                "property_type": 13,
                "price": "1800",
                "bathrooms": 1,
                "living_area": "42"
            }),
        ),
        fixture(
            "lst-0004",
            2244,
            8,
            5,
            json!({
                "field_308": "<p>Chácara com nascente, sem benfeitorias.</p>",
                "location2_name": "São Paulo",
                "location3_name": "Santa Isabel",
                "listing": 9,
                "property_type": 1,
                "price": 950000,
                "lot_area": 20000,
                "pic_numb": 5
            }),
        ),
    ]
}
