use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for imported listings, assigned at import time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Row id carried over from the retired WPL database. Not guaranteed unique
/// across re-imports, hence the engine's own [`ListingId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacySourceId(pub i64);

/// Identifier handed back by the target catalog once a listing is promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecordId(pub String);

/// Review lifecycle of an imported listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Reviewing,
    Approved,
    Migrated,
    Rejected,
    Archived,
}

impl ReviewStatus {
    /// All statuses in dashboard display order.
    pub const fn ordered() -> [ReviewStatus; 6] {
        [
            ReviewStatus::Pending,
            ReviewStatus::Reviewing,
            ReviewStatus::Approved,
            ReviewStatus::Migrated,
            ReviewStatus::Rejected,
            ReviewStatus::Archived,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Migrated => "migrated",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<ReviewStatus> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ReviewStatus::Pending),
            "reviewing" => Some(ReviewStatus::Reviewing),
            "approved" => Some(ReviewStatus::Approved),
            "migrated" => Some(ReviewStatus::Migrated),
            "rejected" => Some(ReviewStatus::Rejected),
            "archived" => Some(ReviewStatus::Archived),
            _ => None,
        }
    }

    /// Terminal statuses have no outgoing transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, ReviewStatus::Migrated | ReviewStatus::Archived)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ad purpose derived from the WPL `listing` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingPurpose {
    Sale,
    Rent,
}

impl ListingPurpose {
    pub const fn label(self) -> &'static str {
        match self {
            ListingPurpose::Sale => "sale",
            ListingPurpose::Rent => "rent",
        }
    }
}

/// Property kind folded down from the WPL `property_type` code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    House,
    Commercial,
    Other,
}

impl PropertyKind {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyKind::Apartment => "apartment",
            PropertyKind::House => "house",
            PropertyKind::Commercial => "commercial",
            PropertyKind::Other => "other",
        }
    }

    /// Human form used when composing fallback titles.
    pub const fn display_name(self) -> &'static str {
        match self {
            PropertyKind::Apartment => "Apartment",
            PropertyKind::House => "House",
            PropertyKind::Commercial => "Commercial unit",
            PropertyKind::Other => "Property",
        }
    }
}

/// Loosely typed field bag captured verbatim from the WPL export.
///
/// The engine reads a small set of well-known columns for search, summaries,
/// and migration; everything else passes through untouched. Old exports
/// frequently store numeric columns as strings, so the numeric accessors
/// accept both representations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyPayload(Map<String, Value>);

impl LegacyPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(value)) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(value) => value.as_f64(),
            Value::String(value) => value.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn code(&self, key: &str) -> Option<i64> {
        self.number(key).map(|value| value as i64)
    }

    /// Listing title; WPL keeps the ad headline in `field_313` with
    /// `field_312` as an older fallback column.
    pub fn title(&self) -> Option<&str> {
        self.text("field_313").or_else(|| self.text("field_312"))
    }

    pub fn description(&self) -> Option<&str> {
        self.text("field_308")
    }

    pub fn street(&self) -> Option<&str> {
        self.text("field_42")
    }

    pub fn state(&self) -> Option<&str> {
        self.text("location2_name")
    }

    pub fn city(&self) -> Option<&str> {
        self.text("location3_name")
    }

    pub fn neighborhood(&self) -> Option<&str> {
        self.text("location4_name")
    }

    /// Broker reference code; numeric in some exports, text in others.
    pub fn reference_code(&self) -> Option<String> {
        match self.0.get("mls_id") {
            Some(Value::String(value)) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Some(Value::Number(value)) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.number("price")
    }

    pub fn bedrooms(&self) -> Option<u32> {
        self.number("bedrooms").map(|value| value.max(0.0) as u32)
    }

    pub fn bathrooms(&self) -> Option<u32> {
        self.number("bathrooms").map(|value| value.max(0.0) as u32)
    }

    pub fn living_area(&self) -> Option<f64> {
        self.number("living_area").filter(|value| *value > 0.0)
    }

    pub fn lot_area(&self) -> Option<f64> {
        self.number("lot_area").filter(|value| *value > 0.0)
    }

    /// WPL stores the ad purpose as a numeric code; 10 marks a rental.
    pub fn purpose(&self) -> ListingPurpose {
        match self.code("listing") {
            Some(10) => ListingPurpose::Rent,
            _ => ListingPurpose::Sale,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self.code("property_type") {
            Some(3) | Some(6) => PropertyKind::Apartment,
            Some(7) => PropertyKind::House,
            Some(10) | Some(13) | Some(18) => PropertyKind::Commercial,
            _ => PropertyKind::Other,
        }
    }
}

/// One imported legacy property with its review metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: ListingId,
    pub legacy_id: LegacySourceId,
    pub payload: LegacyPayload,
    pub photo_urls: Vec<String>,
    /// Photo count as reported by the legacy export; may disagree with
    /// `photo_urls.len()` and must not be trusted over it.
    pub photo_count: u32,
    pub status: ReviewStatus,
    pub notes: Option<String>,
    pub catalog_id: Option<CatalogRecordId>,
    pub migrated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRecord {
    /// Entry condition for records arriving from the import step.
    pub fn imported(
        id: ListingId,
        legacy_id: LegacySourceId,
        payload: LegacyPayload,
        photo_urls: Vec<String>,
        photo_count: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            legacy_id,
            payload,
            photo_urls,
            photo_count,
            status: ReviewStatus::Pending,
            notes: None,
            catalog_id: None,
            migrated_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.photo_urls.first().map(String::as_str)
    }

    /// Holds exactly when the migration bookkeeping is intact: a listing
    /// carries a catalog id and a migration timestamp iff it is `migrated`.
    pub fn migration_state_consistent(&self) -> bool {
        let migrated = self.status == ReviewStatus::Migrated;
        migrated == self.catalog_id.is_some() && migrated == self.migrated_at.is_some()
    }

    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            id: self.id.clone(),
            legacy_id: self.legacy_id,
            title: self.payload.title().map(str::to_string),
            status: self.status.label(),
            purpose: self.payload.purpose().label(),
            kind: self.payload.kind().label(),
            price: self.payload.price(),
            bedrooms: self.payload.bedrooms(),
            bathrooms: self.payload.bathrooms(),
            living_area: self.payload.living_area(),
            city: self.payload.city().map(str::to_string),
            neighborhood: self.payload.neighborhood().map(str::to_string),
            thumbnail_url: self.thumbnail_url().map(str::to_string),
            photo_count: self.photo_urls.len() as u32,
            catalog_id: self.catalog_id.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Dashboard card projection of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub legacy_id: LegacySourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: &'static str,
    pub purpose: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub living_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Count of photo URLs actually carried on the record. The stored legacy
    /// count feeds only the stats tallies.
    pub photo_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<CatalogRecordId>,
    pub updated_at: DateTime<Utc>,
}
