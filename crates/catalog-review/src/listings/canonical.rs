use serde::{Deserialize, Serialize};

use super::domain::{LegacySourceId, ListingPurpose, ListingRecord, PropertyKind};

/// Longest title the target catalog accepts.
const TITLE_MAX_CHARS: usize = 200;
/// Slug cap enforced by the target catalog's document schema.
const SLUG_MAX_CHARS: usize = 96;

/// Address subset carried into the canonical record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAddress {
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Normalized listing shape the target catalog's `create` contract accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    pub title: String,
    pub slug: String,
    pub purpose: ListingPurpose,
    pub kind: PropertyKind,
    pub description: Option<String>,
    pub price: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub usable_area: Option<f64>,
    pub total_area: Option<f64>,
    pub address: CanonicalAddress,
    pub photo_urls: Vec<String>,
    pub reference_code: Option<String>,
    pub legacy_id: LegacySourceId,
}

impl CanonicalListing {
    /// Projects a raw record into the canonical shape. Infallible: legacy
    /// payloads are too inconsistent to reject here, so missing numerics fall
    /// back to zero and a missing title is synthesized from kind and place.
    pub fn from_record(record: &ListingRecord) -> Self {
        let payload = &record.payload;
        let kind = payload.kind();

        let title = match payload.title() {
            Some(title) => clip_chars(title, TITLE_MAX_CHARS),
            None => fallback_title(kind, record),
        };

        let reference = payload
            .reference_code()
            .unwrap_or_else(|| record.legacy_id.0.to_string());
        let slug = slugify(&format!("{title}-{reference}"));

        Self {
            title,
            slug,
            purpose: payload.purpose(),
            kind,
            description: payload.description().map(str::to_string),
            price: payload.price().unwrap_or(0.0),
            bedrooms: payload.bedrooms().unwrap_or(0),
            bathrooms: payload.bathrooms().unwrap_or(0),
            usable_area: payload.living_area(),
            total_area: payload.lot_area().or_else(|| payload.living_area()),
            address: CanonicalAddress {
                street: payload.street().map(str::to_string),
                neighborhood: payload.neighborhood().map(str::to_string),
                city: payload.city().map(str::to_string),
                state: payload.state().map(str::to_string),
            },
            photo_urls: record.photo_urls.clone(),
            reference_code: payload.reference_code(),
            legacy_id: record.legacy_id,
        }
    }
}

fn fallback_title(kind: PropertyKind, record: &ListingRecord) -> String {
    let place = record
        .payload
        .neighborhood()
        .or_else(|| record.payload.city());

    match place {
        Some(place) => format!("{} in {place}", kind.display_name()),
        None => format!("{} #{}", kind.display_name(), record.legacy_id.0),
    }
}

fn clip_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// URL-safe slug: lowercased, Latin diacritics folded to ASCII, and every
/// run of other characters collapsed to a single dash.
pub(crate) fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.to_lowercase().chars() {
        let folded = fold_ascii(c);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    // Slug is pure ASCII at this point, so byte truncation is char safe. The
    // cut can land right after a separator; drop any dash it leaves behind.
    slug.truncate(SLUG_MAX_CHARS);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn fold_ascii(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
