use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ListingId, ReviewStatus};
use super::migration::CatalogFactory;
use super::query::ValidationError;
use super::repository::{ListingFilter, ListingStore};
use super::service::{CatalogReviewService, CatalogServiceError};
use super::status::ReviewRuleError;

/// Router builder exposing the review queue over HTTP.
pub fn catalog_router<S, F>(service: Arc<CatalogReviewService<S, F>>) -> Router
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    Router::new()
        .route("/api/v1/catalog/listings", get(list_handler::<S, F>))
        .route(
            "/api/v1/catalog/listings/:listing_id",
            get(get_handler::<S, F>),
        )
        .route(
            "/api/v1/catalog/listings/:listing_id/status",
            post(set_status_handler::<S, F>),
        )
        .route(
            "/api/v1/catalog/listings/:listing_id/migrate",
            post(migrate_handler::<S, F>),
        )
        .route("/api/v1/catalog/stats", get(stats_handler::<S, F>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) status: Option<String>,
    pub(crate) q: Option<String>,
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

/// `status=all` and an absent status both mean "no status filter", matching
/// the dashboard's tab bar.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<ReviewStatus>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => match ReviewStatus::parse(value) {
            Some(status) => Ok(Some(status)),
            None => Err(ValidationError::UnknownStatus {
                value: value.to_string(),
            }),
        },
    }
}

pub(crate) async fn list_handler<S, F>(
    State(service): State<Arc<CatalogReviewService<S, F>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    let status = match parse_status_filter(query.status.as_deref()) {
        Ok(status) => status,
        Err(error) => return CatalogServiceError::Validation(error).into_response(),
    };

    let filter = ListingFilter {
        status,
        text: query.q,
    };

    match service.list(&filter, query.page, query.page_size).await {
        Ok(page) => {
            let cards = page.map(|record| record.summary());
            (StatusCode::OK, axum::Json(cards)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<S, F>(
    State(service): State<Arc<CatalogReviewService<S, F>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    match service.get(&ListingId(listing_id)).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChangeRequest {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

pub(crate) async fn set_status_handler<S, F>(
    State(service): State<Arc<CatalogReviewService<S, F>>>,
    Path(listing_id): Path<String>,
    axum::Json(body): axum::Json<StatusChangeRequest>,
) -> Response
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    let target = match ReviewStatus::parse(&body.status) {
        Some(status) => status,
        None => {
            return CatalogServiceError::Validation(ValidationError::UnknownStatus {
                value: body.status,
            })
            .into_response()
        }
    };

    match service
        .set_status(&ListingId(listing_id), target, body.notes)
        .await
    {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn migrate_handler<S, F>(
    State(service): State<Arc<CatalogReviewService<S, F>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    match service.migrate(&ListingId(listing_id)).await {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn stats_handler<S, F>(
    State(service): State<Arc<CatalogReviewService<S, F>>>,
) -> Response
where
    S: ListingStore + 'static,
    F: CatalogFactory + 'static,
{
    match service.stats().await {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error.into_response(),
    }
}

impl IntoResponse for CatalogServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogServiceError::NotFound => StatusCode::NOT_FOUND,
            CatalogServiceError::Review(ReviewRuleError::MigrationNotDirect) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CatalogServiceError::Review(_) => StatusCode::CONFLICT,
            CatalogServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogServiceError::MigrationFailed(_) => StatusCode::BAD_GATEWAY,
            CatalogServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = axum::Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
