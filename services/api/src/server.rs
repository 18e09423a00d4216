use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use catalog_review::config::AppConfig;
use catalog_review::error::AppError;
use catalog_review::listings::{CatalogReviewService, PageLimits, ReviewSettings};
use catalog_review::telemetry;

use crate::cli::ServeArgs;
use crate::infra::{demo_listings, AppState, InMemoryListingStore, SequentialCatalogFactory};
use crate::routes::with_catalog_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryListingStore::default());
    if args.seed {
        let inserted = store.seed(demo_listings()).await;
        info!(inserted, "seeded sample listings");
    }

    let factory = Arc::new(SequentialCatalogFactory::default());
    let settings = ReviewSettings {
        page_limits: PageLimits {
            default_page_size: config.review.default_page_size,
            max_page_size: config.review.max_page_size,
        },
        migration_timeout: config.review.migration_timeout,
    };
    let service = Arc::new(CatalogReviewService::new(store, factory, settings));

    let app = with_catalog_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "catalog review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
