use std::sync::Arc;

use clap::Args;

use catalog_review::error::AppError;
use catalog_review::listings::{
    CatalogReviewService, CatalogStats, ListingFilter, ListingId, ListingRecord, ReviewSettings,
    ReviewStatus,
};

use crate::infra::{demo_listings, InMemoryListingStore, SequentialCatalogFactory};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Filter the opening queue listing by free text (title, street, area)
    #[arg(long)]
    pub(crate) text: Option<String>,
    /// Stop after the review transitions, before any migration happens
    #[arg(long)]
    pub(crate) skip_migration: bool,
}

/// End-to-end walkthrough over the sample listings: inspect the queue, triage
/// a few records, then promote an approved one into the (in-process) target
/// catalog. Every step goes through the same facade the HTTP routes use.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryListingStore::default());
    store.seed(demo_listings()).await;
    let factory = Arc::new(SequentialCatalogFactory::default());
    let service = CatalogReviewService::new(store, factory, ReviewSettings::default());

    println!("Catalog review demo");
    render_stats(&service.stats().await?);

    let filter = ListingFilter {
        status: Some(ReviewStatus::Pending),
        text: args.text.clone(),
    };
    let queue = service.list(&filter, None, None).await?;
    println!(
        "\nPending queue ({} of {} listings)",
        queue.items.len(),
        queue.total
    );
    for record in &queue.items {
        render_card(record);
    }

    println!("\nTriage pass");
    let keeper = ListingId("lst-0001".to_string());
    let updated = service
        .set_status(&keeper, ReviewStatus::Reviewing, None)
        .await?;
    println!("- {} -> {}", updated.id.0, updated.status);

    let updated = service
        .set_status(
            &keeper,
            ReviewStatus::Approved,
            Some("Photos and price confirmed with the broker".to_string()),
        )
        .await?;
    println!("- {} -> {} ({})", updated.id.0, updated.status, note_of(&updated));

    let reject = ListingId("lst-0003".to_string());
    let updated = service
        .set_status(
            &reject,
            ReviewStatus::Rejected,
            Some("No photos in the export".to_string()),
        )
        .await?;
    println!("- {} -> {} ({})", updated.id.0, updated.status, note_of(&updated));

    let reopened = service
        .set_status(&reject, ReviewStatus::Pending, None)
        .await?;
    println!(
        "- {} reopened -> {} (notes kept: {})",
        reopened.id.0,
        reopened.status,
        note_of(&reopened)
    );

    let archive = ListingId("lst-0004".to_string());
    let updated = service
        .set_status(&archive, ReviewStatus::Archived, None)
        .await?;
    println!("- {} -> {}", updated.id.0, updated.status);

    // A bare status write to migrated is always refused.
    match service.set_status(&keeper, ReviewStatus::Migrated, None).await {
        Err(err) => println!("- {} direct migrated write refused: {}", keeper.0, err),
        Ok(record) => println!("- unexpected: {} became {}", record.id.0, record.status),
    }

    if args.skip_migration {
        println!("\nSkipping migration (--skip-migration)");
        render_stats(&service.stats().await?);
        return Ok(());
    }

    println!("\nMigration");
    let migrated = service.migrate(&keeper).await?;
    let catalog_id = migrated
        .catalog_id
        .as_ref()
        .map(|id| id.0.as_str())
        .unwrap_or("<missing>");
    println!("- {} promoted, canonical record {}", migrated.id.0, catalog_id);

    match service.migrate(&keeper).await {
        Err(err) => println!("- second attempt refused: {}", err),
        Ok(record) => println!("- unexpected: {} migrated twice", record.id.0),
    }

    println!();
    render_stats(&service.stats().await?);
    Ok(())
}

fn render_stats(stats: &CatalogStats) {
    println!(
        "Queue: {} listings | {} with photos, {} without | {} ready to migrate",
        stats.total, stats.with_photos, stats.without_photos, stats.ready_to_migrate
    );
    for status in ReviewStatus::ordered() {
        println!("  - {}: {}", status, stats.by_status.get(status));
    }
}

fn render_card(record: &ListingRecord) {
    let summary = record.summary();
    let title = summary.title.as_deref().unwrap_or("(untitled)");
    let place = summary
        .neighborhood
        .or(summary.city)
        .unwrap_or_else(|| "unknown area".to_string());
    let price = summary
        .price
        .map(|price| format!("R$ {price:.0}"))
        .unwrap_or_else(|| "no price".to_string());

    println!(
        "- [{}] {} | {} | {} | {} photo(s) | {}/{}",
        record.id.0, title, place, price, summary.photo_count, summary.purpose, summary.kind
    );
}

fn note_of(record: &ListingRecord) -> &str {
    record.notes.as_deref().unwrap_or("no notes")
}
