use super::common::*;
use crate::listings::domain::{CatalogRecordId, ReviewStatus};
use crate::listings::status::{apply_migration, apply_transition, ReviewRuleError};
use chrono::Duration;

/// Expected adjacency, written out independently of the production table.
fn reviewer_edge(from: ReviewStatus, to: ReviewStatus) -> bool {
    use ReviewStatus::*;
    matches!(
        (from, to),
        (Pending, Reviewing)
            | (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Archived)
            | (Reviewing, Approved)
            | (Reviewing, Rejected)
            | (Reviewing, Archived)
            | (Approved, Rejected)
            | (Approved, Archived)
            | (Rejected, Pending)
            | (Rejected, Archived)
    )
}

#[test]
fn transition_matrix_matches_review_workflow() {
    let now = base_time() + Duration::minutes(5);

    for from in ReviewStatus::ordered() {
        for to in ReviewStatus::ordered() {
            let mut record = record_in(from);
            let before = record.clone();
            let result = apply_transition(&mut record, to, None, now);

            if to == ReviewStatus::Migrated {
                assert_eq!(
                    result,
                    Err(ReviewRuleError::MigrationNotDirect),
                    "{from} -> {to}"
                );
                assert_eq!(record, before, "{from} -> {to} must not mutate");
            } else if reviewer_edge(from, to) {
                assert_eq!(result, Ok(()), "{from} -> {to}");
                assert_eq!(record.status, to);
                assert_eq!(record.updated_at, now);
            } else {
                assert_eq!(
                    result,
                    Err(ReviewRuleError::InvalidTransition { from, to }),
                    "{from} -> {to}"
                );
                assert_eq!(record, before, "{from} -> {to} must not mutate");
            }
        }
    }
}

#[test]
fn migrated_edge_is_listed_but_never_reviewer_reachable() {
    assert!(ReviewStatus::Approved.can_transition_to(ReviewStatus::Migrated));

    let mut record = record_in(ReviewStatus::Approved);
    let result = apply_transition(&mut record, ReviewStatus::Migrated, None, base_time());
    assert_eq!(result, Err(ReviewRuleError::MigrationNotDirect));
    assert_eq!(record.status, ReviewStatus::Approved);
    assert!(record.catalog_id.is_none());
}

#[test]
fn terminal_statuses_have_no_outgoing_edges() {
    assert!(ReviewStatus::Migrated.allowed_targets().is_empty());
    assert!(ReviewStatus::Archived.allowed_targets().is_empty());
    assert!(ReviewStatus::Migrated.is_terminal());
    assert!(ReviewStatus::Archived.is_terminal());
    assert!(!ReviewStatus::Rejected.is_terminal());
}

#[test]
fn notes_follow_last_write_wins() {
    let mut record = record_in(ReviewStatus::Pending);
    let now = base_time() + Duration::minutes(1);

    apply_transition(
        &mut record,
        ReviewStatus::Rejected,
        Some("missing photos".to_string()),
        now,
    )
    .expect("reject succeeds");
    assert_eq!(record.notes.as_deref(), Some("missing photos"));

    // Reopening without notes keeps the rejection note.
    apply_transition(&mut record, ReviewStatus::Pending, None, now + Duration::minutes(1))
        .expect("reopen succeeds");
    assert_eq!(record.notes.as_deref(), Some("missing photos"));

    apply_transition(
        &mut record,
        ReviewStatus::Reviewing,
        Some("second pass".to_string()),
        now + Duration::minutes(2),
    )
    .expect("review succeeds");
    assert_eq!(record.notes.as_deref(), Some("second pass"));
}

#[test]
fn failed_transition_keeps_notes_and_timestamps() {
    let mut record = record_in(ReviewStatus::Reviewing);
    record.notes = Some("checking area".to_string());
    let before = record.clone();

    let result = apply_transition(
        &mut record,
        ReviewStatus::Pending,
        Some("should never land".to_string()),
        base_time() + Duration::minutes(9),
    );

    assert_eq!(
        result,
        Err(ReviewRuleError::InvalidTransition {
            from: ReviewStatus::Reviewing,
            to: ReviewStatus::Pending,
        })
    );
    assert_eq!(record, before);
}

#[test]
fn migration_write_sets_all_bookkeeping_at_once() {
    let mut record = record_in(ReviewStatus::Approved);
    let now = base_time() + Duration::minutes(30);

    apply_migration(&mut record, CatalogRecordId("cat-77".to_string()), now)
        .expect("approved listing migrates");

    assert_eq!(record.status, ReviewStatus::Migrated);
    assert_eq!(record.catalog_id, Some(CatalogRecordId("cat-77".to_string())));
    assert_eq!(record.migrated_at, Some(now));
    assert_eq!(record.updated_at, now);
    assert!(record.migration_state_consistent());
}

#[test]
fn migration_write_requires_approved_status() {
    for status in [
        ReviewStatus::Pending,
        ReviewStatus::Reviewing,
        ReviewStatus::Rejected,
        ReviewStatus::Archived,
    ] {
        let mut record = record_in(status);
        let before = record.clone();
        let result = apply_migration(
            &mut record,
            CatalogRecordId("cat-77".to_string()),
            base_time(),
        );
        assert_eq!(result, Err(ReviewRuleError::NotApproved { status }));
        assert_eq!(record, before);
    }

    let mut migrated = record_in(ReviewStatus::Migrated);
    let before = migrated.clone();
    let result = apply_migration(
        &mut migrated,
        CatalogRecordId("cat-78".to_string()),
        base_time(),
    );
    assert_eq!(result, Err(ReviewRuleError::AlreadyMigrated));
    assert_eq!(migrated, before, "already migrated record keeps its catalog id");
}

#[test]
fn status_labels_round_trip() {
    for status in ReviewStatus::ordered() {
        assert_eq!(ReviewStatus::parse(status.label()), Some(status));
        assert_eq!(status.to_string(), status.label());
    }

    assert_eq!(ReviewStatus::parse(" Approved "), Some(ReviewStatus::Approved));
    assert_eq!(ReviewStatus::parse("MIGRATED"), Some(ReviewStatus::Migrated));
    assert_eq!(ReviewStatus::parse("published"), None);
}
