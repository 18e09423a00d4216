use chrono::{DateTime, Utc};

use super::domain::{CatalogRecordId, ListingRecord, ReviewStatus};

/// Rule violations raised by the review state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewRuleError {
    #[error("listing cannot move from {from} to {to}")]
    InvalidTransition {
        from: ReviewStatus,
        to: ReviewStatus,
    },
    #[error("listings become migrated only through the migration engine")]
    MigrationNotDirect,
    #[error("only approved listings can be migrated, this one is {status}")]
    NotApproved { status: ReviewStatus },
    #[error("listing is already migrated")]
    AlreadyMigrated,
}

impl ReviewStatus {
    /// Adjacency table for the review workflow. `approved -> migrated` is a
    /// legal edge but reachable only through the migration engine, never via
    /// a bare status write.
    pub const fn allowed_targets(self) -> &'static [ReviewStatus] {
        match self {
            ReviewStatus::Pending => &[
                ReviewStatus::Reviewing,
                ReviewStatus::Approved,
                ReviewStatus::Rejected,
                ReviewStatus::Archived,
            ],
            ReviewStatus::Reviewing => &[
                ReviewStatus::Approved,
                ReviewStatus::Rejected,
                ReviewStatus::Archived,
            ],
            ReviewStatus::Approved => &[
                ReviewStatus::Migrated,
                ReviewStatus::Rejected,
                ReviewStatus::Archived,
            ],
            ReviewStatus::Rejected => &[ReviewStatus::Pending, ReviewStatus::Archived],
            ReviewStatus::Migrated | ReviewStatus::Archived => &[],
        }
    }

    pub fn can_transition_to(self, target: ReviewStatus) -> bool {
        self.allowed_targets().contains(&target)
    }
}

/// Reviewer-driven transition. Mutates the record only when every rule holds,
/// so a failed call leaves the value untouched.
///
/// Notes follow last-write-wins: a provided value replaces the stored one,
/// `None` preserves it. Reopening (`rejected -> pending`) therefore keeps the
/// rejection notes unless the reviewer supplies new ones.
pub fn apply_transition(
    record: &mut ListingRecord,
    target: ReviewStatus,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ReviewRuleError> {
    if target == ReviewStatus::Migrated {
        return Err(ReviewRuleError::MigrationNotDirect);
    }
    if !record.status.can_transition_to(target) {
        return Err(ReviewRuleError::InvalidTransition {
            from: record.status,
            to: target,
        });
    }

    record.status = target;
    if let Some(notes) = notes {
        record.notes = Some(notes);
    }
    record.updated_at = now;
    Ok(())
}

/// Migration-side write: the single place where a listing becomes `migrated`.
/// Status, catalog id, and timestamp land in the same store write so no
/// intermediate state is observable.
pub(crate) fn apply_migration(
    record: &mut ListingRecord,
    catalog_id: CatalogRecordId,
    now: DateTime<Utc>,
) -> Result<(), ReviewRuleError> {
    match record.status {
        ReviewStatus::Migrated => Err(ReviewRuleError::AlreadyMigrated),
        ReviewStatus::Approved => {
            record.status = ReviewStatus::Migrated;
            record.catalog_id = Some(catalog_id);
            record.migrated_at = Some(now);
            record.updated_at = now;
            Ok(())
        }
        status => Err(ReviewRuleError::NotApproved { status }),
    }
}
