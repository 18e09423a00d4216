//! Catalog review and migration engine for listings imported from a retired
//! WPL real-estate site. Records are triaged through a review state machine
//! and selectively promoted into the canonical property catalog.

pub mod config;
pub mod error;
pub mod listings;
pub mod telemetry;
