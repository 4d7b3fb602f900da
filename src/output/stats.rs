//! Statistics generation from the recovery store
//!
//! This module provides functionality for extracting and displaying
//! run statistics from the storage layer.

use crate::model::{CmsLabel, OutcomeStatus};
use crate::storage::{RunRecord, Storage};
use crate::ScoutError;
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Total number of stored outcomes
    pub total: u64,

    /// Count of outcomes by label
    pub by_label: HashMap<CmsLabel, u64>,

    /// Count of outcomes by status
    pub by_status: HashMap<OutcomeStatus, u64>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl RunStatistics {
    pub fn label_count(&self, label: CmsLabel) -> u64 {
        self.by_label.get(&label).copied().unwrap_or(0)
    }

    pub fn status_count(&self, status: OutcomeStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(ScoutError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<RunStatistics, ScoutError> {
    Ok(RunStatistics {
        total: storage.count_outcomes()?,
        by_label: storage.count_by_label()?,
        by_status: storage.count_by_status()?,
        latest_run: storage.get_latest_run()?,
    })
}

fn percent(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    if let Some(run) = &stats.latest_run {
        println!("Latest run:");
        println!("  Run ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  State: {}", run.state);
        println!("  Resumed from record: {}", run.resume_index);
        println!("  Config hash: {}", run.config_hash);
        println!();
    }

    println!("Outcomes: {}", stats.total);
    println!();

    println!("By label:");
    for label in CmsLabel::all() {
        let count = stats.label_count(label);
        println!("  {}: {} ({:.1}%)", label, count, percent(count, stats.total));
    }
    println!();

    println!("By status:");
    for status in [
        OutcomeStatus::Ok,
        OutcomeStatus::PartialFailure,
        OutcomeStatus::Failed,
    ] {
        let count = stats.status_count(status);
        println!("  {}: {} ({:.1}%)", status, count, percent(count, stats.total));
    }
    println!();

    let detected = stats.label_count(CmsLabel::Detected);
    println!(
        "Detection rate: {:.1}% ({} / {} sites)",
        percent(detected, stats.total),
        detected,
        stats.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingOutcome, SiteRecord};
    use crate::storage::SqliteStorage;
    use tempfile::TempDir;

    #[test]
    fn test_load_statistics() {
        let dir = TempDir::new().unwrap();
        let mut storage = SqliteStorage::new(&dir.path().join("scout.db")).unwrap();
        let run_id = storage.create_run("hash", 0).unwrap();
        storage
            .upsert_outcomes(
                run_id,
                &[
                    ProcessingOutcome::started(SiteRecord::new(0, "a.com")),
                    ProcessingOutcome::failed(SiteRecord::new(1, "b.com"), "boom"),
                ],
            )
            .unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.label_count(CmsLabel::Unknown), 2);
        assert_eq!(stats.label_count(CmsLabel::Detected), 0);
        assert_eq!(stats.status_count(OutcomeStatus::Failed), 1);
        assert_eq!(stats.latest_run.unwrap().id, run_id);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
