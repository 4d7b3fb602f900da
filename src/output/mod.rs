//! Output module for run results
//!
//! This module handles:
//! - Partitioning outcomes into one CSV file per label plus an errors file
//! - Loading and printing run statistics from the recovery store

mod partition;
pub mod stats;

pub use partition::{group_outcomes, write_partitions, OUTPUT_GROUPS, RESULT_COLUMNS};
pub use stats::{load_statistics, print_statistics, RunStatistics};
