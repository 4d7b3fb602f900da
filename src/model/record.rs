use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One validated input row
///
/// `index` is the row's zero-based position in the input file. It keys the
/// recovery store, so a recomputed chunk overwrites its earlier rows instead
/// of duplicating them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub index: usize,
    pub domain: String,
    pub raw_row: BTreeMap<String, String>,
}

impl SiteRecord {
    /// Creates a record with no extra input columns
    pub fn new(index: usize, domain: impl Into<String>) -> Self {
        Self {
            index,
            domain: domain.into(),
            raw_row: BTreeMap::new(),
        }
    }

    /// Creates a record keeping the original row for the output files
    pub fn with_row(index: usize, domain: impl Into<String>, raw_row: BTreeMap<String, String>) -> Self {
        Self {
            index,
            domain: domain.into(),
            raw_row,
        }
    }
}
