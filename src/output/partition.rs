use crate::model::ProcessingOutcome;
use crate::ScoutError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Output groups, in file order; each becomes `<group>.csv`
pub const OUTPUT_GROUPS: [&str; 4] = ["detected", "not_detected", "unknown", "errors"];

/// Columns appended after the input columns
pub const RESULT_COLUMNS: [&str; 13] = [
    "domain",
    "cms",
    "confidence_signal",
    "evidence",
    "host",
    "domain_rank",
    "total_pages",
    "indexed_pages",
    "backlinks",
    "backlink_domains",
    "page_count_status",
    "status",
    "error_detail",
];

/// Splits outcomes by output group, keeping input order within a group
pub fn group_outcomes(outcomes: &[ProcessingOutcome]) -> BTreeMap<&'static str, Vec<&ProcessingOutcome>> {
    let mut groups: BTreeMap<&'static str, Vec<&ProcessingOutcome>> =
        OUTPUT_GROUPS.iter().map(|g| (*g, Vec::new())).collect();

    for outcome in outcomes {
        groups.entry(outcome.group()).or_default().push(outcome);
    }

    groups
}

/// Writes one CSV file per output group into `dir`
///
/// Every group file is written, with headers, even when empty. Input
/// columns come first (sorted by name, union over all rows); input columns
/// named like a result column are left out.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the written files
/// * `Err(ScoutError)` - Failed to create the directory or write a file
pub fn write_partitions(dir: &Path, outcomes: &[ProcessingOutcome]) -> Result<Vec<PathBuf>, ScoutError> {
    std::fs::create_dir_all(dir)?;

    let input_columns: Vec<&str> = outcomes
        .iter()
        .flat_map(|o| o.record.raw_row.keys())
        .map(String::as_str)
        .filter(|name| !RESULT_COLUMNS.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut written = Vec::new();
    for (group, members) in group_outcomes(outcomes) {
        let path = dir.join(format!("{}.csv", group));
        let mut writer = csv::WriterBuilder::new().from_path(&path)?;

        let header: Vec<&str> = input_columns
            .iter()
            .copied()
            .chain(RESULT_COLUMNS.iter().copied())
            .collect();
        writer.write_record(&header)?;

        for outcome in members {
            writer.write_record(&row_for(outcome, &input_columns))?;
        }

        writer.flush()?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

fn row_for(outcome: &ProcessingOutcome, input_columns: &[&str]) -> Vec<String> {
    let classification = &outcome.classification;
    let metrics = &outcome.metrics;

    let mut row: Vec<String> = input_columns
        .iter()
        .map(|column| {
            outcome
                .record
                .raw_row
                .get(*column)
                .cloned()
                .unwrap_or_default()
        })
        .collect();

    row.extend([
        classification.domain.clone(),
        classification.cms_label.to_db_string().to_string(),
        classification
            .confidence_signal
            .map(|s| s.to_db_string().to_string())
            .unwrap_or_default(),
        classification.evidence.clone().unwrap_or_default(),
        classification.host.clone().unwrap_or_default(),
        metrics
            .domain_rank
            .map(|rank| rank.to_string())
            .unwrap_or_default(),
        metrics.total_pages.to_string(),
        metrics.indexed_pages.to_string(),
        metrics.backlink_count.to_string(),
        metrics.referring_domains.to_string(),
        outcome.page_count_status.clone().unwrap_or_default(),
        outcome.status.to_db_string().to_string(),
        outcome.error_detail.clone().unwrap_or_default(),
    ]);

    row
}
