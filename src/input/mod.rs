//! CSV input loading
//!
//! Every data row becomes one [`SiteRecord`]; the row keeps all of its
//! columns so the output files can carry them through. Domains are not
//! validated here: an unusable value becomes a failed outcome later instead
//! of silently shifting row indices.

use crate::model::SiteRecord;
use crate::ScoutError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Loads site records from a CSV file with a header row
///
/// # Arguments
///
/// * `path` - Path to the CSV file
/// * `domain_column` - Header of the column holding the domain or URL
///
/// # Returns
///
/// * `Ok(Vec<SiteRecord>)` - One record per data row, in file order
/// * `Err(ScoutError)` - File unreadable, malformed, or the column is missing
pub fn load_records(path: &Path, domain_column: &str) -> Result<Vec<SiteRecord>, ScoutError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ScoutError::Input(format!("Cannot open {}: {}", path.display(), e))
    })?;
    let records = read_records(file, domain_column)?;
    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads site records from any CSV source
pub fn read_records<R: Read>(source: R, domain_column: &str) -> Result<Vec<SiteRecord>, ScoutError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let domain_position = headers
        .iter()
        .position(|h| h == domain_column)
        .ok_or_else(|| {
            ScoutError::Input(format!(
                "Column '{}' not found (columns: {})",
                domain_column,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let domain = row.get(domain_position).unwrap_or_default().trim();

        let raw_row: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        records.push(SiteRecord::with_row(index, domain, raw_row));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_records() {
        let csv = "company,website_url\nAcme, https://acme.com/ \nBeta,beta.io\n";
        let records = read_records(csv.as_bytes(), "website_url").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 0);
        assert_eq!(records[0].domain, "https://acme.com/");
        assert_eq!(records[0].raw_row["company"], "Acme");
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].domain, "beta.io");
    }

    #[test]
    fn test_empty_domain_keeps_row() {
        let csv = "website_url,name\n,Nobody\nx.com,X\n";
        let records = read_records(csv.as_bytes(), "website_url").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain, "");
        assert_eq!(records[1].index, 1);
    }

    #[test]
    fn test_missing_column() {
        let csv = "company,url\nAcme,acme.com\n";
        let result = read_records(csv.as_bytes(), "website_url");
        assert!(matches!(result, Err(ScoutError::Input(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "website_url").unwrap();
        writeln!(file, "a.com").unwrap();
        writeln!(file, "b.com").unwrap();

        let records = load_records(file.path(), "website_url").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = load_records(Path::new("/nonexistent/input.csv"), "website_url");
        assert!(matches!(result, Err(ScoutError::Input(_))));
    }
}
