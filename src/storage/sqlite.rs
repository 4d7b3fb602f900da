//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{
    ClassificationResult, CmsLabel, ConfidenceSignal, JobState, OutcomeStatus, ProcessingOutcome,
    SiteMetrics, SiteRecord,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::RunRecord;
use crate::ScoutError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, resume_index, state";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        resume_index: row.get::<_, i64>(4)?.max(0) as usize,
        state: JobState::from_db_string(&row.get::<_, String>(5)?).unwrap_or(JobState::Failed),
    })
}

/// Raw outcome columns, decoded outside the rusqlite row closure
struct OutcomeRow {
    row_index: i64,
    domain: String,
    raw_row: String,
    cms_label: String,
    confidence_signal: Option<String>,
    evidence: Option<String>,
    host: Option<String>,
    domain_rank: Option<i64>,
    total_pages: i64,
    indexed_pages: i64,
    backlink_count: i64,
    referring_domains: i64,
    page_count_status: Option<String>,
    status: String,
    error_detail: Option<String>,
}

impl OutcomeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            row_index: row.get(0)?,
            domain: row.get(1)?,
            raw_row: row.get(2)?,
            cms_label: row.get(3)?,
            confidence_signal: row.get(4)?,
            evidence: row.get(5)?,
            host: row.get(6)?,
            domain_rank: row.get(7)?,
            total_pages: row.get(8)?,
            indexed_pages: row.get(9)?,
            backlink_count: row.get(10)?,
            referring_domains: row.get(11)?,
            page_count_status: row.get(12)?,
            status: row.get(13)?,
            error_detail: row.get(14)?,
        })
    }

    fn into_outcome(self) -> StorageResult<ProcessingOutcome> {
        let corrupt = |message: String| StorageError::CorruptRow {
            row: self.row_index,
            message,
        };

        let raw_row: BTreeMap<String, String> = serde_json::from_str(&self.raw_row)
            .map_err(|e| corrupt(format!("raw_row: {}", e)))?;
        let cms_label = CmsLabel::from_db_string(&self.cms_label)
            .ok_or_else(|| corrupt(format!("unknown label '{}'", self.cms_label)))?;
        let status = OutcomeStatus::from_db_string(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;
        let confidence_signal = self
            .confidence_signal
            .as_deref()
            .and_then(ConfidenceSignal::from_db_string);

        Ok(ProcessingOutcome {
            record: SiteRecord::with_row(self.row_index.max(0) as usize, self.domain.clone(), raw_row),
            classification: ClassificationResult {
                domain: self.domain,
                cms_label,
                confidence_signal,
                evidence: self.evidence,
                host: self.host,
            },
            metrics: SiteMetrics {
                domain_rank: self.domain_rank,
                total_pages: self.total_pages.max(0) as u64,
                indexed_pages: self.indexed_pages.max(0) as u64,
                backlink_count: self.backlink_count.max(0) as u64,
                referring_domains: self.referring_domains.max(0) as u64,
            },
            page_count_status: self.page_count_status,
            status,
            error_detail: self.error_detail,
        })
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, resume_index: usize) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, resume_index, state) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                config_hash,
                clamp_i64(resume_index as u64),
                JobState::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        Ok(stmt.query_row([], run_from_row).optional()?)
    }

    fn finish_run(&mut self, run_id: i64, state: JobState) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET state = ?1, finished_at = ?2 WHERE id = ?3",
            params![state.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Outcomes =====

    fn upsert_outcomes(
        &mut self,
        run_id: i64,
        outcomes: &[ProcessingOutcome],
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO outcomes (
                    row_index, run_id, domain, raw_row, cms_label, confidence_signal,
                    evidence, host, domain_rank, total_pages, indexed_pages,
                    backlink_count, referring_domains, page_count_status, status,
                    error_detail, processed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;

            for outcome in outcomes {
                let raw_row = serde_json::to_string(&outcome.record.raw_row)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let classification = &outcome.classification;
                let metrics = &outcome.metrics;

                stmt.execute(params![
                    clamp_i64(outcome.record.index as u64),
                    run_id,
                    outcome.record.domain,
                    raw_row,
                    classification.cms_label.to_db_string(),
                    classification.confidence_signal.map(|s| s.to_db_string()),
                    classification.evidence,
                    classification.host,
                    metrics.domain_rank,
                    clamp_i64(metrics.total_pages),
                    clamp_i64(metrics.indexed_pages),
                    clamp_i64(metrics.backlink_count),
                    clamp_i64(metrics.referring_domains),
                    outcome.page_count_status,
                    outcome.status.to_db_string(),
                    outcome.error_detail,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_outcomes(&self) -> StorageResult<Vec<ProcessingOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_index, domain, raw_row, cms_label, confidence_signal, evidence, host,
                    domain_rank, total_pages, indexed_pages, backlink_count, referring_domains,
                    page_count_status, status, error_detail
             FROM outcomes ORDER BY row_index",
        )?;

        let rows = stmt
            .query_map([], OutcomeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(OutcomeRow::into_outcome).collect()
    }

    fn clear_outcomes(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM outcomes", [])?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_outcomes(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM outcomes", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn count_by_label(&self) -> StorageResult<HashMap<CmsLabel, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT cms_label, COUNT(*) FROM outcomes GROUP BY cms_label")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (label, count) = row?;
            if let Some(label) = CmsLabel::from_db_string(&label) {
                counts.insert(label, count.max(0) as u64);
            }
        }
        Ok(counts)
    }

    fn count_by_status(&self) -> StorageResult<HashMap<OutcomeStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM outcomes GROUP BY status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            if let Some(status) = OutcomeStatus::from_db_string(&status) {
                counts.insert(status, count.max(0) as u64);
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detected_outcome(index: usize, domain: &str) -> ProcessingOutcome {
        let mut row = BTreeMap::new();
        row.insert("website_url".to_string(), domain.to_string());
        row.insert("owner".to_string(), "Ada".to_string());

        let mut outcome = ProcessingOutcome::started(SiteRecord::with_row(index, domain, row));
        outcome.classification =
            ClassificationResult::detected(domain, ConfidenceSignal::MetaTag, "WordPress 6.3")
                .on_host(domain);
        outcome.metrics = SiteMetrics {
            domain_rank: Some(512),
            total_pages: 140,
            indexed_pages: 97,
            backlink_count: 2200,
            referring_domains: 61,
        };
        outcome.page_count_status = Some("counted from sitemaps".to_string());
        outcome
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_create_and_finish_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("abc123", 20).unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.config_hash, "abc123");
        assert_eq!(run.resume_index, 20);
        assert_eq!(run.state, JobState::Running);
        assert!(run.finished_at.is_none());

        storage.finish_run(run_id, JobState::Completed).unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.state, JobState::Completed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_missing_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(99),
            Err(StorageError::RunNotFound(99))
        ));
        assert!(storage.finish_run(99, JobState::Failed).is_err());
        assert!(storage.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_outcome_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", 0).unwrap();
        let outcome = detected_outcome(3, "example.com");

        storage
            .upsert_outcomes(run_id, std::slice::from_ref(&outcome))
            .unwrap();
        let loaded = storage.load_outcomes().unwrap();

        assert_eq!(loaded, vec![outcome]);
    }

    #[test]
    fn test_recomputed_rows_replace() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", 0).unwrap();

        let first = vec![detected_outcome(0, "a.com"), detected_outcome(1, "b.com")];
        storage.upsert_outcomes(run_id, &first).unwrap();

        let mut retry = detected_outcome(1, "b.com");
        retry.note_failure("search: timeout");
        storage.upsert_outcomes(run_id, &[retry]).unwrap();

        assert_eq!(storage.count_outcomes().unwrap(), 2);
        let loaded = storage.load_outcomes().unwrap();
        assert_eq!(loaded[1].status, OutcomeStatus::PartialFailure);
    }

    #[test]
    fn test_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", 0).unwrap();

        let failed = ProcessingOutcome::failed(SiteRecord::new(2, "c.com"), "task panicked");
        let outcomes = vec![
            detected_outcome(0, "a.com"),
            detected_outcome(1, "b.com"),
            failed,
        ];
        storage.upsert_outcomes(run_id, &outcomes).unwrap();

        let labels = storage.count_by_label().unwrap();
        assert_eq!(labels.get(&CmsLabel::Detected), Some(&2));
        assert_eq!(labels.get(&CmsLabel::Unknown), Some(&1));

        let statuses = storage.count_by_status().unwrap();
        assert_eq!(statuses.get(&OutcomeStatus::Ok), Some(&2));
        assert_eq!(statuses.get(&OutcomeStatus::Failed), Some(&1));
    }

    #[test]
    fn test_clear_outcomes() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("h", 0).unwrap();
        storage
            .upsert_outcomes(run_id, &[detected_outcome(0, "a.com")])
            .unwrap();

        storage.clear_outcomes().unwrap();

        assert_eq!(storage.count_outcomes().unwrap(), 0);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scout.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            let run_id = storage.create_run("h", 0).unwrap();
            storage
                .upsert_outcomes(run_id, &[detected_outcome(0, "a.com")])
                .unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_outcomes().unwrap(), 1);
    }
}
