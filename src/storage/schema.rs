//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the CMS-Scout recovery store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track batch runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    resume_index INTEGER NOT NULL DEFAULT 0,
    state TEXT NOT NULL
);

-- One row per processed input record; recomputing a chunk replaces its rows
CREATE TABLE IF NOT EXISTS outcomes (
    row_index INTEGER PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    raw_row TEXT NOT NULL,
    cms_label TEXT NOT NULL,
    confidence_signal TEXT,
    evidence TEXT,
    host TEXT,
    domain_rank INTEGER,
    total_pages INTEGER NOT NULL DEFAULT 0,
    indexed_pages INTEGER NOT NULL DEFAULT 0,
    backlink_count INTEGER NOT NULL DEFAULT 0,
    referring_domains INTEGER NOT NULL DEFAULT 0,
    page_count_status TEXT,
    status TEXT NOT NULL,
    error_detail TEXT,
    processed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_outcomes_label ON outcomes(cms_label);
CREATE INDEX IF NOT EXISTS idx_outcomes_status ON outcomes(status);
CREATE INDEX IF NOT EXISTS idx_outcomes_domain ON outcomes(domain);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
