use super::{CmsLabel, ConfidenceSignal, SiteRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of the classification engine for one domain
///
/// Produced once per domain and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub domain: String,
    pub cms_label: CmsLabel,
    /// Absent when the label is `Unknown`
    pub confidence_signal: Option<ConfidenceSignal>,
    /// Generator string, matched pattern or technology name behind the verdict
    pub evidence: Option<String>,
    /// Host whose page produced the verdict, if a page was read
    pub host: Option<String>,
}

impl ClassificationResult {
    pub fn detected(
        domain: impl Into<String>,
        signal: ConfidenceSignal,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            cms_label: CmsLabel::Detected,
            confidence_signal: Some(signal),
            evidence: Some(evidence.into()),
            host: None,
        }
    }

    pub fn not_detected(
        domain: impl Into<String>,
        signal: ConfidenceSignal,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            cms_label: CmsLabel::NotDetected,
            confidence_signal: Some(signal),
            evidence: Some(evidence.into()),
            host: None,
        }
    }

    pub fn unknown(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            cms_label: CmsLabel::Unknown,
            confidence_signal: None,
            evidence: None,
            host: None,
        }
    }

    /// Records the host that produced the verdict
    pub fn on_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// Enrichment metrics for a detected site
///
/// All fields stay zero/absent unless the site was classified `Detected`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetrics {
    pub domain_rank: Option<i64>,
    pub total_pages: u64,
    pub indexed_pages: u64,
    pub backlink_count: u64,
    pub referring_domains: u64,
}

impl SiteMetrics {
    /// Returns true if no metric carries a value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Final status of one record's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// Every call the record needed succeeded
    Ok,
    /// The record completed but some enrichment calls failed
    PartialFailure,
    /// The record's pipeline did not complete
    Failed,
}

impl OutcomeStatus {
    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::PartialFailure => "partial_failure",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "partial_failure" => Some(Self::PartialFailure),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Everything known about one processed record
///
/// This is the unit written to the recovery store and the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub record: SiteRecord,
    pub classification: ClassificationResult,
    pub metrics: SiteMetrics,
    /// Status string of the sitemap page count, when it ran
    pub page_count_status: Option<String>,
    pub status: OutcomeStatus,
    pub error_detail: Option<String>,
}

impl ProcessingOutcome {
    /// Creates the empty outcome a record starts with
    pub fn started(record: SiteRecord) -> Self {
        let classification = ClassificationResult::unknown(record.domain.clone());
        Self {
            record,
            classification,
            metrics: SiteMetrics::default(),
            page_count_status: None,
            status: OutcomeStatus::Ok,
            error_detail: None,
        }
    }

    /// Creates a failed outcome with zeroed metrics
    pub fn failed(record: SiteRecord, detail: impl Into<String>) -> Self {
        let mut outcome = Self::started(record);
        outcome.status = OutcomeStatus::Failed;
        outcome.error_detail = Some(detail.into());
        outcome
    }

    /// Adds a failure note and downgrades an `Ok` status to `PartialFailure`
    pub fn note_failure(&mut self, detail: impl AsRef<str>) {
        if self.status == OutcomeStatus::Ok {
            self.status = OutcomeStatus::PartialFailure;
        }
        self.error_detail = Some(match self.error_detail.take() {
            Some(existing) => format!("{}; {}", existing, detail.as_ref()),
            None => detail.as_ref().to_string(),
        });
    }

    /// Output group this outcome belongs to
    ///
    /// Failed records go to the errors group regardless of label.
    pub fn group(&self) -> &'static str {
        if self.status == OutcomeStatus::Failed {
            "errors"
        } else {
            self.classification.cms_label.to_db_string()
        }
    }
}
