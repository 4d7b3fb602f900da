use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification verdict for one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmsLabel {
    /// The site runs on the configured platform
    Detected,
    /// The site was inspected and runs on something else
    NotDetected,
    /// No signal either way
    Unknown,
}

impl CmsLabel {
    /// Returns true if enrichment should run for this verdict
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected)
    }

    /// Converts the label to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::NotDetected => "not_detected",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a label from a database string representation
    ///
    /// Returns None if the string doesn't match any known label.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "detected" => Some(Self::Detected),
            "not_detected" => Some(Self::NotDetected),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Returns all labels in output order
    pub fn all() -> [Self; 3] {
        [Self::Detected, Self::NotDetected, Self::Unknown]
    }
}

impl fmt::Display for CmsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Which heuristic produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceSignal {
    /// `<meta name="generator">` names the platform
    MetaTag,
    /// A structural pattern matched the page body
    ContentPattern,
    /// The technology-detection API listed (or did not list) the platform
    ApiTechnologyList,
    /// A pattern match was confirmed by the API-discovery endpoint
    ScrapeConfirmed,
}

impl ConfidenceSignal {
    /// Converts the signal to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::MetaTag => "meta_tag",
            Self::ContentPattern => "content_pattern",
            Self::ApiTechnologyList => "api_technology_list",
            Self::ScrapeConfirmed => "scrape_confirmed",
        }
    }

    /// Parses a signal from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "meta_tag" => Some(Self::MetaTag),
            "content_pattern" => Some(Self::ContentPattern),
            "api_technology_list" => Some(Self::ApiTechnologyList),
            "scrape_confirmed" => Some(Self::ScrapeConfirmed),
            _ => None,
        }
    }
}

impl fmt::Display for ConfidenceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
