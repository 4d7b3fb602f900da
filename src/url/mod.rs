//! URL handling module for CMS-Scout
//!
//! Input rows carry domains in many shapes (`Example.com`, `https://www.example.com/`,
//! `example.com:8080/path`). This module reduces them to a canonical host,
//! derives the `www.` alternate used by classification, and builds the site
//! URLs every component fetches.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{alternate_host, extract_host, is_ip_or_local};
pub use normalize::{normalize_domain, resolve_location, site_url};
