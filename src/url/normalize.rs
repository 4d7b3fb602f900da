use crate::url::domain::extract_host;
use crate::UrlError;
use url::Url;

/// Normalizes an input domain to a canonical host
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty input
/// 2. Add a scheme if the value has none, so bare domains parse
/// 3. Reject schemes other than HTTP and HTTPS
/// 4. Lowercase the host and remove a leading `www.`
/// 5. Drop path, query and fragment; keep an explicit port
///
/// # Arguments
///
/// * `input` - Raw domain or URL from an input row
///
/// # Returns
///
/// * `Ok(String)` - Canonical host, e.g. `example.com` or `127.0.0.1:8080`
/// * `Err(UrlError)` - The value is not a usable website address
///
/// # Examples
///
/// ```
/// use cms_scout::url::normalize_domain;
///
/// assert_eq!(normalize_domain("https://WWW.Example.com/about/").unwrap(), "example.com");
/// assert_eq!(normalize_domain("example.com").unwrap(), "example.com");
/// ```
pub fn normalize_domain(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches("//"))
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = extract_host(&url).ok_or(UrlError::MissingDomain)?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() || host.starts_with('.') || host.starts_with(':') {
        return Err(UrlError::Malformed(trimmed.to_string()));
    }

    Ok(host)
}

/// Builds an absolute URL on a site
///
/// # Arguments
///
/// * `scheme` - `https` in production, `http` against local test servers
/// * `host` - Host as returned by [`normalize_domain`], optionally with port
/// * `path` - Absolute path starting with `/`
pub fn site_url(scheme: &str, host: &str, path: &str) -> Result<Url, UrlError> {
    let base = format!("{}://{}/", scheme, host);
    let base = Url::parse(&base).map_err(|e| UrlError::Parse(format!("{}: {}", base, e)))?;
    base.join(path)
        .map_err(|e| UrlError::Malformed(format!("{}{}: {}", host, path, e)))
}

/// Resolves a `<loc>` or robots.txt value against the document it came from
///
/// Absolute HTTP(S) values are returned as-is; relative values are joined to
/// `base`. Other schemes are rejected.
pub fn resolve_location(base: &Url, location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    let resolved = base.join(location).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
