use url::{Host, Url};

/// Extracts the host of a URL, lowercased and with its port if any
///
/// # Examples
///
/// ```
/// use url::Url;
/// use cms_scout::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns the `www.`-toggled form of a host
///
/// `example.com` becomes `www.example.com` and vice versa. Hosts that are IP
/// addresses or have no dot (such as `localhost`) have no alternate.
pub fn alternate_host(host: &str) -> Option<String> {
    if is_ip_or_local(host) {
        return None;
    }

    match host.strip_prefix("www.") {
        Some(bare) if !bare.is_empty() => Some(bare.to_string()),
        Some(_) => None,
        None => Some(format!("www.{}", host)),
    }
}

/// Returns true for IP literals and dotless host names
pub fn is_ip_or_local(host: &str) -> bool {
    let name = strip_port(host);
    if name.starts_with('[') {
        return true;
    }

    match Host::parse(name) {
        Ok(Host::Domain(domain)) => !domain.contains('.'),
        Ok(Host::Ipv4(_)) | Ok(Host::Ipv6(_)) => true,
        Err(_) => true,
    }
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
