use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether a sitemap lists pages or other sitemaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<sitemapindex>`: every `<loc>` is another sitemap
    Index,
    /// Anything else: every `<loc>` is a page
    UrlSet,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    pub kind: SitemapKind,
    /// `<loc>` values in document order, unresolved
    pub locations: Vec<String>,
    /// True when `max_urls` cut the document short
    pub truncated: bool,
}

/// Returns a sitemap body as text, gunzipping `.xml.gz` files
///
/// Servers often send gzipped sitemap files without a `Content-Encoding`
/// header, so the body is sniffed for the gzip magic bytes.
pub fn decode_sitemap_body(bytes: &[u8]) -> Result<String, String> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(|e| format!("invalid gzip body: {}", e))?;
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

/// Parses a sitemap or sitemap index
///
/// Element names are compared by local name, so any namespace prefix is
/// accepted. `<loc>` text may be plain or CDATA.
///
/// # Arguments
///
/// * `xml` - Document body
/// * `max_urls` - Maximum number of `<loc>` values to keep
///
/// # Returns
///
/// * `Ok(SitemapDocument)` - The document had a root element
/// * `Err(String)` - The body is not XML
pub fn parse_sitemap(xml: &str, max_urls: usize) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut kind: Option<SitemapKind> = None;
    let mut locations = Vec::new();
    let mut truncated = false;
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if kind.is_none() {
                    kind = Some(if name.eq_ignore_ascii_case(b"sitemapindex") {
                        SitemapKind::Index
                    } else {
                        SitemapKind::UrlSet
                    });
                }
                if name.eq_ignore_ascii_case(b"loc") {
                    current_loc = Some(String::new());
                }
            }
            Ok(Event::Empty(_)) if kind.is_none() => {
                kind = Some(SitemapKind::UrlSet);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    loc.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"loc") {
                    if let Some(loc) = current_loc.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            if locations.len() >= max_urls {
                                truncated = true;
                                break;
                            }
                            locations.push(loc.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if kind.is_none() {
                    return Err(format!("invalid XML: {}", e));
                }
                tracing::debug!("Sitemap XML error after {} locations: {}", locations.len(), e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    let kind = kind.ok_or_else(|| "document has no root element".to_string())?;
    Ok(SitemapDocument {
        kind,
        locations,
        truncated,
    })
}
