use quick_xml::events::Event;
use quick_xml::reader::Reader;

// ─────────────────────────────────────────────────────────────────────────────
// ASCII Case-Insensitive Helpers
// ─────────────────────────────────────────────────────────────────────────────
//
// These avoid allocations from to_lowercase() while classifying SSDP traffic.
// Header names and the tokens we look for are ASCII.

/// Checks if `haystack` contains `needle` (ASCII case-insensitive, no allocation).
#[inline]
pub fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Checks if `s` starts with `prefix` (ASCII case-insensitive, no allocation).
#[inline]
pub fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Returns true if any of `needles` occurs in `haystack` (ASCII case-insensitive).
pub fn contains_any_ignore_ascii_case(haystack: &str, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|needle| contains_ignore_ascii_case(haystack, needle))
}

// ─────────────────────────────────────────────────────────────────────────────
// XML Parsing Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Extracts text content from the first occurrence of an XML element.
///
/// Searches for an element by its local name (ignoring namespace prefixes)
/// and returns its decoded, trimmed text content.
///
/// # Example
/// ```ignore
/// let xml = r#"<u:CurrentTransportState>PLAYING</u:CurrentTransportState>"#;
/// assert_eq!(extract_xml_text(xml, "CurrentTransportState"), Some("PLAYING".to_string()));
/// ```
pub fn extract_xml_text(xml: &str, element_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let target_bytes = element_name.as_bytes();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == target_bytes => {
                if let Ok(text) = reader.read_text(e.name()) {
                    let decoded = html_escape::decode_html_entities(&text);
                    return Some(decoded.trim().to_string());
                }
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == target_bytes => {
                return Some(String::new());
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// XML Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Escapes XML special characters for embedding in XML content.
///
/// Used for SOAP arguments, which is how DIDL-Lite metadata travels inside
/// `CurrentURIMetaData`.
///
/// # Example
/// ```ignore
/// assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
/// assert_eq!(escape_xml("<title>"), "&lt;title&gt;");
/// ```
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ─────────────────────────────────────────────────────────────────────────────
// URL Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves a control/SCPD path from a device descriptor against its origin.
///
/// Absolute `http(s)://` URLs are kept, a missing leading `/` is added, and
/// an empty path stays empty (the service was not advertised).
pub fn absolutize_url(origin: &str, path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    if starts_with_ignore_ascii_case(path, "http://")
        || starts_with_ignore_ascii_case(path, "https://")
    {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", origin, path)
    } else {
        format!("{}/{}", origin, path)
    }
}

/// Builds `http://ip:port/path`, adding the leading `/` when missing.
pub fn build_control_url(ip: &str, port: &str, path: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };
    if path.starts_with('/') {
        format!("http://{}:{}{}", ip, port, path)
    } else {
        format!("http://{}:{}/{}", ip, port, path)
    }
}
