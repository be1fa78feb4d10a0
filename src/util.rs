//! Small shared helpers: text decoding, XML escaping and timestamps.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Decode bytes read from disk to a string.
///
/// Tries UTF-8 first (a BOM is handled by encoding_rs), then the encoding
/// named in an `<?xml encoding="..."?>` declaration, then Windows-1252,
/// which is common in older ebook sources.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(encoding) = declared_encoding(bytes) {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// The encoding named by the document's XML declaration, if it has one and
/// encoding_rs knows the label.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    // the declaration can only be the first event
    match reader.read_event_into(&mut buf).ok()? {
        Event::Decl(decl) => Encoding::for_label(&decl.encoding()?.ok()?),
        _ => None,
    }
}

/// Escape text for use in XML content or a double-quoted attribute.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Timestamp in the form used by `dcterms:modified` (`2024-01-31T12:00:00Z`).
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
