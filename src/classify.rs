//! Content classification
//!
//! Maps a declared MIME type onto a [`SourceType`] and detects HTML error pages
//! served in place of an artifact.

use crate::types::SourceType;

/// How many leading bytes are inspected when sniffing for HTML
const SNIFF_WINDOW: usize = 512;

/// Strip parameters and normalize case: `"Text/HTML; charset=utf-8"` → `"text/html"`
pub fn mime_essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether the declared type belongs to the HTML family
pub fn is_html_family(mime_type: &str) -> bool {
    matches!(
        mime_essence(mime_type).as_str(),
        "text/html" | "application/xhtml+xml"
    )
}

/// Classify a declared MIME type
///
/// Unknown and missing types fall back to [`SourceType::Html`]; upstream
/// responses without a content type are usually pages.
#[must_use]
pub fn classify(mime_type: &str) -> SourceType {
    match mime_essence(mime_type).as_str() {
        "text/html" | "application/xhtml+xml" => SourceType::Html,
        "text/plain" => SourceType::Text,
        "application/pdf" => SourceType::Pdf,
        "image/png" => SourceType::Png,
        "image/jpeg" => SourceType::Jpg,
        "image/webp" => SourceType::Webp,
        _ => SourceType::Html,
    }
}

/// Check whether a payload starts like an HTML document
///
/// Looks at the first 512 bytes after leading whitespace, case-insensitively,
/// for a doctype or an `<html` tag.
#[must_use]
pub fn looks_like_html(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data.len().min(start + SNIFF_WINDOW);
    let head = data[start..end].to_ascii_lowercase();

    head.starts_with(b"<!doctype html")
        || head.windows(b"<html".len()).any(|w| w == b"<html")
}

/// Verdict of the HTML guard for a payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Store the payload under this effective MIME type
    Accept(String),
    /// The payload is an HTML page masquerading as text
    Reject,
}

/// Run the HTML guard for a payload
///
/// A payload declared as HTML-family is inspected wherever it came from, and a
/// text-expected payload is inspected whatever it declares. Inspected payloads
/// that sniff as HTML are rejected: upstream served an error or login page in
/// place of the artifact. Those declared HTML but not looking like it are
/// corrected to `text/plain`. Other declared types pass through untouched.
pub fn guard(data: &[u8], declared_mime: &str, expect_text: bool) -> GuardVerdict {
    let declared = declared_mime.trim();
    let html_family = is_html_family(declared);
    if !expect_text && !html_family {
        return GuardVerdict::Accept(declared.to_string());
    }
    if looks_like_html(data) {
        return GuardVerdict::Reject;
    }
    if html_family || declared.is_empty() {
        return GuardVerdict::Accept(SourceType::Text.mime_type().to_string());
    }
    GuardVerdict::Accept(declared.to_string())
}
