//! URL normalization
//!
//! Two URLs that differ only in incidental percent-encoding must map to the
//! same artifact, so the path is re-encoded segment by segment and the query
//! string is parsed into pairs and serialized again. Scheme, host and
//! fragment are kept as the URL parser reports them.

use crate::error::{Error, Result};
use url::{Url, form_urlencoded};

/// Canonicalize an absolute URL
///
/// Duplicate query keys keep their order. An empty query (`?` alone) is dropped.
///
/// # Examples
///
/// ```
/// use schedule_ingest::normalize::normalize_url;
///
/// let a = normalize_url("https://example.com/files/r%C3%A9sum%C3%A9.pdf?q=a%20b").unwrap();
/// let b = normalize_url("https://example.com/files/résumé.pdf?q=a+b").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !url.cannot_be_a_base() {
        let path = encode_path(url.path());
        url.set_path(&path);
    }

    if url.query().is_some() {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&pairs)
                .finish();
            url.set_query(Some(&query));
        }
    }

    Ok(url.to_string())
}

/// Percent-encode every path segment, keeping `/` separators
///
/// Segments are decoded first so already-encoded input is not encoded twice.
/// A segment whose escapes do not decode to UTF-8 is kept verbatim.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) => urlencoding::encode(&decoded).into_owned(),
            Err(_) => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_is_unchanged() {
        assert_eq!(
            normalize_url("https://x/schedule#text").unwrap(),
            "https://x/schedule#text"
        );
        assert_eq!(
            normalize_url("https://example.com/a/b.png").unwrap(),
            "https://example.com/a/b.png"
        );
    }

    #[test]
    fn query_encoding_variants_normalize_identically() {
        let variants = [
            "https://example.com/list?name=a%20b&id=%31",
            "https://example.com/list?name=a+b&id=1",
            "https://example.com/list?name=a b&id=1",
        ];
        let normalized: Vec<_> = variants
            .iter()
            .map(|u| normalize_url(u).unwrap())
            .collect();

        assert!(normalized.iter().all(|n| n == &normalized[0]));
        assert_eq!(normalized[0], "https://example.com/list?name=a+b&id=1");
    }

    #[test]
    fn duplicate_query_keys_keep_order() {
        assert_eq!(
            normalize_url("https://example.com/f?tag=b&tag=a&x=1").unwrap(),
            "https://example.com/f?tag=b&tag=a&x=1"
        );
    }

    #[test]
    fn path_is_percent_encoded_once() {
        let decoded = normalize_url("https://example.com/files/Рейтинг 2026.pdf").unwrap();
        let encoded = normalize_url(
            "https://example.com/files/%D0%A0%D0%B5%D0%B9%D1%82%D0%B8%D0%BD%D0%B3%202026.pdf",
        )
        .unwrap();

        assert_eq!(decoded, encoded);
        assert!(decoded.ends_with("/files/%D0%A0%D0%B5%D0%B9%D1%82%D0%B8%D0%BD%D0%B3%202026.pdf"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_url("https://example.com/a b/c%2Bd?q=1+2&r=%26").unwrap();
        let twice = normalize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_query_is_dropped() {
        assert_eq!(
            normalize_url("https://example.com/page?").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn fragment_is_preserved() {
        assert_eq!(
            normalize_url("https://example.com/page?b=2#text").unwrap(),
            "https://example.com/page?b=2#text"
        );
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = normalize_url("/just/a/path").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }
}
