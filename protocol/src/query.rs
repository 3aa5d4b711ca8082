//! Query-string helpers that reproduce the transport's double percent-encoding
//!: each parameter value is percent-encoded individually, and the
//! whole combined `key=..&path=..` string is then percent-encoded again as a
//! single blob before it becomes the URL's query component. The server
//! reverses this by percent-decoding the raw query text once (undoing the
//! outer pass) before splitting on `&`/`=` and decoding each value.
//!
//! The outer pass is redundant once every value is already percent-encoded,
//! but it's kept as-is: a per-value-only encoding would be a different wire
//! format than what existing clients and servers already speak.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

const VALUE_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query string is not valid UTF-8 after decoding")]
    InvalidUtf8,
}

fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, VALUE_SAFE).to_string()
}

/// Builds the literal bytes to place after `?` in a request URL: each value
/// in `pairs` is percent-encoded, the pairs are joined with `&`/`=`, and the
/// entire result is percent-encoded once more.
#[must_use]
pub fn build_query(pairs: &[(&str, &str)]) -> String {
    let inner = pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_value(value)))
        .collect::<Vec<_>>()
        .join("&");
    encode_value(&inner)
}

/// Parses a raw query string produced by [`build_query`] back into key/value
/// pairs, reversing both encoding passes. Order is preserved; duplicate keys
/// are all returned.
pub fn parse_query(raw: &str) -> Result<Vec<(String, String)>, QueryError> {
    let inner = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| QueryError::InvalidUtf8)?
        .into_owned();

    inner
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_value = percent_decode_str(value)
                .decode_utf8()
                .map_err(|_| QueryError::InvalidUtf8)?
                .into_owned();
            Ok((key.to_string(), decoded_value))
        })
        .collect()
}

/// Convenience lookup over the pairs returned by [`parse_query`].
#[must_use]
pub fn get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_values() {
        let query = build_query(&[("key", "client-42"), ("path", "docs/report.txt")]);
        let parsed = parse_query(&query).unwrap();
        assert_eq!(get(&parsed, "key"), Some("client-42"));
        assert_eq!(get(&parsed, "path"), Some("docs/report.txt"));
    }

    #[test]
    fn round_trips_values_containing_separators() {
        // A value containing literal '&' and '=' must survive both encoding
        // passes without being mistaken for a parameter boundary.
        let query = build_query(&[("key", "a&b=c"), ("path", "weird?name=1.txt")]);
        let parsed = parse_query(&query).unwrap();
        assert_eq!(get(&parsed, "key"), Some("a&b=c"));
        assert_eq!(get(&parsed, "path"), Some("weird?name=1.txt"));
    }

    #[test]
    fn outer_pass_hides_separators_from_naive_splitting() {
        let query = build_query(&[("key", "K"), ("path", "a/b")]);
        // The raw wire text must not contain a literal '&' or '=' — that's
        // exactly the property the outer encoding pass is meant to provide.
        assert!(!query.contains('&'));
        assert!(!query.contains('='));
    }

    #[test]
    fn round_trips_unicode() {
        let query = build_query(&[("path", "café/résumé.txt")]);
        let parsed = parse_query(&query).unwrap();
        assert_eq!(get(&parsed, "path"), Some("café/résumé.txt"));
    }
}
