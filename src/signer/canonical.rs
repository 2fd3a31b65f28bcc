//! Parameter canonicalization
//!
//! Two encodings share one sort order (byte-wise ascending by key):
//!
//! * form encoding, as produced by PHP's `http_build_query`: alphanumerics and
//!   `-_.` pass through, space becomes `+`, everything else is `%XX`. Postback
//!   signatures and URL query strings use it.
//! * RFC 3986 encoding: alphanumerics and `-_.~` pass through, everything else
//!   (space included) is `%XX`. The OAuth 1.0 signature base string uses it.
//!
//! Swapping one table for the other invalidates every signature.

use std::borrow::Cow;

use crate::core::{Error, ParameterSet, Result};

/// RFC 3986 percent-encoding
pub fn rfc3986_encode(input: &str) -> Cow<'_, str> {
    urlencoding::encode(input)
}

/// `application/x-www-form-urlencoded` encoding with PHP's reserved table
pub fn form_encode(input: &str) -> String {
    // urlencoding leaves `~` alone and never emits a bare `+`
    urlencoding::encode(input).replace("%20", "+").replace('~', "%7E")
}

/// Form-encoded `k=v&...` in canonical (sorted) order
pub fn canonicalize(params: &ParameterSet) -> String {
    params
        .sorted()
        .into_iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 encoded `k=v&...` in canonical (sorted) order
pub fn canonicalize_rfc3986(params: &ParameterSet) -> String {
    let mut encoded: Vec<(Cow<'_, str>, Cow<'_, str>)> = params
        .iter()
        .map(|(k, v)| (rfc3986_encode(k), rfc3986_encode(v)))
        .collect();
    encoded.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()).then(a.1.as_bytes().cmp(b.1.as_bytes())));

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Form-encoded `k=v&...` in insertion order, for URLs and request bodies
pub fn build_query(params: &ParameterSet) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a form-encoded blob. Later duplicates overwrite earlier ones.
pub fn form_decode(blob: &str) -> Result<ParameterSet> {
    let mut params = ParameterSet::new();
    for pair in blob.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(form_decode_component(k)?, form_decode_component(v)?);
    }
    Ok(params)
}

fn form_decode_component(component: &str) -> Result<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| Error::MalformedResource(format!("invalid form encoding: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_encode_table() {
        assert_eq!(form_encode("Log In"), "Log+In");
        assert_eq!(form_encode("jdoe@example.com"), "jdoe%40example.com");
        assert_eq!(form_encode("a-b_c.d~e*f"), "a-b_c.d%7Ee%2Af");
        assert_eq!(form_encode("NkaWUjEPRLwgsQMEJGsIQEpyRT4="), "NkaWUjEPRLwgsQMEJGsIQEpyRT4%3D");
        assert_eq!(form_encode("a+b/c"), "a%2Bb%2Fc");
        assert_eq!(form_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_rfc3986_encode_table() {
        assert_eq!(rfc3986_encode("Log In"), "Log%20In");
        assert_eq!(rfc3986_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(
            rfc3986_encode("https://api.toopher.test/v1/web/authenticate"),
            "https%3A%2F%2Fapi.toopher.test%2Fv1%2Fweb%2Fauthenticate"
        );
    }

    #[test]
    fn test_canonicalize_sorts() {
        let params: ParameterSet = [("timestamp", "1000"), ("foo", "bar"), ("session_token", "s9s7vsb")]
            .into_iter()
            .collect();
        assert_eq!(canonicalize(&params), "foo=bar&session_token=s9s7vsb&timestamp=1000");
    }

    #[test]
    fn test_canonicalize_order_independent() {
        let entries = [("reason", "it is a test"), ("id", "1"), ("user_name", "user name"), ("a", "~")];
        let forward: ParameterSet = entries.into_iter().collect();
        let backward: ParameterSet = entries.into_iter().rev().collect();
        let rotated: ParameterSet = entries[2..].iter().chain(entries[..2].iter()).copied().collect();

        assert_eq!(canonicalize(&forward), canonicalize(&backward));
        assert_eq!(canonicalize(&forward), canonicalize(&rotated));
        assert_eq!(canonicalize_rfc3986(&forward), canonicalize_rfc3986(&backward));
    }

    #[test]
    fn test_canonicalize_rfc3986() {
        let params = ParameterSet::new().with("b", "x y").with("a", "1");
        assert_eq!(canonicalize_rfc3986(&params), "a=1&b=x%20y");
    }

    #[test]
    fn test_build_query_keeps_insertion_order() {
        let params = ParameterSet::new().with("username", "jdoe").with("reset_email", "").with("action_name", "Log In");
        assert_eq!(build_query(&params), "username=jdoe&reset_email=&action_name=Log+In");
    }

    #[test]
    fn test_form_decode() {
        let params = form_decode("reason=it+is+a+test&email=jdoe%40example.com&empty=&flag").unwrap();
        assert_eq!(params.get("reason"), Some("it is a test"));
        assert_eq!(params.get("email"), Some("jdoe@example.com"));
        assert_eq!(params.get("empty"), Some(""));
        assert_eq!(params.get("flag"), Some(""));
    }

    #[test]
    fn test_form_decode_rejects_invalid_utf8() {
        assert!(matches!(form_decode("a=%FF"), Err(Error::MalformedResource(_))));
    }
}
