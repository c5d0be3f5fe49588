//! Query string decoding
//!
//! Parses `application/x-www-form-urlencoded` query strings: pairs split on
//! `&`, key and value split on the first `=`, `+` means space, then
//! percent-decoding.

use std::collections::BTreeMap;

/// Decode one form-encoded component, keeping the raw text if it is not valid UTF-8
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Parse a query string into a map; for repeated keys the first value wins
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_query() {
        assert!(parse_query(None).is_empty());
        assert!(parse_query(Some("")).is_empty());
    }

    #[test]
    fn test_encoded_json() {
        let params = parse_query(Some(
            "action=add&data=%7B%22Date%22%3A%222024-01-05%22%2C%22Officer+Name%22%3A%22J.%20Smith%22%7D",
        ));
        assert_eq!(params["action"], "add");
        assert_eq!(
            params["data"],
            r#"{"Date":"2024-01-05","Officer Name":"J. Smith"}"#
        );
    }

    #[test]
    fn test_first_value_wins_and_bare_keys() {
        let params = parse_query(Some("action=add&action=test&flag&&x=a%2Bb"));
        assert_eq!(params["action"], "add");
        assert_eq!(params["flag"], "");
        assert_eq!(params["x"], "a+b");
    }

    #[test]
    fn test_invalid_utf8_kept_raw() {
        let params = parse_query(Some("data=%FF"));
        assert_eq!(params["data"], "%FF");
    }
}
