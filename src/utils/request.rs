use std::borrow::Cow;

use http::{HeaderMap, Uri};
use percent_encoding::percent_decode_str;

/// Extracts the value of a specific query parameter from the request URI.
///
/// Returns the first occurrence of the parameter's value, with `+` and
/// percent escapes decoded. A key-only parameter yields an empty string.
pub fn get_query_value<'a>(uri: &'a Uri, name: &str) -> Option<Cow<'a, str>> {
    uri.query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k) == name).then(|| decode_component(v.trim()))
        })
    })
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if raw.contains('+') {
        let spaced = raw.replace('+', " ");
        Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
    } else {
        percent_decode_str(raw).decode_utf8_lossy()
    }
}

/// Retrieves the value of a specific header from the request.
///
/// Returns `None` if the header is not present or its value is not valid UTF-8.
pub fn get_req_header_value<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn test_get_query_value() {
        let uri: Uri = "/index?page=Register&debug&lang=de".parse().unwrap();
        assert_eq!(get_query_value(&uri, "page").as_deref(), Some("Register"));
        assert_eq!(get_query_value(&uri, "debug").as_deref(), Some(""));
        assert_eq!(get_query_value(&uri, "missing"), None);

        let uri: Uri = "/index".parse().unwrap();
        assert_eq!(get_query_value(&uri, "page"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let uri: Uri = "/?page=A&page=B".parse().unwrap();
        assert_eq!(get_query_value(&uri, "page").as_deref(), Some("A"));
    }

    #[test]
    fn test_query_value_is_decoded() {
        let uri: Uri = "/?page=Lost%5FPassword&q=a+b%20c&na%6De=x".parse().unwrap();
        assert_eq!(get_query_value(&uri, "page").as_deref(), Some("Lost_Password"));
        assert_eq!(get_query_value(&uri, "q").as_deref(), Some("a b c"));
        assert_eq!(get_query_value(&uri, "name").as_deref(), Some("x"));
    }

    #[test]
    fn test_get_req_header_value() {
        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert_eq!(
            get_req_header_value(&headers, "X-Requested-With"),
            Some("XMLHttpRequest")
        );
        assert_eq!(get_req_header_value(&headers, "x-api-key"), None);
    }
}
