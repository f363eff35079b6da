//! Request Builder
//!
//! Turns a resource path, optional query parameters and an optional JSON body
//! into an unsent [`reqwest::Request`]. Nothing here touches the network; the
//! request is executed later by [`crate::gcp::client::ChronicleClient`] or any
//! other `reqwest::Client`.

use super::path::ResourcePath;
use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method, Request};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Query parameters, encoded in key order
pub type QueryParams = BTreeMap<String, String>;

/// Build a request for `path` below `endpoint`
///
/// An absent body is sent as the JSON literal `null`.
pub fn build_request<B>(
    method: Method,
    endpoint: &Url,
    path: &str,
    query: Option<&QueryParams>,
    body: Option<&B>,
) -> Result<Request>
where
    B: Serialize + ?Sized,
{
    let mut url = join_path(endpoint, path);
    if let Some(query) = query {
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(query.iter());
        }
    }

    let bytes = serde_json::to_vec(&body)?;

    let mut request = Request::new(method, url);
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *request.body_mut() = Some(Body::from(bytes));

    Ok(request)
}

/// Paging and filtering parameters shared by the list methods
///
/// Empty values are left out.
pub fn common_query_params(page_size: &str, page_token: &str, filter: &str) -> QueryParams {
    [("pageSize", page_size), ("pageToken", page_token), ("filter", filter)]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// GET a single resource
pub fn get_request(endpoint: &Url, path: &ResourcePath) -> Result<Request> {
    if !path.has_value() {
        return Err(Error::MissingResourceValue);
    }
    build_request(Method::GET, endpoint, &path.to_string(), None, None::<&Value>)
}

/// GET the collection that encloses `path`
pub fn list_request(endpoint: &Url, path: &ResourcePath, query: &QueryParams) -> Result<Request> {
    build_request(
        Method::GET,
        endpoint,
        &path.strip_last_value(),
        Some(query),
        None::<&Value>,
    )
}

pub fn activate_request(endpoint: &Url, path: &ResourcePath) -> Result<Request> {
    custom_method_request(endpoint, path, "activate")
}

pub fn deactivate_request(endpoint: &Url, path: &ResourcePath) -> Result<Request> {
    custom_method_request(endpoint, path, "deactivate")
}

/// POST `{path}:{verb}` with no body
fn custom_method_request(endpoint: &Url, path: &ResourcePath, verb: &str) -> Result<Request> {
    if !path.has_value() {
        return Err(Error::MissingResourceValue);
    }
    build_request(
        Method::POST,
        endpoint,
        &format!("{path}:{verb}"),
        None,
        None::<&Value>,
    )
}

/// Append `path` to the endpoint's own path, keeping its version segment
fn join_path(endpoint: &Url, path: &str) -> Url {
    let mut url = endpoint.clone();
    let base = endpoint.path().trim_end_matches('/');
    url.set_path(&format!("{}/{}", base, path.trim_start_matches('/')));
    url
}

/// Body bytes of a built request
///
/// Requests from this module always carry an in-memory body.
pub fn body_bytes(request: &Request) -> &[u8] {
    request
        .body()
        .and_then(Body::as_bytes)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("https://example.local").unwrap()
    }

    #[test]
    fn test_join_keeps_version_segment() {
        let endpoint = Url::parse("https://us-chronicle.googleapis.com/v1alpha").unwrap();
        let request = build_request(
            Method::GET,
            &endpoint,
            "projects/p/locations/us/instances/i",
            None,
            None::<&Value>,
        )
        .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://us-chronicle.googleapis.com/v1alpha/projects/p/locations/us/instances/i"
        );
    }

    #[test]
    fn test_absent_body_is_null() {
        let request = build_request(Method::POST, &endpoint(), "a/b", None, None::<&Value>).unwrap();
        assert_eq!(body_bytes(&request), b"null");
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_body_is_serialized() {
        let body = json!({"cbn": "abc"});
        let request = build_request(Method::POST, &endpoint(), "a/b", None, Some(&body)).unwrap();
        assert_eq!(body_bytes(&request), br#"{"cbn":"abc"}"#);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("body cannot be encoded"))
        }
    }

    #[test]
    fn test_body_serialization_failure() {
        let result = build_request(Method::POST, &endpoint(), "a/b", None, Some(&Unserializable));
        match result {
            Err(Error::Serialization(err)) => assert!(err.to_string().contains("body cannot be encoded")),
            other => panic!("expected serialization error, got {:?}", other.map(|r| r.url().clone())),
        }
    }

    #[test]
    fn test_query_is_sorted() {
        let query = common_query_params("100", "abcdefg", "filterquery");
        let request = build_request(Method::GET, &endpoint(), "x", Some(&query), None::<&Value>).unwrap();
        assert_eq!(
            request.url().query(),
            Some("filter=filterquery&pageSize=100&pageToken=abcdefg")
        );
    }

    #[test]
    fn test_empty_query_adds_nothing() {
        let query = common_query_params("", "", "");
        assert!(query.is_empty());
        let request = build_request(Method::GET, &endpoint(), "x", Some(&query), None::<&Value>).unwrap();
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_common_query_params_skips_empty() {
        let query = common_query_params("10", "", "f");
        assert_eq!(query.len(), 2);
        assert!(!query.contains_key("pageToken"));
    }

    #[test]
    fn test_get_requires_value() {
        let path = ResourcePath::new("p", "us", "i").with("logTypes", "");
        assert!(matches!(
            get_request(&endpoint(), &path),
            Err(Error::MissingResourceValue)
        ));
    }

    #[test]
    fn test_activate_and_deactivate_paths() {
        let path = ResourcePath::new("p", "us", "i").with("parsers", "42");

        let request = activate_request(&endpoint(), &path).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().path(),
            "/projects/p/locations/us/instances/i/parsers/42:activate"
        );

        let request = deactivate_request(&endpoint(), &path).unwrap();
        assert_eq!(
            request.url().path(),
            "/projects/p/locations/us/instances/i/parsers/42:deactivate"
        );
        assert_eq!(body_bytes(&request), b"null");
    }

    #[test]
    fn test_list_strips_last_value() {
        let path = ResourcePath::new("p", "us", "i").with("logTypes", "WINEVTLOG");
        let request = list_request(&endpoint(), &path, &QueryParams::new()).unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().path(), "/projects/p/locations/us/instances/i/logTypes");
    }
}
