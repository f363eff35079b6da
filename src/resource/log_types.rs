//! Log types
//!
//! <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes>

use super::instances::valid_instance;
use super::path::{ResourcePath, LOG_TYPES};
use super::request::{self, build_request, common_query_params};
use super::encode_payload;
use crate::error::{Error, Result};
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};
use url::Url;

/// A log type API resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTypeResource {
    #[serde(default, skip_serializing_if = "ResourcePath::is_empty")]
    pub name: ResourcePath,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub golden: bool,
}

/// Response of `logTypes.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLogTypesResponse {
    #[serde(default)]
    pub log_types: Vec<LogTypeResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunParserBody {
    parser: ParserPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    parser_extension: Option<ParserExtensionPayload>,
    log: Vec<String>,
    statedump_allowed: bool,
}

#[derive(Serialize)]
struct ParserPayload {
    cbn: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParserExtensionPayload {
    cbn_snippet: String,
}

impl LogTypeResource {
    /// An empty `log_type` gives the `logTypes` collection
    pub fn new(project: &str, location: &str, instance: &str, log_type: &str) -> Option<Self> {
        if !valid_instance(project, location, instance) {
            return None;
        }

        Some(Self {
            name: ResourcePath::new(project, location, instance).with(LOG_TYPES, log_type),
            ..Default::default()
        })
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes/get>
    pub fn get(&self, endpoint: &Url) -> Result<Request> {
        request::get_request(endpoint, &self.name)
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes/list>
    pub fn list(&self, endpoint: &Url, page_size: &str, page_token: &str) -> Result<Request> {
        request::list_request(
            endpoint,
            &self.name,
            &common_query_params(page_size, page_token, ""),
        )
    }

    /// Run a parser (and optional extension) over sample logs
    ///
    /// Payloads are base64 encoded into the body. `parser_extension` is only
    /// sent when `cbn_snippet` is non-empty.
    ///
    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes/runParser>
    pub fn run_parser<L: AsRef<[u8]>>(
        &self,
        endpoint: &Url,
        cbn: &[u8],
        cbn_snippet: &[u8],
        logs: &[L],
        statedump_allowed: bool,
    ) -> Result<Request> {
        if cbn.is_empty() {
            return Err(Error::MissingPayload);
        }

        let body = RunParserBody {
            parser: ParserPayload {
                cbn: encode_payload(cbn),
            },
            parser_extension: (!cbn_snippet.is_empty()).then(|| ParserExtensionPayload {
                cbn_snippet: encode_payload(cbn_snippet),
            }),
            log: logs.iter().map(|l| encode_payload(l.as_ref())).collect(),
            statedump_allowed,
        };

        build_request(
            Method::POST,
            endpoint,
            &format!("{}:runParser", self.name),
            None,
            Some(&body),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::request::body_bytes;
    use serde_json::{json, Value};

    const BASE: &str = "projects/testproject/locations/us/instances/testinstance";

    fn log_type(log_type: &str) -> LogTypeResource {
        LogTypeResource::new("testproject", "us", "testinstance", log_type).unwrap()
    }

    fn endpoint() -> Url {
        Url::parse("https://test.local").unwrap()
    }

    fn body_json(request: &Request) -> Value {
        serde_json::from_slice(body_bytes(request)).unwrap()
    }

    #[test]
    fn test_new_log_type_resource() {
        assert_eq!(log_type("WINEVTLOG").name.to_string(), format!("{BASE}/logTypes/WINEVTLOG"));
        assert_eq!(log_type("").name.to_string(), format!("{BASE}/logTypes"));

        assert!(LogTypeResource::new("testproject", "us", "", "").is_none());
        assert!(LogTypeResource::new("testproject", "", "", "").is_none());
        assert!(LogTypeResource::new("", "", "", "").is_none());
    }

    #[test]
    fn test_get() {
        let request = log_type("WINEVTLOG").get(&endpoint()).unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().path(), format!("/{BASE}/logTypes/WINEVTLOG"));
        assert_eq!(body_json(&request), Value::Null);
    }

    #[test]
    fn test_get_missing_log_type() {
        let err = log_type("").get(&endpoint()).unwrap_err();
        assert!(matches!(err, Error::MissingResourceValue));
    }

    #[test]
    fn test_list_without_query() {
        let request = log_type("").list(&endpoint(), "", "").unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().path(), format!("/{BASE}/logTypes"));
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_list_with_query() {
        for name in ["", "WINEVTLOG"] {
            let request = log_type(name).list(&endpoint(), "100", "abcdefg").unwrap();
            assert_eq!(request.url().path(), format!("/{BASE}/logTypes"));
            assert_eq!(request.url().query(), Some("pageSize=100&pageToken=abcdefg"));
        }
    }

    #[test]
    fn test_run_parser_without_cbn() {
        let err = log_type("WINEVTLOG")
            .run_parser(&endpoint(), b"", b"snippet", &[b"log message"], true)
            .unwrap_err();
        assert!(matches!(err, Error::MissingPayload));
    }

    #[test]
    fn test_run_parser_with_empty_log() {
        let request = log_type("WINEVTLOG")
            .run_parser(&endpoint(), b"test cbn parser", b"", &[b""], true)
            .unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), format!("/{BASE}/logTypes/WINEVTLOG:runParser"));
        assert_eq!(
            body_json(&request),
            json!({
                "parser": {"cbn": "dGVzdCBjYm4gcGFyc2Vy"},
                "log": [""],
                "statedumpAllowed": true
            })
        );
    }

    #[test]
    fn test_run_parser_with_log() {
        let request = log_type("WINEVTLOG")
            .run_parser(&endpoint(), b"test cbn parser", b"", &[b"log message"], true)
            .unwrap();
        assert_eq!(
            std::str::from_utf8(body_bytes(&request)).unwrap(),
            r#"{"parser":{"cbn":"dGVzdCBjYm4gcGFyc2Vy"},"log":["bG9nIG1lc3NhZ2U="],"statedumpAllowed":true}"#
        );
    }

    #[test]
    fn test_run_parser_with_extension() {
        let request = log_type("WINEVTLOG")
            .run_parser(&endpoint(), b"test cbn parser", b"test cbn snippet", &[b"log message"], false)
            .unwrap();
        assert_eq!(
            body_json(&request),
            json!({
                "parser": {"cbn": "dGVzdCBjYm4gcGFyc2Vy"},
                "parserExtension": {"cbnSnippet": "dGVzdCBjYm4gc25pcHBldA=="},
                "log": ["bG9nIG1lc3NhZ2U="],
                "statedumpAllowed": false
            })
        );
    }

    #[test]
    fn test_list_response() {
        let response: ListLogTypesResponse = serde_json::from_value(json!({
            "logTypes": [
                {"name": format!("{BASE}/logTypes/WINEVTLOG"), "displayName": "Windows Event Log", "golden": true}
            ],
            "nextPageToken": "next"
        }))
        .unwrap();
        assert_eq!(response.log_types.len(), 1);
        assert_eq!(response.log_types[0].display_name, "Windows Event Log");
        assert!(response.log_types[0].golden);
        assert_eq!(response.next_page_token.as_deref(), Some("next"));
    }
}
