//! Parsers
//!
//! <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.parsers>

use super::instances::valid_instance;
use super::path::{ResourcePath, LOG_TYPES, PARSERS};
use super::request::{self, build_request, common_query_params};
use super::encode_payload;
use crate::error::Result;
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};
use url::Url;

/// A parser API resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserResource {
    #[serde(default, skip_serializing_if = "ResourcePath::is_empty")]
    pub name: ResourcePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelogs: Option<Changelogs>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parser_extension: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub parser_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validation_report: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub validated_on_empty_logs: bool,
    #[serde(default, with = "super::base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub cbn: Vec<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_stage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validation_stage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changelogs {
    #[serde(default)]
    pub entries: Vec<ChangeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub change_message: String,
}

/// Response of `parsers.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParsersResponse {
    #[serde(default)]
    pub parsers: Vec<ParserResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateParserBody {
    cbn: String,
    validated_on_empty_logs: bool,
}

impl ParserResource {
    /// `None` unless the instance identifiers and `log_type` are set
    ///
    /// An empty `parser_id` gives the `parsers` collection of the log type.
    pub fn new(project: &str, location: &str, instance: &str, log_type: &str, parser_id: &str) -> Option<Self> {
        if !valid_instance(project, location, instance) || log_type.is_empty() {
            return None;
        }

        Some(Self {
            name: ResourcePath::with_segments(
                project,
                location,
                instance,
                [(LOG_TYPES, log_type), (PARSERS, parser_id)],
            ),
            ..Default::default()
        })
    }

    /// Set the parser code sent by [`ParserResource::create`]
    pub fn with_cbn(mut self, cbn: impl Into<Vec<u8>>, validated_on_empty_logs: bool) -> Self {
        self.cbn = cbn.into();
        self.validated_on_empty_logs = validated_on_empty_logs;
        self
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.parsers/activate>
    pub fn activate(&self, endpoint: &Url) -> Result<Request> {
        request::activate_request(endpoint, &self.name)
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.parsers/deactivate>
    pub fn deactivate(&self, endpoint: &Url) -> Result<Request> {
        request::deactivate_request(endpoint, &self.name)
    }

    pub fn get(&self, endpoint: &Url) -> Result<Request> {
        request::get_request(endpoint, &self.name)
    }

    pub fn list(&self, endpoint: &Url, page_size: &str, page_token: &str, filter: &str) -> Result<Request> {
        request::list_request(
            endpoint,
            &self.name,
            &common_query_params(page_size, page_token, filter),
        )
    }

    /// POST the parser code to the log type's parsers collection
    ///
    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.parsers/create>
    pub fn create(&self, endpoint: &Url) -> Result<Request> {
        let body = CreateParserBody {
            cbn: encode_payload(&self.cbn),
            validated_on_empty_logs: self.validated_on_empty_logs,
        };

        build_request(
            Method::POST,
            endpoint,
            &self.name.strip_last_value(),
            None,
            Some(&body),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::resource::request::body_bytes;
    use serde_json::{json, Value};

    const BASE: &str = "projects/testproject/locations/us/instances/testinstance";
    const PARSER_ID: &str = "1234567890";

    fn parser(log_type: &str, parser_id: &str) -> Option<ParserResource> {
        ParserResource::new("testproject", "us", "testinstance", log_type, parser_id)
    }

    fn endpoint() -> Url {
        Url::parse("https://test.local").unwrap()
    }

    #[test]
    fn test_new_parser_resource() {
        assert_eq!(
            parser("WINEVTLOG", PARSER_ID).unwrap().name.to_string(),
            format!("{BASE}/logTypes/WINEVTLOG/parsers/{PARSER_ID}")
        );
        assert_eq!(
            parser("WINEVTLOG", "").unwrap().name.to_string(),
            format!("{BASE}/logTypes/WINEVTLOG/parsers")
        );
    }

    #[test]
    fn test_new_parser_resource_invalid() {
        assert!(parser("", "").is_none());
        assert!(parser("", PARSER_ID).is_none());
        assert!(ParserResource::new("testproject", "us", "", "", "").is_none());
        assert!(ParserResource::new("testproject", "", "", "", "").is_none());
        assert!(ParserResource::new("", "", "", "", "").is_none());
    }

    #[test]
    fn test_activate() {
        let request = parser("WINEVTLOG", PARSER_ID).unwrap().activate(&endpoint()).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().path(),
            format!("/{BASE}/logTypes/WINEVTLOG/parsers/{PARSER_ID}:activate")
        );
        assert_eq!(request.url().query(), None);
        assert_eq!(body_bytes(&request), b"null");
    }

    #[test]
    fn test_deactivate() {
        let request = parser("WINEVTLOG", PARSER_ID).unwrap().deactivate(&endpoint()).unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().path(),
            format!("/{BASE}/logTypes/WINEVTLOG/parsers/{PARSER_ID}:deactivate")
        );
    }

    #[test]
    fn test_activate_and_deactivate_need_parser_id() {
        let collection = parser("WINEVTLOG", "").unwrap();
        assert!(matches!(collection.activate(&endpoint()), Err(Error::MissingResourceValue)));
        assert!(matches!(collection.deactivate(&endpoint()), Err(Error::MissingResourceValue)));
    }

    #[test]
    fn test_create() {
        let request = parser("WINEVTLOG", PARSER_ID)
            .unwrap()
            .with_cbn("test cbn parser", true)
            .create(&endpoint())
            .unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), format!("/{BASE}/logTypes/WINEVTLOG/parsers"));
        let body: Value = serde_json::from_slice(body_bytes(&request)).unwrap();
        assert_eq!(
            body,
            json!({"cbn": "dGVzdCBjYm4gcGFyc2Vy", "validatedOnEmptyLogs": true})
        );
    }

    #[test]
    fn test_list() {
        let request = parser("WINEVTLOG", PARSER_ID)
            .unwrap()
            .list(&endpoint(), "", "", "state=ACTIVE")
            .unwrap();
        assert_eq!(request.url().path(), format!("/{BASE}/logTypes/WINEVTLOG/parsers"));
        assert_eq!(request.url().query(), Some("filter=state%3DACTIVE"));
    }

    #[test]
    fn test_deserialize_parser() {
        let parsed: ParserResource = serde_json::from_value(json!({
            "name": format!("{BASE}/logTypes/WINEVTLOG/parsers/{PARSER_ID}"),
            "type": "CUSTOM",
            "state": "ACTIVE",
            "cbn": "dGVzdCBjYm4gcGFyc2Vy",
            "creator": {"author": "someone@example.com"},
            "changelogs": {"entries": [{"createTime": "2024-01-01T00:00:00Z", "changeMessage": "init"}]}
        }))
        .unwrap();
        assert_eq!(parsed.parser_type, "CUSTOM");
        assert_eq!(parsed.cbn, b"test cbn parser");
        assert_eq!(parsed.creator.unwrap().author, "someone@example.com");
        assert_eq!(parsed.changelogs.unwrap().entries[0].change_message, "init");
    }
}
