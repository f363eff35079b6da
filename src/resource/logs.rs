//! Logs
//!
//! <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.logs>

use super::instances::valid_instance;
use super::path::{ResourcePath, LOGS, LOG_TYPES};
use super::request::{self, common_query_params};
use crate::error::Result;
use reqwest::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

/// A log API resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResource {
    #[serde(default, skip_serializing_if = "ResourcePath::is_empty")]
    pub name: ResourcePath,
    /// Raw log bytes, base64 encoded by the service
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_entry_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub environment_namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, LogLabel>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additionals: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLabel {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default)]
    pub rbac_enabled: bool,
}

/// Response of `logs.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLogsResponse {
    #[serde(default)]
    pub logs: Vec<LogResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl LogResource {
    /// `None` unless the instance identifiers and `log_type` are set
    ///
    /// An empty `log_id` gives the `logs` collection of the log type.
    pub fn new(project: &str, location: &str, instance: &str, log_type: &str, log_id: &str) -> Option<Self> {
        if !valid_instance(project, location, instance) || log_type.is_empty() {
            return None;
        }

        Some(Self {
            name: ResourcePath::with_segments(
                project,
                location,
                instance,
                [(LOG_TYPES, log_type), (LOGS, log_id)],
            ),
            ..Default::default()
        })
    }

    pub fn get(&self, endpoint: &Url) -> Result<Request> {
        request::get_request(endpoint, &self.name)
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances.logTypes.logs/list>
    pub fn list(&self, endpoint: &Url, page_size: &str, page_token: &str, filter: &str) -> Result<Request> {
        request::list_request(
            endpoint,
            &self.name,
            &common_query_params(page_size, page_token, filter),
        )
    }
}
