//! Chronicle API resources
//!
//! Typed builders for the resources of the Chronicle REST API. Each resource
//! holds its [`ResourcePath`] name and turns its methods into unsent
//! [`reqwest::Request`]s against a service endpoint.
//!
//! # Module Structure
//!
//! - [`path`] - Hierarchical resource names (`projects/.../instances/...`)
//! - [`request`] - Generic request construction shared by every resource
//! - [`instances`], [`log_types`], [`logs`], [`parsers`] - Per-resource builders
//!
//! # Example
//!
//! ```no_run
//! use chronicle_api::endpoint::service_endpoint;
//! use chronicle_api::resource::LogTypeResource;
//!
//! # fn main() -> chronicle_api::Result<()> {
//! let endpoint = service_endpoint("us", "v1alpha")?;
//! let log_types = LogTypeResource::new("my-project", "us", "my-instance", "").unwrap();
//! let request = log_types.list(&endpoint, "100", "")?;
//! assert_eq!(request.url().query(), Some("pageSize=100"));
//! # Ok(())
//! # }
//! ```

pub mod instances;
pub mod log_types;
pub mod logs;
pub mod parsers;
pub mod path;
pub mod request;

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub use instances::{valid_instance, InstanceResource};
pub use log_types::{ListLogTypesResponse, LogTypeResource};
pub use logs::{ListLogsResponse, LogLabel, LogResource};
pub use parsers::{ListParsersResponse, ParserResource};
pub use path::{PathSegment, ResourcePath};
pub use request::{build_request, common_query_params, QueryParams};

/// Standard base64, as the API expects for binary payloads
pub(crate) fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Serde adapter for byte fields carried as base64 strings
pub(crate) mod base64_bytes {
    use super::{encode_payload, STANDARD};
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_payload(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
