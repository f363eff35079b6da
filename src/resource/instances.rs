//! Chronicle instances
//!
//! <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances>

use super::path::ResourcePath;
use super::request;
use crate::error::Result;
use reqwest::Request;
use serde::{Deserialize, Serialize};
use url::Url;

/// An instance API resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResource {
    #[serde(default, skip_serializing_if = "ResourcePath::is_empty")]
    pub name: ResourcePath,
}

impl InstanceResource {
    /// `None` unless project, location and instance are all set
    pub fn new(project: &str, location: &str, instance: &str) -> Option<Self> {
        if !valid_instance(project, location, instance) {
            return None;
        }

        Some(Self {
            name: ResourcePath::new(project, location, instance),
        })
    }

    /// <https://cloud.google.com/chronicle/docs/reference/rest/v1alpha/projects.locations.instances/get>
    pub fn get(&self, endpoint: &Url) -> Result<Request> {
        request::get_request(endpoint, &self.name)
    }
}

/// Project, location and instance are required by every resource
pub fn valid_instance(project: &str, location: &str, instance: &str) -> bool {
    !(project.is_empty() || location.is_empty() || instance.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::request::body_bytes;
    use reqwest::Method;

    #[test]
    fn test_new_instance_resource() {
        let instance = InstanceResource::new("testproject", "us", "testinstance").unwrap();
        assert_eq!(
            instance.name.to_string(),
            "projects/testproject/locations/us/instances/testinstance"
        );
    }

    #[test]
    fn test_new_instance_resource_missing_fields() {
        assert!(InstanceResource::new("testproject", "us", "").is_none());
        assert!(InstanceResource::new("testproject", "", "testinstance").is_none());
        assert!(InstanceResource::new("", "us", "testinstance").is_none());
        assert!(InstanceResource::new("", "", "").is_none());
    }

    #[test]
    fn test_get() {
        let endpoint = Url::parse("https://test.local").unwrap();
        let request = InstanceResource::new("testproject", "us", "testinstance")
            .unwrap()
            .get(&endpoint)
            .unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            request.url().path(),
            "/projects/testproject/locations/us/instances/testinstance"
        );
        assert_eq!(request.url().query(), None);
        assert_eq!(body_bytes(&request), b"null");
    }

    #[test]
    fn test_deserialize() {
        let instance: InstanceResource = serde_json::from_str(
            r#"{"name": "projects/testproject/locations/us/instances/testinstance"}"#,
        )
        .unwrap();
        assert_eq!(instance, InstanceResource::new("testproject", "us", "testinstance").unwrap());
    }
}
