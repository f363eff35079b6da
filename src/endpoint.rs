//! Service endpoint

use crate::error::Result;
use url::Url;

pub const BASE_SERVICE_ENDPOINT: &str = "chronicle.googleapis.com";

pub const DEFAULT_API_VERSION: &str = "v1alpha";

/// Build the regional, versioned API root
///
/// `service_endpoint("us", "v1alpha")` is `https://us-chronicle.googleapis.com/v1alpha`.
pub fn service_endpoint(region: &str, version: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("https://{}-{}", region, BASE_SERVICE_ENDPOINT))?;
    url.set_path(version.trim_matches('/'));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_endpoint() {
        let url = service_endpoint("us", "v1alpha").unwrap();
        assert_eq!(url.as_str(), "https://us-chronicle.googleapis.com/v1alpha");
    }

    #[test]
    fn test_service_endpoint_other_region() {
        let url = service_endpoint("europe-west2", "v1").unwrap();
        assert_eq!(url.host_str(), Some("europe-west2-chronicle.googleapis.com"));
        assert_eq!(url.path(), "/v1");
    }

    #[test]
    fn test_invalid_region() {
        assert!(service_endpoint("bad region", "v1").is_err());
    }
}
