//! GCP API interaction module
//!
//! Authentication and transport for requests built by [`crate::resource`].
//!
//! # Module Structure
//!
//! - [`auth`] - Token sources: ADC, fixed tokens, service account impersonation
//! - [`client`] - Authenticated client that executes built requests
//! - [`http`] - HTTP transport and error formatting
//!
//! # Example
//!
//! ```no_run
//! use chronicle_api::endpoint::service_endpoint;
//! use chronicle_api::gcp::client::ChronicleClient;
//! use chronicle_api::resource::InstanceResource;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let endpoint = service_endpoint("us", "v1alpha")?;
//!     let client = ChronicleClient::new(endpoint, None).await?;
//!     let instance = InstanceResource::new("my-project", "us", "my-instance").unwrap();
//!     let response = client.execute(instance.get(client.endpoint())?).await?;
//!     println!("{response}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
