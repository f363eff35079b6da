//! Chronicle Client
//!
//! Executes requests built by [`crate::resource`] with an authenticated HTTP
//! client.

use super::auth::{self, TokenSource};
use super::http::ChronicleHttpClient;
use anyhow::{Context, Result};
use reqwest::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Authenticated client bound to one service endpoint
#[derive(Clone)]
pub struct ChronicleClient {
    pub tokens: TokenSource,
    pub http: ChronicleHttpClient,
    endpoint: Url,
}

impl ChronicleClient {
    /// Create a client using ADC, impersonating `service_account` when given
    pub async fn new(endpoint: Url, service_account: Option<&str>) -> Result<Self> {
        let tokens = auth::token_source(service_account)
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_token_source(endpoint, tokens)
    }

    pub fn with_token_source(endpoint: Url, tokens: TokenSource) -> Result<Self> {
        Ok(Self {
            tokens,
            http: ChronicleHttpClient::new()?,
            endpoint,
        })
    }

    /// The API root requests should be built against
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send a built request and return the JSON response
    pub async fn execute(&self, request: Request) -> Result<Value> {
        let token = self.tokens.token().await?;
        self.http.send(request, &token).await
    }

    /// Send a built request and decode the response into `T`
    pub async fn execute_as<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.execute(request).await?;
        serde_json::from_value(response).context("Unexpected response shape")
    }

    /// Fetch every page of a list method
    ///
    /// `build_page` receives the page token (empty for the first page) and
    /// returns the request for that page. Items are read from `items_key`.
    pub async fn list_all<F>(&self, mut build_page: F, items_key: &str) -> Result<Vec<Value>>
    where
        F: FnMut(&str) -> crate::Result<Request>,
    {
        let mut all_items = Vec::new();
        let mut page_token = String::new();

        loop {
            let request = build_page(&page_token)?;
            let response = self.execute(request).await?;

            if let Some(items) = response.get(items_key).and_then(|v| v.as_array()) {
                all_items.extend(items.iter().cloned());
            }

            match response.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(next) if !next.is_empty() => page_token = next.to_string(),
                _ => break,
            }
        }

        tracing::debug!("Fetched {} {}", all_items.len(), items_key);

        Ok(all_items)
    }
}
