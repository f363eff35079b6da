//! GCP Authentication
//!
//! Bearer tokens for the Chronicle API, from Application Default Credentials
//! (ADC) or from a fixed access token, optionally exchanged for a token of an
//! impersonated service account through the IAM Credentials API.

use super::http::ChronicleHttpClient;
use crate::resource::request::build_request;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// The only OAuth scope the API needs
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const DEFAULT_SCOPES: &[&str] = &[CLOUD_PLATFORM_SCOPE];

pub const IAM_CREDENTIALS_ENDPOINT: &str = "https://iamcredentials.googleapis.com/v1";

/// Refresh tokens this long before they expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Assumed lifetime of ADC tokens (gcp_auth refreshes its own cache underneath)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Lifetime requested for impersonated tokens
const IMPERSONATED_TOKEN_LIFETIME: &str = "3600s";

#[derive(Clone)]
enum BaseCredential {
    ApplicationDefault(Arc<dyn TokenProvider>),
    AccessToken(String),
}

#[derive(Clone)]
struct Impersonation {
    service_account: String,
    iam_endpoint: Url,
    http: ChronicleHttpClient,
}

#[derive(Serialize)]
struct GenerateAccessTokenRequest<'a> {
    scope: &'a [&'a str],
    lifetime: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: DateTime<Utc>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Source of bearer tokens, with caching
#[derive(Clone)]
pub struct TokenSource {
    base: BaseCredential,
    impersonation: Option<Impersonation>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenSource {
    /// Use Application Default Credentials
    pub async fn default_credentials() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
        )?;

        Ok(Self::from_base(BaseCredential::ApplicationDefault(provider)))
    }

    /// Use a token obtained elsewhere, e.g. `gcloud auth print-access-token`
    pub fn from_access_token(token: impl Into<String>) -> Self {
        Self::from_base(BaseCredential::AccessToken(token.into()))
    }

    fn from_base(base: BaseCredential) -> Self {
        Self {
            base,
            impersonation: None,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Mint tokens for `service_account` using the current credential
    pub fn impersonate(self, service_account: &str) -> Result<Self> {
        let iam_endpoint = Url::parse(IAM_CREDENTIALS_ENDPOINT)?;
        Ok(Self {
            impersonation: Some(Impersonation {
                service_account: service_account.to_string(),
                iam_endpoint,
                http: ChronicleHttpClient::new()?,
            }),
            token_cache: Arc::new(RwLock::new(None)),
            ..self
        })
    }

    /// Point impersonation at another IAM Credentials endpoint
    pub fn with_iam_endpoint(mut self, iam_endpoint: Url) -> Self {
        if let Some(impersonation) = self.impersonation.as_mut() {
            impersonation.iam_endpoint = iam_endpoint;
        }
        self
    }

    /// The impersonated service account, if any
    pub fn service_account(&self) -> Option<&str> {
        self.impersonation
            .as_ref()
            .map(|i| i.service_account.as_str())
    }

    /// Get an access token for API calls
    pub async fn token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, expire_time) = self.fetch().await?;

        let ttl = match expire_time {
            Some(expire_time) => (expire_time - Utc::now()).to_std().unwrap_or(Duration::ZERO),
            None => DEFAULT_TOKEN_TTL,
        };
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!("New token cached, expires in ~{} minutes", ttl.as_secs() / 60);

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.token().await
    }

    async fn fetch(&self) -> Result<(String, Option<DateTime<Utc>>)> {
        let base_token = match &self.base {
            BaseCredential::ApplicationDefault(provider) => provider
                .token(DEFAULT_SCOPES)
                .await
                .context("Failed to get access token")?
                .as_str()
                .to_string(),
            BaseCredential::AccessToken(token) => token.clone(),
        };

        match &self.impersonation {
            Some(impersonation) => {
                let generated = impersonation.generate_access_token(&base_token).await?;
                Ok((generated.access_token, Some(generated.expire_time)))
            }
            None => Ok((base_token, None)),
        }
    }
}

impl Impersonation {
    async fn generate_access_token(&self, base_token: &str) -> Result<GenerateAccessTokenResponse> {
        tracing::info!("Impersonating service account {}", self.service_account);

        let path = format!(
            "projects/-/serviceAccounts/{}:generateAccessToken",
            urlencoding::encode(&self.service_account)
        );
        let body = GenerateAccessTokenRequest {
            scope: DEFAULT_SCOPES,
            lifetime: IMPERSONATED_TOKEN_LIFETIME,
        };
        let request = build_request(Method::POST, &self.iam_endpoint, &path, None, Some(&body))?;

        let response = self
            .http
            .send(request, base_token)
            .await
            .with_context(|| format!("Failed to impersonate {}", self.service_account))?;

        serde_json::from_value(response).context("Failed to parse generateAccessToken response")
    }
}

/// Token source for `service_account`, or plain ADC when there is none
pub async fn token_source(service_account: Option<&str>) -> Result<TokenSource> {
    let source = TokenSource::default_credentials().await?;
    match service_account.filter(|sa| !sa.is_empty()) {
        Some(sa) => source.impersonate(sa),
        None => Ok(source),
    }
}
