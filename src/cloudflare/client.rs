//! Cloudflare Client
//!
//! Main client for interacting with the Cloudflare API, combining
//! credentials and HTTP functionality.

use super::auth::Credentials;
use super::error::ApiError;
use super::http::{CfHttpClient, Envelope};
use anyhow::{Context, Result};
use url::Url;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Main Cloudflare client
#[derive(Clone, Debug)]
pub struct CloudflareClient {
    pub credentials: Credentials,
    http: CfHttpClient,
    base_url: String,
}

impl CloudflareClient {
    /// Create a new client against `base_url` (or the production API)
    pub fn new(credentials: Credentials, base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        // Fail on a malformed base URL now rather than on the first request
        Url::parse(&base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;

        let http = CfHttpClient::new().context("Failed to create HTTP client")?;

        Ok(Self {
            credentials,
            http,
            base_url,
        })
    }

    /// Build a full API URL from an endpoint path and query pairs
    pub fn api_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Make a GET request against an endpoint path
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope, ApiError> {
        let url = self.api_url(path, query)?;
        self.http.get(&url, &self.credentials).await
    }
}
