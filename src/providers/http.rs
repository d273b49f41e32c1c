//! Authenticated JSON GET shared by the feed providers.
//!
//! Both upstreams sit behind the same proxy and authenticate with a
//! shared-secret header. The secret is marked sensitive so it never shows
//! up in `Debug` output or request logs.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::FetchError;

const USER_AGENT: &str = "racing-odds/0.1.0";

/// Shared-secret header sent with every upstream request.
#[derive(Debug, Clone)]
pub struct FeedCredentials {
    header: HeaderName,
    value: HeaderValue,
}

impl FeedCredentials {
    pub fn new(header: &str, secret: &SecretString) -> Result<Self> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .with_context(|| format!("Invalid secret header name: {header}"))?;
        let mut value = HeaderValue::from_str(secret.expose_secret())
            .context("Shared secret is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self { header, value })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }
}

/// HTTP client bound to one upstream feed URL.
#[derive(Debug)]
pub struct FeedClient {
    http: Client,
    url: String,
    credentials: FeedCredentials,
    headers: HeaderMap,
}

impl FeedClient {
    /// Build a client with a bounded request timeout and extra fixed headers.
    pub fn new(
        url: impl Into<String>,
        credentials: FeedCredentials,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build feed HTTP client")?;

        Ok(Self {
            http,
            url: url.into(),
            credentials,
            headers,
        })
    }

    /// Issue one GET and decode the body as JSON.
    pub async fn get_json(&self) -> Result<Value, FetchError> {
        debug!(url = %self.url, "Fetching feed");

        let resp = self
            .http
            .get(&self.url)
            .headers(self.headers.clone())
            .header(self.credentials.header.clone(), self.credentials.value.clone())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
