// # HTTP IP Source
//
// This crate provides the public IP source for the dynamic DNS client.
//
// ## Architecture
//
// One GET against a JSON IP-echo service (ipify by default) per call:
//
// ```http
// GET https://api.ipify.org?format=json
//
// {"ip":"203.0.113.7"}
// ```
//
// The `ip` field is returned as-is (trimmed). No address parsing happens
// here; the reconciler compares strings.

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use serde::Deserialize;
use std::time::Duration;

/// Answer of a JSON IP-echo service
#[derive(Debug, Deserialize)]
struct IpEchoResponse {
    ip: String,
}

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from, `format=json` included
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: IP echo endpoint (e.g. "https://api.ipify.org")
    /// - `timeout`: request timeout
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(url, client)
    }

    /// Create an HTTP IP source around an existing client
    pub fn with_client(url: &str, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            url: json_url(url)?,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    /// The URL that will be requested
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current IP from the HTTP service
    async fn fetch_ip(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        parse_ip_response(&body)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        self.fetch_ip().await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Extract the `ip` string field from an IP-echo JSON body
pub fn parse_ip_response(body: &str) -> Result<String> {
    let parsed: IpEchoResponse = serde_json::from_str(body)
        .map_err(|e| Error::ip_source(format!("Failed to parse response: {}", e)))?;

    let ip = parsed.ip.trim();
    if ip.is_empty() {
        return Err(Error::ip_source("Response contained an empty ip field"));
    }

    Ok(ip.to_string())
}

/// Ensure the URL asks for JSON (`format=json`) unless a format is already set
fn json_url(url: &str) -> Result<String> {
    let mut parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::config(format!("Invalid IP source URL {}: {}", url, e)))?;

    if !parsed.query_pairs().any(|(key, _)| key == "format") {
        parsed.query_pairs_mut().append_pair("format", "json");
    }

    Ok(parsed.into())
}
