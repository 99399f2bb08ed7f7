use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::RateProvider;
use crate::providers::util::{RetryPolicy, with_retry};

pub const DEFAULT_BASE_URL: &str = "https://open.er-api.com";

/// Rate provider for the open.er-api.com "latest" endpoint.
pub struct OpenErApiProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenErApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .user_agent("subtrack/0.1")
                .build()?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default, alias = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    #[instrument(name = "OpenErApiFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let url = format!("{}/v6/latest/{}", self.base_url, base.to_uppercase());
        debug!("Requesting exchange rates from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), self.retry)
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        if data.result != "success" {
            return Err(anyhow!(
                "Rate service reported {} for {}",
                data.error_type.as_deref().unwrap_or("an error"),
                base
            ));
        }

        debug!(count = data.rates.len(), "Received exchange rates");
        Ok(data.rates)
    }
}
