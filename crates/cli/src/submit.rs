use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tokensync_core::ResultAggregate;

/// Posts a finished result document to the collection endpoint.
#[derive(Clone)]
pub struct SubmitClient {
    http: reqwest::Client,
    url: Url,
}

/// Optional acknowledgement returned by the endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).context("invalid submission URL")?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn submit(&self, result: &ResultAggregate) -> Result<SubmitAck> {
        let response = self
            .http
            .post(self.url.clone())
            .json(result)
            .send()
            .await
            .context("submission request failed")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("submission rejected ({}): {}", status, body);
        }
        if body.trim().is_empty() {
            return Ok(SubmitAck::default());
        }
        serde_json::from_str(&body).context("invalid submission acknowledgement")
    }
}
