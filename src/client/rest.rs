use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{CreditBalance, Generation, JobClient, RunMetadata};

#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    input: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tags: &'a [String],
}

/// reqwest-backed implementation of the JobClient boundary.
pub struct RestJobClient {
    config: RestClientConfig,
    client: Client,
}

impl RestJobClient {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(anyhow!(
                "API error ({}): {}",
                status,
                res.text().await.unwrap_or_default()
            ));
        }
        Ok(res.json().await?)
    }
}

#[async_trait::async_trait]
impl JobClient for RestJobClient {
    async fn submit(
        &self,
        model_id: &str,
        input: &serde_json::Value,
        metadata: &RunMetadata,
    ) -> Result<Generation> {
        let url = self.url(&format!("/v1/models/{}/runs", model_id));
        debug!(%model_id, "submitting run");

        let body = SubmitRequest {
            input,
            title: metadata.title.as_deref(),
            tags: &metadata.tags,
        };
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(anyhow!(
                "API error ({}): {}",
                status,
                res.text().await.unwrap_or_default()
            ));
        }
        Ok(res.json().await?)
    }

    async fn fetch_status(&self, generation_id: &str) -> Result<Generation> {
        self.get_json(&self.url(&format!("/v1/generations/{}", generation_id)))
            .await
    }

    async fn fetch_balance(&self) -> Result<CreditBalance> {
        self.get_json(&self.url("/v1/credits/balance")).await
    }
}
