//! OpenAI chat completions client over `reqwest`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::trait_def::CompletionClient;
use super::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Client for `POST {base_url}/chat/completions` with bearer auth.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .user_agent(concat!("studyplan/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = self.endpoint();
        debug!(%url, model = %request.model, "sending chat completion request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("completion endpoint returned {status}: {body}");
        }

        resp.json::<ChatCompletionResponse>()
            .await
            .context("failed to decode chat completion response")
    }
}
