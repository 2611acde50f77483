use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::{API_VERSION, EndpointConfig};
use crate::model::{ChatCompletion, ChatRequest};
use crate::providers::http_errors::model_api_request_error;
use crate::transport::{CompletionFuture, CompletionTransport};

/// Calls an Azure OpenAI chat completions deployment over plain HTTPS.
pub struct AzureChatTransport {
    client: Client,
    api_url: Url,
    api_key: String,
}

impl AzureChatTransport {
    pub fn new(client: Client, endpoint: &EndpointConfig) -> Result<Self> {
        let api_url = chat_url(&endpoint.base_uri, &endpoint.deployment)?;
        Ok(Self {
            client,
            api_url,
            api_key: endpoint.api_key.clone(),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        debug!(
            api_url = %self.api_url,
            message_count = request.messages.len(),
            max_tokens = request.max_tokens,
            "sending azure chat request"
        );

        let response = self
            .client
            .post(self.api_url.clone())
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(api_url = %self.api_url, error = %err, "azure request failed");
                model_api_request_error(err, self.api_url.as_str())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %self.api_url,
                status = %status,
                response_body_len = response_body.len(),
                "azure returned non-success status"
            );
            return Err(anyhow!(
                "Chat completion request failed with status {}: {}",
                status,
                response_body
            ));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;
        debug!(
            completion_id = %completion.id,
            model = %completion.model,
            choice_count = completion.choices.len(),
            "received azure chat response"
        );
        Ok(completion)
    }
}

impl CompletionTransport for AzureChatTransport {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(self.send(request))
    }
}

fn chat_url(base_uri: &str, deployment: &str) -> Result<Url> {
    let raw = format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        base_uri.trim().trim_end_matches('/'),
        deployment.trim(),
        API_VERSION
    );
    Url::parse(&raw).with_context(|| format!("Invalid OpenAI endpoint URL '{}'", raw))
}
