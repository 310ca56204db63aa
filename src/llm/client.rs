//! Chat-completion client for any OpenAI-compatible endpoint.
//!
//! The wire shape is the `/chat/completions` contract: bearer-token auth, a
//! JSON body of role-tagged messages, and generated text in
//! `choices[0].message.content`. No retries; callers treat a failed
//! completion as a degraded, not fatal, outcome.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{LlmConfig, PromptLanguage};

use super::error::LlmError;

/// Upper bound on one completion round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One role-tagged message in a completion conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `"system"` or `"user"`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client bound to one provider configuration.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl CompletionClient {
    /// Builds a client, failing up front when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::ApiKeyNotFound);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// The prompt language selected in the configuration.
    #[must_use]
    pub const fn language(&self) -> PromptLanguage {
        self.config.language
    }

    /// The configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// The configured default token budget.
    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.config.max_tokens
    }

    /// The configured default sampling temperature.
    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.config.temperature
    }

    /// Requests a completion and returns the trimmed generated text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, LlmError> {
        let endpoint = completion_endpoint(&self.config.api_base)?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::ApiKeyNotFound)?;

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens,
            temperature,
        };

        tracing::debug!(model = %self.config.model, %endpoint, "requesting completion");
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

/// Appends `chat/completions` to the configured base, tolerating bases with
/// or without a trailing slash.
fn completion_endpoint(api_base: &str) -> Result<Url, LlmError> {
    let base = if api_base.ends_with('/') {
        api_base.to_string()
    } else {
        format!("{api_base}/")
    };
    Ok(Url::parse(&base)?.join("chat/completions")?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn endpoint_joins_base_without_trailing_slash() {
        let url = completion_endpoint("https://api.openai.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn endpoint_joins_base_with_trailing_slash() {
        let url = completion_endpoint("http://localhost:4000/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/chat/completions");
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        assert!(completion_endpoint("not a url").is_err());
    }

    #[test]
    fn chat_messages_serialize_with_role_tags() {
        let message = ChatMessage::user("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn client_requires_an_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            CompletionClient::new(config),
            Err(LlmError::ApiKeyNotFound)
        ));
    }
}
