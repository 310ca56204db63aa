//! Error types for the completion service.

use thiserror::Error;

/// Errors from requesting an LLM completion.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key in the environment or settings file.
    #[error("no API key found: set VCS_VALET_API_KEY or OPENAI_API_KEY")]
    ApiKeyNotFound,

    /// The configured API base is not a usable URL.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("completion API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// A well-formed response that contained no generated text.
    #[error("completion response contained no choices")]
    EmptyResponse,

    /// The response body did not match the expected shape.
    #[error("completion response was malformed: {0}")]
    MalformedResponse(String),
}
