//! AI-generated commit messages and branch names for the working copy.

use thiserror::Error;

use crate::llm::{prompts, ChatMessage, CompletionClient, LlmError};
use crate::vcs::{VcsBackend, VcsError};

/// Longest commit message the summarizer will produce.
const MAX_SUMMARY_CHARS: usize = 50;

/// Longest branch name the summarizer will produce.
const MAX_BRANCH_CHARS: usize = 20;

const BRANCH_NAME_MAX_TOKENS: u32 = 30;
const BRANCH_NAME_TEMPERATURE: f64 = 0.1;

/// Errors from summarizing working-copy changes.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The working copy has nothing to describe.
    #[error("no changes to summarize")]
    NoChanges,

    /// Reading the working copy failed.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// The completion service failed or answered unusably.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Turns working-copy state into short human-readable labels.
pub struct ChangeSummarizer {
    client: CompletionClient,
}

impl ChangeSummarizer {
    /// Summarizer backed by `client`.
    pub const fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// One-line commit message (at most 50 characters) describing the
    /// current uncommitted changes.
    pub async fn generate_commit_summary(
        &self,
        backend: &dyn VcsBackend,
    ) -> Result<String, SummarizeError> {
        let status = backend.status().await?;
        if status.trim().is_empty() || status.contains("No changes") {
            return Err(SummarizeError::NoChanges);
        }
        let diff = backend.diff().await?;

        let prompt = prompts::commit_summary_prompt(self.client.language(), &status, &diff);
        let response = self
            .client
            .complete(
                &[ChatMessage::user(prompt)],
                self.client.max_tokens(),
                self.client.temperature(),
            )
            .await?;

        let message = scrub_single_line(&response);
        if message.is_empty() {
            return Err(LlmError::EmptyResponse.into());
        }
        Ok(truncate_chars(&message, MAX_SUMMARY_CHARS))
    }

    /// Short kebab-case branch name for a task description. Unusable model
    /// output falls back to a name derived from the task text itself.
    pub async fn generate_branch_name(&self, task: &str) -> Result<String, SummarizeError> {
        let messages = [
            ChatMessage::system(prompts::branch_name_system_prompt(self.client.language())),
            ChatMessage::user(task.to_string()),
        ];
        let response = self
            .client
            .complete(&messages, BRANCH_NAME_MAX_TOKENS, BRANCH_NAME_TEMPERATURE)
            .await?;

        let name = sanitize_branch_name(&response);
        if name.is_empty() {
            Ok(fallback_branch_name(task))
        } else {
            Ok(name)
        }
    }
}

/// Collapses a model response to one clean line: fences and surrounding
/// quotes removed, first line only.
fn scrub_single_line(response: &str) -> String {
    let cleaned = prompts::clean_response_text(response);
    cleaned
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Normalizes a suggested branch name to lowercase kebab-case, at most 20
/// characters. Returns an empty string when nothing survives.
pub fn sanitize_branch_name(raw: &str) -> String {
    let first_line = prompts::clean_response_text(raw);
    let first_line = first_line.lines().next().unwrap_or("");

    let mut name = String::new();
    for c in first_line.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if matches!(c, ' ' | '_' | '/' | '-') && !name.ends_with('-') && !name.is_empty() {
            name.push('-');
        }
    }

    let name: String = name.chars().take(MAX_BRANCH_CHARS).collect();
    name.trim_matches('-').to_string()
}

/// Deterministic branch name from the task text: the first three
/// alphanumeric words, hyphen-joined and capped at 20 characters.
pub fn fallback_branch_name(task: &str) -> String {
    let words: Vec<String> = task
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .take(3)
        .collect();

    let joined = words.join("-");
    let capped: String = joined.chars().take(MAX_BRANCH_CHARS).collect();
    let capped = capped.trim_matches('-').to_string();
    if capped.is_empty() {
        "feature-work".to_string()
    } else {
        capped
    }
}
