//! Editor-hook entry points.
//!
//! Each runner consumes the JSON payload an editor host writes to stdin and
//! reports a [`HookOutcome`]. Hooks are guests in someone else's workflow:
//! everything short of a failed auto-commit resolves to exit code 0 so a
//! broken hook never wedges the host. Only `PostToolUse` may block (exit 2),
//! and only when committing finished work actually failed.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::summarize::{fallback_branch_name, ChangeSummarizer, SummarizeError};
use crate::vcs::{resolve_backend, VcsBackend};

/// Tool names whose invocations mean a file was (or will be) edited.
const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit"];

/// Path fragments marking throwaway or bookkeeping files that should never
/// trigger a commit.
const SKIP_PATH_FRAGMENTS: &[&str] = &[
    "/tmp/", "/temp/", "/.claude/", "/.git/", ".tmp", ".temp", ".cache",
];

/// Leading words that mark a prompt as a question rather than a task.
const QUESTION_WORDS: &[&str] = &["what", "how", "why", "when", "where", "which"];

/// Prompts shorter than this are not worth a branch.
const MIN_TASK_PROMPT_CHARS: usize = 10;

/// Commit message used when no AI summary is available.
const FALLBACK_SUMMARY: &str = "Edit files";

/// Label for the revision opened ahead of an edit. jj ignores the name
/// (changes are anonymous); on Git it becomes the branch name.
const WORK_BRANCH_NAME: &str = "temp-branch";

/// Payload the editor host writes to stdin. All fields are optional on the
/// wire; absent ones default to empty.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    /// Name of the tool that triggered the hook.
    #[serde(default)]
    pub tool_name: String,
    /// Tool arguments; file-editing tools carry a `file_path` key.
    #[serde(default)]
    pub tool_input: serde_json::Value,
    /// Directory the host is operating in.
    #[serde(default)]
    pub cwd: String,
    /// The user's prompt, for `UserPromptSubmit`.
    #[serde(default)]
    pub prompt: String,
}

impl HookInput {
    /// Parses a hook payload from a reader (normally stdin).
    pub fn from_reader(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// The host's working directory, defaulting to the current one.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        if self.cwd.is_empty() {
            Path::new(".")
        } else {
            Path::new(&self.cwd)
        }
    }

    /// The `file_path` argument of the triggering tool, when present.
    #[must_use]
    pub fn edited_file_path(&self) -> Option<&str> {
        self.tool_input.get("file_path").and_then(|v| v.as_str())
    }
}

/// What a hook run decided, with a message for the host's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Nothing to do; exit 0.
    Skip(String),
    /// Work completed; exit 0.
    Done(String),
    /// Hard failure the host must surface; exit 2.
    Block(String),
}

impl HookOutcome {
    fn skip(message: impl Into<String>) -> Self {
        Self::Skip(message.into())
    }

    fn done(message: impl Into<String>) -> Self {
        Self::Done(message.into())
    }

    fn block(message: impl Into<String>) -> Self {
        Self::Block(message.into())
    }

    /// Process exit code the host expects for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Skip(_) | Self::Done(_) => 0,
            Self::Block(_) => 2,
        }
    }

    /// The human-readable outcome text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Skip(message) | Self::Done(message) | Self::Block(message) => message,
        }
    }
}

/// Whether `tool_name` is on the file-editing allow-list.
#[must_use]
pub fn is_edit_tool(tool_name: &str) -> bool {
    EDIT_TOOLS.contains(&tool_name)
}

/// Whether edits to `path` should be ignored (temp files, VCS internals,
/// caches).
#[must_use]
pub fn should_skip_path(path: &str) -> bool {
    let path = path.to_lowercase();
    SKIP_PATH_FRAGMENTS
        .iter()
        .any(|fragment| path.contains(fragment))
}

/// Whether a submitted prompt describes a task worth its own branch.
///
/// Questions and near-empty prompts do not start new work.
#[must_use]
pub fn should_create_branch(prompt: &str) -> bool {
    let trimmed = prompt.trim();
    if trimmed.chars().count() < MIN_TASK_PROMPT_CHARS {
        return false;
    }
    if trimmed.contains('?') || trimmed.contains('？') {
        return false;
    }
    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    !QUESTION_WORDS.iter().any(|word| first_word.starts_with(word))
}

/// `PostToolUse`: after a file-editing tool ran, commit the resulting
/// changes with an AI-generated (or fallback) message.
pub async fn run_post_tool_use(
    input: &HookInput,
    summarizer: Option<&ChangeSummarizer>,
) -> HookOutcome {
    if !is_edit_tool(&input.tool_name) {
        return HookOutcome::skip(format!("not a file-editing tool: {}", input.tool_name));
    }
    if let Some(path) = input.edited_file_path() {
        if should_skip_path(path) {
            return HookOutcome::skip(format!("ignored path: {path}"));
        }
    }
    let Some(backend) = resolve_backend(input.working_dir()).await else {
        return HookOutcome::skip("no repository found");
    };

    commit_working_copy(backend.as_ref(), summarizer, FALLBACK_SUMMARY).await
}

/// `PreToolUse`: before a file-editing tool runs, open a fresh revision so
/// the edit lands separately from whatever is already in flight. Never
/// blocks.
pub async fn run_pre_tool_use(input: &HookInput) -> HookOutcome {
    if !is_edit_tool(&input.tool_name) {
        return HookOutcome::skip(format!("not a file-editing tool: {}", input.tool_name));
    }
    if let Some(path) = input.edited_file_path() {
        if should_skip_path(path) {
            return HookOutcome::skip(format!("ignored path: {path}"));
        }
    }
    let Some(backend) = resolve_backend(input.working_dir()).await else {
        return HookOutcome::skip("no repository found");
    };

    start_revision_for_edit(backend.as_ref(), &input.tool_name, input.edited_file_path()).await
}

/// `UserPromptSubmit`: when a prompt reads like a new task, start a branch
/// (or jj change) for it. Never blocks.
pub async fn run_user_prompt_submit(
    input: &HookInput,
    summarizer: Option<&ChangeSummarizer>,
) -> HookOutcome {
    if !should_create_branch(&input.prompt) {
        return HookOutcome::skip("prompt is not a task");
    }
    let Some(backend) = resolve_backend(input.working_dir()).await else {
        return HookOutcome::skip("no repository found");
    };

    start_branch_for_prompt(backend.as_ref(), summarizer, &input.prompt).await
}

/// Commits the current working copy, summarizing it when possible.
///
/// A failed commit here is a hard failure: a file was already edited and
/// the work is at risk of being overwritten.
pub async fn commit_working_copy(
    backend: &dyn VcsBackend,
    summarizer: Option<&ChangeSummarizer>,
    fallback_summary: &str,
) -> HookOutcome {
    match backend.has_uncommitted_changes().await {
        Ok(true) => {}
        Ok(false) => return HookOutcome::skip("working copy is clean"),
        Err(err) => {
            return HookOutcome::skip(format!("could not inspect working copy: {err}"))
        }
    }

    let summary = match summarizer {
        Some(summarizer) => match summarizer.generate_commit_summary(backend).await {
            Ok(summary) => summary,
            Err(SummarizeError::NoChanges) => {
                return HookOutcome::skip("working copy is clean")
            }
            Err(err) => {
                tracing::warn!(error = %err, "summary generation failed, using fallback");
                fallback_summary.to_string()
            }
        },
        None => fallback_summary.to_string(),
    };

    match backend.commit_changes(&summary).await {
        Ok(_) => HookOutcome::done(format!("Auto-committed: {summary}")),
        Err(err) => HookOutcome::block(format!("auto-commit failed: {err}")),
    }
}

/// Opens a new revision described by the tool about to run and the file it
/// will touch. Creation failure is a warning, never a block: the edit
/// itself must go ahead.
pub async fn start_revision_for_edit(
    backend: &dyn VcsBackend,
    tool_name: &str,
    file_path: Option<&str>,
) -> HookOutcome {
    let description = revision_description(tool_name, file_path);
    match backend.create_branch(WORK_BRANCH_NAME, Some(&description)).await {
        Ok(detail) => HookOutcome::done(detail),
        Err(err) => HookOutcome::skip(format!("could not start a revision: {err}")),
    }
}

/// Builds a one-line revision description from the tool name and the edited
/// file's base name.
fn revision_description(tool_name: &str, file_path: Option<&str>) -> String {
    file_path
        .and_then(|path| Path::new(path).file_name())
        .and_then(|name| name.to_str())
        .map_or_else(
            || tool_name.to_string(),
            |name| format!("{tool_name} {name}"),
        )
}

/// Names and starts a branch for the task described by `prompt`.
pub async fn start_branch_for_prompt(
    backend: &dyn VcsBackend,
    summarizer: Option<&ChangeSummarizer>,
    prompt: &str,
) -> HookOutcome {
    let name = match summarizer {
        Some(summarizer) => match summarizer.generate_branch_name(prompt).await {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(error = %err, "branch naming failed, using fallback");
                fallback_branch_name(prompt)
            }
        },
        None => fallback_branch_name(prompt),
    };

    let task: String = prompt.trim().chars().take(50).collect();
    let message = format!("Start: {task}");
    match backend.create_branch(&name, Some(&message)).await {
        Ok(detail) => HookOutcome::done(detail),
        Err(err) => HookOutcome::skip(format!("could not create branch: {err}")),
    }
}
