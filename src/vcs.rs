//! Backend-agnostic access to the version control system.
//!
//! Every operation shells out to the backend's own command-line tool with a
//! per-operation timeout, and command failures come back as values rather
//! than panics: a non-zero exit, a timeout, and a missing executable are all
//! ordinary [`VcsError`]s the caller can report and move past.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

pub mod git;
pub mod jujutsu;

pub use git::GitBackend;
pub use jujutsu::JujutsuBackend;

/// Maximum number of characters of diff output handed to downstream
/// consumers (the LLM payload in particular).
pub const DIFF_CHAR_LIMIT: usize = 5000;

/// Marker appended to diff output that was cut at [`DIFF_CHAR_LIMIT`].
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Errors from driving a VCS command-line tool.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The command ran and exited non-zero.
    #[error("command `{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line that was executed.
        command: String,
        /// Trimmed stderr from the failed invocation.
        stderr: String,
    },

    /// The command exceeded its time budget and was killed.
    #[error("command `{command}` timed out after {timeout_secs}s")]
    TimedOut {
        /// The command line that was executed.
        command: String,
        /// The budget that was exceeded.
        timeout_secs: u64,
    },

    /// The command could not be launched (typically a missing executable).
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Changes were squashed, but the follow-up message update failed.
    #[error("changes were squashed into {target}, but updating its message failed")]
    MessageUpdate {
        /// The change that received the squashed content.
        target: String,
        /// The failure from the message-update command.
        #[source]
        source: Box<VcsError>,
    },
}

/// One versioned change, as the engine sees it: an opaque id plus output the
/// backend produced for it.
///
/// Operations on the trait return plain text in the backend's native format;
/// parsing lives with the callers (see `organize::diff_stat`).
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Short tool name for user-facing messages (`"jj"` / `"git"`).
    fn name(&self) -> &'static str;

    /// Whether the working directory belongs to this VCS.
    async fn is_repository(&self) -> bool;

    /// Working-copy status text.
    async fn status(&self) -> Result<String, VcsError>;

    /// Working-copy diff, truncated at [`DIFF_CHAR_LIMIT`] characters.
    async fn diff(&self) -> Result<String, VcsError>;

    /// Whether there are changes not yet recorded.
    async fn has_uncommitted_changes(&self) -> Result<bool, VcsError>;

    /// Records the current changes under `message`.
    async fn commit_changes(&self, message: &str) -> Result<String, VcsError>;

    /// Starts a new line of history; with `message`, also describes it.
    async fn create_branch(&self, name: &str, message: Option<&str>)
        -> Result<String, VcsError>;

    /// Absolute path of the repository root.
    async fn repository_root(&self) -> Result<String, VcsError>;

    /// Recent history, most recent first, one change per line. The first
    /// whitespace-delimited token of each non-indented line is the change id
    /// (at least 8 characters); callers rely on this shape to extract ids.
    async fn commit_log(&self, limit: usize) -> Result<String, VcsError>;

    /// The message of one change.
    async fn commit_message(&self, commit_id: &str) -> Result<String, VcsError>;

    /// Native diff-statistics text for one change.
    async fn commit_diff_stat(&self, commit_id: &str) -> Result<String, VcsError>;

    /// Paths modified by one change, in the backend's reported order.
    async fn changed_files(&self, commit_id: &str) -> Result<Vec<String>, VcsError>;

    /// Creates a named pointer (bookmark/branch) at the current position and
    /// returns its name.
    async fn create_backup_marker(&self, name: &str) -> Result<String, VcsError>;

    /// Number of local changes not present on the remote trunk.
    async fn unpushed_count(&self) -> Result<usize, VcsError>;

    /// Squashes changes into `target`, which survives.
    ///
    /// `sources` is the full ordered (most-recent-first) set of changes being
    /// consolidated and is expected to contain `target`; entries equal to
    /// `target` are not squashed into themselves. A non-empty `message`
    /// becomes the target's message. History is rewritten in place, so
    /// callers must have taken a backup marker first.
    async fn squash(
        &self,
        sources: &[String],
        target: &str,
        message: &str,
    ) -> Result<String, VcsError>;
}

/// Probes the directory and returns the backend that claims it, Jujutsu
/// first (it can colocate with Git, so it wins ties).
///
/// No caching: hook invocations can arrive for different directories, and a
/// directory's state can change between calls.
pub async fn resolve_backend(dir: &Path) -> Option<Box<dyn VcsBackend>> {
    let jj = JujutsuBackend::new(dir);
    if jj.is_repository().await {
        return Some(Box::new(jj));
    }

    let git = GitBackend::new(dir);
    if git.is_repository().await {
        return Some(Box::new(git));
    }

    None
}

/// Runs `program` with `args` in `cwd`, enforcing `timeout_secs`.
///
/// Returns trimmed stdout on a zero exit. The child is killed if the timeout
/// elapses.
pub(crate) async fn run_command(
    program: &Path,
    args: &[&str],
    cwd: &Path,
    timeout_secs: u64,
) -> Result<String, VcsError> {
    let command_line = render_command(program, args);
    tracing::debug!(command = %command_line, timeout_secs, "running vcs command");

    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(VcsError::Launch {
                command: command_line,
                source,
            })
        }
        Err(_) => {
            return Err(VcsError::TimedOut {
                command: command_line,
                timeout_secs,
            })
        }
    };

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(VcsError::CommandFailed {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Cuts `text` to `limit` characters, appending [`TRUNCATION_MARKER`] when
/// anything was removed.
pub(crate) fn truncate_output(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_offset, _)) => format!("{}\n{}", &text[..byte_offset], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn render_command(program: &Path, args: &[&str]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
