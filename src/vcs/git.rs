//! Git backend: drives the `git` command-line tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{run_command, truncate_output, VcsBackend, VcsError, DIFF_CHAR_LIMIT};

/// [`VcsBackend`] implementation backed by `git`.
#[derive(Debug, Clone)]
pub struct GitBackend {
    program: PathBuf,
    cwd: PathBuf,
}

impl GitBackend {
    /// Backend rooted at `dir`, using `git` from `PATH`.
    pub fn new(dir: &Path) -> Self {
        Self::with_program("git", dir)
    }

    /// Backend rooted at `dir` with an explicit executable path. Used for
    /// nonstandard installs and for tests that substitute a scripted tool.
    pub fn with_program(program: impl Into<PathBuf>, dir: &Path) -> Self {
        Self {
            program: program.into(),
            cwd: dir.to_path_buf(),
        }
    }

    async fn run(&self, args: &[&str], timeout_secs: u64) -> Result<String, VcsError> {
        run_command(&self.program, args, &self.cwd, timeout_secs).await
    }
}

#[async_trait]
impl VcsBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn is_repository(&self) -> bool {
        self.run(&["rev-parse", "--show-toplevel"], 5).await.is_ok()
    }

    async fn status(&self) -> Result<String, VcsError> {
        self.run(&["status", "--porcelain"], 10).await
    }

    async fn diff(&self) -> Result<String, VcsError> {
        let diff = self.run(&["diff", "HEAD"], 30).await?;
        Ok(truncate_output(&diff, DIFF_CHAR_LIMIT))
    }

    async fn has_uncommitted_changes(&self) -> Result<bool, VcsError> {
        let status = self.status().await?;
        Ok(!status.trim().is_empty())
    }

    async fn commit_changes(&self, message: &str) -> Result<String, VcsError> {
        self.run(&["add", "-A"], 15).await?;
        self.run(&["commit", "-m", message], 30).await
    }

    async fn create_branch(
        &self,
        name: &str,
        message: Option<&str>,
    ) -> Result<String, VcsError> {
        self.run(&["checkout", "-b", name], 15).await?;
        let mut detail = format!("Created branch {name}");
        if let Some(message) = message {
            // An empty starting commit is a convenience, not a requirement.
            if let Err(err) = self.run(&["commit", "--allow-empty", "-m", message], 15).await {
                detail.push_str(&format!(" (start commit skipped: {err})"));
            }
        }
        Ok(detail)
    }

    async fn repository_root(&self) -> Result<String, VcsError> {
        self.run(&["rev-parse", "--show-toplevel"], 5).await
    }

    async fn commit_log(&self, limit: usize) -> Result<String, VcsError> {
        // Full hashes: downstream id extraction requires tokens of at least
        // eight characters, which abbreviated hashes do not guarantee.
        let limit = limit.to_string();
        self.run(&["log", "-n", &limit, "--format=%H %s"], 15).await
    }

    async fn commit_message(&self, commit_id: &str) -> Result<String, VcsError> {
        self.run(&["log", "-1", "--format=%s", commit_id], 10).await
    }

    async fn commit_diff_stat(&self, commit_id: &str) -> Result<String, VcsError> {
        self.run(&["show", "--stat", "--format=", commit_id], 10).await
    }

    async fn changed_files(&self, commit_id: &str) -> Result<Vec<String>, VcsError> {
        let listing = self
            .run(&["show", "--name-only", "--format=", commit_id], 10)
            .await?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn create_backup_marker(&self, name: &str) -> Result<String, VcsError> {
        self.run(&["branch", name], 10).await?;
        Ok(name.to_string())
    }

    async fn unpushed_count(&self) -> Result<usize, VcsError> {
        let count = self
            .run(&["rev-list", "--count", "@{upstream}..HEAD"], 10)
            .await?;
        count.trim().parse::<usize>().map_err(|_| VcsError::CommandFailed {
            command: "git rev-list --count @{upstream}..HEAD".to_string(),
            stderr: format!("unexpected count output: {count}"),
        })
    }

    /// Squashes by soft-resetting to the parent of the oldest source and
    /// committing the flattened tree. The sources must be a contiguous run
    /// of the most recent commits with `target` as the oldest of them;
    /// anything newer than the oldest source is folded in.
    async fn squash(
        &self,
        sources: &[String],
        target: &str,
        message: &str,
    ) -> Result<String, VcsError> {
        let Some(oldest) = sources.last() else {
            return Err(VcsError::CommandFailed {
                command: "git reset --soft".to_string(),
                stderr: "no source commits to squash".to_string(),
            });
        };

        let message = if message.is_empty() {
            self.commit_message(target).await?
        } else {
            message.to_string()
        };

        let parent_rev = format!("{oldest}^");
        let parent = self.run(&["rev-parse", &parent_rev], 10).await?;
        self.run(&["reset", "--soft", parent.trim()], 15).await?;
        self.run(&["commit", "-m", &message], 30).await?;

        Ok(format!("Squashed {} commits", sources.len()))
    }
}
