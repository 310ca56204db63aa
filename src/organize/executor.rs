//! Applies accepted proposals to the repository.

use chrono::Local;
use thiserror::Error;

use crate::vcs::{VcsBackend, VcsError};

use super::proposal::SquashProposal;

/// Errors from executing a squash proposal.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// A proposal must consolidate at least two commits.
    #[error("proposal needs at least 2 source commits, got {0}")]
    TooFewSources(usize),

    /// The backend rejected one of the squash steps.
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Executes proposals through a backend, strictly one mutation at a time.
pub struct SquashExecutor<'a> {
    backend: &'a dyn VcsBackend,
}

impl<'a> SquashExecutor<'a> {
    /// Executor over `backend`.
    pub const fn new(backend: &'a dyn VcsBackend) -> Self {
        Self { backend }
    }

    /// Creates a timestamped backup marker at the current position.
    ///
    /// Called once per session before anything is rewritten; the marker is
    /// the recovery path when the user dislikes the outcome.
    pub async fn create_backup(&self) -> Result<String, VcsError> {
        let name = format!(
            "backup_before_organize_{}",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        self.backend.create_backup_marker(&name).await?;
        Ok(name)
    }

    /// Applies one proposal and returns the backend's detail message.
    ///
    /// Partial failure is not rolled back: the backend stops at the first
    /// failed step and the error says which step that was.
    pub async fn execute(&self, proposal: &SquashProposal) -> Result<String, ExecuteError> {
        if proposal.source_commits.len() < 2 {
            return Err(ExecuteError::TooFewSources(proposal.source_commits.len()));
        }

        tracing::info!(
            target_commit = %proposal.target_commit,
            sources = proposal.source_commits.len(),
            "applying squash proposal"
        );
        let detail = self
            .backend
            .squash(
                &proposal.source_commits,
                &proposal.target_commit,
                &proposal.suggested_message,
            )
            .await?;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use regex::Regex;

    use crate::vcs::JujutsuBackend;

    use super::*;

    fn scripted_tool(dir: &Path, log: &Path) -> PathBuf {
        let path = dir.join("fake-jj");
        let script = format!("#!/bin/sh\necho \"$*\" >> \"{}\"\n", log.display());
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn proposal(sources: &[&str], target: &str) -> SquashProposal {
        SquashProposal {
            source_commits: sources.iter().map(|s| (*s).to_string()).collect(),
            target_commit: target.to_string(),
            reason: "test".to_string(),
            suggested_message: "merged message".to_string(),
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn single_source_proposals_are_rejected_before_any_backend_call() {
        let dir = tempfile::tempdir().unwrap();
        // Deliberately unrunnable tool: rejection must happen first.
        let backend = JujutsuBackend::with_program("/nonexistent-tool", dir.path());
        let executor = SquashExecutor::new(&backend);

        let err = executor
            .execute(&proposal(&["aaaa1111"], "aaaa1111"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecuteError::TooFewSources(1)));
    }

    #[tokio::test]
    async fn execute_drives_the_backend_squash() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log);
        let backend = JujutsuBackend::with_program(tool, dir.path());
        let executor = SquashExecutor::new(&backend);

        executor
            .execute(&proposal(&["aaaa1111", "bbbb2222"], "bbbb2222"))
            .await
            .unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert!(calls.contains("squash --from aaaa1111 --into bbbb2222"));
        assert!(calls.contains("describe -r bbbb2222 -m merged message"));
    }

    #[tokio::test]
    async fn backup_markers_are_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log);
        let backend = JujutsuBackend::with_program(tool, dir.path());
        let executor = SquashExecutor::new(&backend);

        let name = executor.create_backup().await.unwrap();
        let shape = Regex::new(r"^backup_before_organize_\d{8}_\d{6}$").unwrap();
        assert!(shape.is_match(&name), "unexpected marker name: {name}");

        let calls = std::fs::read_to_string(&log).unwrap();
        assert!(calls.contains(&format!("bookmark create {name} -r @")));
    }
}
