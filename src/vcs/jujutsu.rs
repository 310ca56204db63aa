//! Jujutsu backend: drives the `jj` command-line tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{run_command, truncate_output, VcsBackend, VcsError, DIFF_CHAR_LIMIT};

/// Revset covering local history that is reachable from the working copy.
const LOG_REVSET: &str = "present(@)::heads(main)";

/// Revset for local changes missing from the remote trunk.
const UNPUSHED_REVSET: &str = "@::heads(main) & ~heads(origin/main)";

/// [`VcsBackend`] implementation backed by `jj`.
#[derive(Debug, Clone)]
pub struct JujutsuBackend {
    program: PathBuf,
    cwd: PathBuf,
}

impl JujutsuBackend {
    /// Backend rooted at `dir`, using `jj` from `PATH`.
    pub fn new(dir: &Path) -> Self {
        Self::with_program("jj", dir)
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
impl VcsBackend for JujutsuBackend {
    fn name(&self) -> &'static str {
        "jj"
    }

    async fn is_repository(&self) -> bool {
        self.run(&["root"], 5).await.is_ok()
    }

    async fn status(&self) -> Result<String, VcsError> {
        self.run(&["status"], 10).await
    }

    async fn diff(&self) -> Result<String, VcsError> {
        let diff = self.run(&["diff"], 30).await?;
        Ok(truncate_output(&diff, DIFF_CHAR_LIMIT))
    }

    async fn has_uncommitted_changes(&self) -> Result<bool, VcsError> {
        let status = self.status().await?;
        Ok(!status.is_empty() && !status.contains("No changes"))
    }

    async fn commit_changes(&self, message: &str) -> Result<String, VcsError> {
        self.run(&["describe", "-m", message], 30).await
    }

    async fn create_branch(
        &self,
        name: &str,
        message: Option<&str>,
    ) -> Result<String, VcsError> {
        // jj has anonymous branches; the name only labels our own output.
        match message {
            Some(message) => self.run(&["new", "-m", message], 15).await?,
            None => self.run(&["new"], 15).await?,
        };
        Ok(format!("Started new change for '{name}'"))
    }

    async fn repository_root(&self) -> Result<String, VcsError> {
        self.run(&["root"], 5).await
    }

    async fn commit_log(&self, limit: usize) -> Result<String, VcsError> {
        let limit = limit.to_string();
        self.run(
            &["log", "-r", LOG_REVSET, "--limit", &limit, "--no-graph"],
            15,
        )
        .await
    }

    async fn commit_message(&self, commit_id: &str) -> Result<String, VcsError> {
        self.run(
            &["log", "-r", commit_id, "--no-graph", "-T", "description"],
            10,
        )
        .await
    }

    async fn commit_diff_stat(&self, commit_id: &str) -> Result<String, VcsError> {
        self.run(&["diff", "-r", commit_id, "--stat"], 10).await
    }

    async fn changed_files(&self, commit_id: &str) -> Result<Vec<String>, VcsError> {
        let listing = self.run(&["diff", "-r", commit_id, "--name-only"], 10).await?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn create_backup_marker(&self, name: &str) -> Result<String, VcsError> {
        self.run(&["bookmark", "create", name, "-r", "@"], 10).await?;
        Ok(name.to_string())
    }

    async fn unpushed_count(&self) -> Result<usize, VcsError> {
        let log = self.run(&["log", "-r", UNPUSHED_REVSET, "--no-graph"], 10).await?;
        Ok(log.lines().filter(|line| !line.trim().is_empty()).count())
    }

    async fn squash(
        &self,
        sources: &[String],
        target: &str,
        message: &str,
    ) -> Result<String, VcsError> {
        let mut squashed = 0usize;
        for source in sources.iter().filter(|source| source.as_str() != target) {
            self.run(&["squash", "--from", source, "--into", target], 30)
                .await?;
            squashed += 1;
        }

        if !message.is_empty() {
            self.run(&["describe", "-r", target, "-m", message], 15)
                .await
                .map_err(|source| VcsError::MessageUpdate {
                    target: target.to_string(),
                    source: Box::new(source),
                })?;
        }

        Ok(format!("Squashed {squashed} changes into {target}"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use super::*;

    /// Writes a scripted stand-in for `jj` that appends each invocation's
    /// arguments to `log` and then runs `body`.
    fn scripted_tool(dir: &Path, log: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-jj");
        let script = format!("#!/bin/sh\necho \"$*\" >> \"{}\"\n{}\n", log.display(), body);
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn invocations(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    // --- status interpretation ---

    #[tokio::test]
    async fn clean_working_copy_has_no_uncommitted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, r#"echo "No changes.""#);
        let backend = JujutsuBackend::with_program(tool, dir.path());

        assert!(!backend.has_uncommitted_changes().await.unwrap());
    }

    #[tokio::test]
    async fn dirty_working_copy_has_uncommitted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, r#"echo "M src/lib.rs""#);
        let backend = JujutsuBackend::with_program(tool, dir.path());

        assert!(backend.has_uncommitted_changes().await.unwrap());
    }

    #[tokio::test]
    async fn empty_status_means_no_uncommitted_changes() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, "true");
        let backend = JujutsuBackend::with_program(tool, dir.path());

        assert!(!backend.has_uncommitted_changes().await.unwrap());
    }

    // --- diff truncation ---

    #[tokio::test]
    async fn oversized_diff_is_truncated_with_marker() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(
            dir.path(),
            &log,
            "head -c 6000 /dev/zero | tr '\\0' 'x'; echo",
        );
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let diff = backend.diff().await.unwrap();
        assert!(diff.ends_with(super::super::TRUNCATION_MARKER));
        assert_eq!(
            diff.chars().filter(|c| *c == 'x').count(),
            DIFF_CHAR_LIMIT
        );
    }

    // --- changed files ---

    #[tokio::test]
    async fn changed_files_splits_and_trims_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(
            dir.path(),
            &log,
            "printf 'src/lib.rs\\n\\nsrc/vcs/mod.rs\\n'",
        );
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let files = backend.changed_files("abcd1234").await.unwrap();
        assert_eq!(files, vec!["src/lib.rs", "src/vcs/mod.rs"]);
    }

    // --- repository root ---

    #[tokio::test]
    async fn repository_root_is_trimmed_tool_output() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, r#"echo "/home/dev/project""#);
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let root = backend.repository_root().await.unwrap();
        assert_eq!(root, "/home/dev/project");
        assert_eq!(invocations(&log), vec!["root"]);
    }

    // --- squash sequencing ---

    #[tokio::test]
    async fn squash_skips_target_and_updates_message() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, "true");
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let sources = vec!["bbb22222".to_string(), "aaa11111".to_string()];
        let detail = backend
            .squash(&sources, "aaa11111", "combined work")
            .await
            .unwrap();

        assert_eq!(detail, "Squashed 1 changes into aaa11111");
        assert_eq!(
            invocations(&log),
            vec![
                "squash --from bbb22222 --into aaa11111",
                "describe -r aaa11111 -m combined work",
            ]
        );
    }

    #[tokio::test]
    async fn squash_aborts_on_first_failed_source() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(
            dir.path(),
            &log,
            r#"case "$*" in *"--from s2222222"*) echo conflict >&2; exit 1;; esac"#,
        );
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let sources = vec![
            "s1111111".to_string(),
            "s2222222".to_string(),
            "s3333333".to_string(),
            "t4444444".to_string(),
        ];
        let err = backend
            .squash(&sources, "t4444444", "merged")
            .await
            .unwrap_err();

        // The error names the source that failed, and no later source or
        // message update was attempted.
        match err {
            VcsError::CommandFailed { command, stderr } => {
                assert!(command.contains("--from s2222222"));
                assert_eq!(stderr, "conflict");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
        assert_eq!(
            invocations(&log),
            vec![
                "squash --from s1111111 --into t4444444",
                "squash --from s2222222 --into t4444444",
            ]
        );
    }

    #[tokio::test]
    async fn squash_reports_message_update_failure_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(
            dir.path(),
            &log,
            r#"case "$1" in describe) echo "immutable commit" >&2; exit 1;; esac"#,
        );
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let sources = vec!["bbb22222".to_string(), "aaa11111".to_string()];
        let err = backend
            .squash(&sources, "aaa11111", "combined work")
            .await
            .unwrap_err();

        match err {
            VcsError::MessageUpdate { target, .. } => assert_eq!(target, "aaa11111"),
            other => panic!("expected MessageUpdate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn squash_without_message_skips_describe() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(dir.path(), &log, "true");
        let backend = JujutsuBackend::with_program(tool, dir.path());

        let sources = vec!["bbb22222".to_string(), "aaa11111".to_string()];
        backend.squash(&sources, "aaa11111", "").await.unwrap();

        assert_eq!(
            invocations(&log),
            vec!["squash --from bbb22222 --into aaa11111"]
        );
    }

    // --- counting ---

    #[tokio::test]
    async fn unpushed_count_ignores_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let tool = scripted_tool(
            dir.path(),
            &log,
            r#"printf 'rlvkpnrz x\n\nqpvuntsm y\n'"#,
        );
        let backend = JujutsuBackend::with_program(tool, dir.path());

        assert_eq!(backend.unpushed_count().await.unwrap(), 2);
    }
}
