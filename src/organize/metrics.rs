//! Measurement types for analyzed commits.

use std::fmt;

/// Size class of a commit, ordered smallest to largest.
///
/// `Unknown` marks commits whose statistics could not be collected. They stay
/// in the analyzed sequence (one unreadable commit must not sink the batch)
/// but never pass the relatedness size gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeCategory {
    /// At most the tiny threshold of changed lines in a single file.
    Tiny,
    /// At most the small threshold of changed lines across up to 3 files.
    Small,
    /// Up to 100 changed lines across up to 10 files.
    Medium,
    /// Everything bigger.
    Large,
    /// Statistics collection failed for this commit.
    Unknown,
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Line and file counts extracted from a backend's diff-statistics text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStat {
    /// Number of files touched.
    pub files_changed: usize,
    /// Lines added.
    pub added: usize,
    /// Lines deleted.
    pub deleted: usize,
}

/// Everything the proposal engine knows about one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetrics {
    /// Backend-native change id.
    pub commit_id: String,
    /// Commit message (subject for git, full description for jj).
    pub message: String,
    /// Paths touched by the commit, as reported by the backend.
    pub files: Vec<String>,
    /// Number of files touched, from the diff statistics.
    pub files_changed: usize,
    /// Lines added.
    pub lines_added: usize,
    /// Lines deleted.
    pub lines_deleted: usize,
    /// Size class derived from the counts above.
    pub category: SizeCategory,
}

impl CommitMetrics {
    /// Placeholder metrics for a commit whose data could not be collected.
    pub fn unknown(commit_id: impl Into<String>) -> Self {
        Self {
            commit_id: commit_id.into(),
            message: String::new(),
            files: Vec::new(),
            files_changed: 0,
            lines_added: 0,
            lines_deleted: 0,
            category: SizeCategory::Unknown,
        }
    }

    /// Added plus deleted lines.
    #[must_use]
    pub const fn total_lines(&self) -> usize {
        self.lines_added + self.lines_deleted
    }
}
