//! Commit classification rules.
//!
//! Pure functions over [`CommitMetrics`]: size categorization against the
//! configured thresholds, message heuristics (throwaway markers, fix
//! language), and the user's exclude patterns.

use regex::{Regex, RegexBuilder};

use crate::config::OrganizeOptions;

use super::metrics::{CommitMetrics, SizeCategory};

/// Message substrings that mark a commit as a fix.
const FIX_MARKERS: &[&str] = &[
    "fix", "bugfix", "hotfix", "patch", "correct", "repair", "typo", "error", "bug",
];

/// Message prefixes that mark a commit as housekeeping.
const HOUSEKEEPING_PREFIXES: &[&str] = &["typo", "format", "style", "cleanup"];

/// An exclude pattern, compiled once. Patterns that are not valid regexes
/// degrade to case-insensitive substring matches.
#[derive(Debug, Clone)]
enum ExcludePattern {
    Regex(Regex),
    Literal(String),
}

impl ExcludePattern {
    fn compile(pattern: &str) -> Self {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_or_else(
                |_| Self::Literal(pattern.to_lowercase()),
                Self::Regex,
            )
    }

    fn matches(&self, message: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(message),
            Self::Literal(literal) => message.to_lowercase().contains(literal),
        }
    }
}

/// Applies the squash heuristics to commit metrics.
#[derive(Debug, Clone)]
pub struct CommitClassifier {
    tiny_threshold: usize,
    small_threshold: usize,
    exclude_patterns: Vec<ExcludePattern>,
}

impl CommitClassifier {
    /// Classifier configured from the organize options.
    pub fn new(options: &OrganizeOptions) -> Self {
        Self {
            tiny_threshold: options.tiny_threshold,
            small_threshold: options.small_threshold,
            exclude_patterns: options
                .exclude_patterns
                .iter()
                .map(|pattern| ExcludePattern::compile(pattern))
                .collect(),
        }
    }

    /// Size class for a commit touching `files_changed` files with
    /// `total_lines` changed lines.
    #[must_use]
    pub fn categorize_size(&self, total_lines: usize, files_changed: usize) -> SizeCategory {
        if total_lines <= self.tiny_threshold && files_changed <= 1 {
            SizeCategory::Tiny
        } else if total_lines <= self.small_threshold && files_changed <= 3 {
            SizeCategory::Small
        } else if total_lines <= 100 && files_changed <= 10 {
            SizeCategory::Medium
        } else {
            SizeCategory::Large
        }
    }

    /// Whether `message` reads like a throwaway placeholder rather than a
    /// real description.
    #[must_use]
    pub fn is_trivial_message(&self, message: &str) -> bool {
        let message = message.trim().to_lowercase();

        if message == "fix" || message == "update" {
            return true;
        }
        for marker in ["wip", "tmp"] {
            if let Some(rest) = message.strip_prefix(marker) {
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    return true;
                }
            }
        }
        if HOUSEKEEPING_PREFIXES
            .iter()
            .any(|prefix| message.starts_with(prefix))
        {
            return true;
        }
        if !message.is_empty() && message.chars().all(|c| c.is_ascii_punctuation()) {
            return true;
        }
        if !message.is_empty() && message.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        if message.chars().count() == 1 && message.chars().all(char::is_alphabetic) {
            return true;
        }
        message.chars().count() <= 3
    }

    /// Whether `message` talks about fixing something.
    #[must_use]
    pub fn is_fix_like(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        FIX_MARKERS.iter().any(|marker| message.contains(marker))
    }

    /// Whether the user's exclude patterns rule this message out of analysis.
    #[must_use]
    pub fn should_exclude(&self, message: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(message))
    }

    /// Indices of commits that look absorbable: tiny by size, placeholder by
    /// message, or a small fix. Excluded commits are skipped; commits whose
    /// metrics could not be collected stay eligible so one bad commit does
    /// not block the batch.
    pub fn detect_tiny_commits(&self, commits: &[CommitMetrics]) -> Vec<usize> {
        let mut detected = Vec::new();
        for (index, commit) in commits.iter().enumerate() {
            if self.should_exclude(&commit.message) {
                continue;
            }
            if commit.category == SizeCategory::Tiny
                || self.is_trivial_message(&commit.message)
                || (self.is_fix_like(&commit.message)
                    && commit.total_lines() <= self.small_threshold / 2)
            {
                detected.push(index);
            }
        }
        detected
    }
}
