//! Parser for native diff-statistics text.
//!
//! Both backends emit a per-file table (`src/lib.rs | 12 ++--`), and git
//! appends a summary line (`3 files changed, 10 insertions(+), ...`). Per-file
//! lines apportion their change count across the `+`/`-` symbols; a summary
//! line, when present, overrides the accumulated totals. Unrecognized text
//! contributes nothing, so parsing never fails.

use std::sync::LazyLock;

use regex::Regex;

use super::metrics::DiffStat;

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static FILES_CHANGED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) files? changed").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static INSERTIONS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) insertions?\(\+\)").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static DELETIONS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) deletions?\(-\)").unwrap());

/// Extracts line and file counts from `stat_text`.
pub fn parse_diff_stat(stat_text: &str) -> DiffStat {
    let mut stat = DiffStat::default();

    for line in stat_text.lines() {
        let line = line.trim();
        if let Some((_, counts)) = line.split_once('|') {
            stat.files_changed += 1;
            let total = first_integer(counts).unwrap_or(0);
            let plus = counts.matches('+').count();
            let minus = counts.matches('-').count();
            if plus > 0 && minus > 0 {
                let symbols = plus + minus;
                stat.added += total * plus / symbols;
                stat.deleted += total * minus / symbols;
            } else if plus > 0 {
                stat.added += total;
            } else if minus > 0 {
                stat.deleted += total;
            }
        } else if line.contains("files changed") || line.contains("file changed") {
            if let Some(count) = capture_count(&FILES_CHANGED_PATTERN, line) {
                stat.files_changed = count;
            }
            if let Some(count) = capture_count(&INSERTIONS_PATTERN, line) {
                stat.added = count;
            }
            if let Some(count) = capture_count(&DELETIONS_PATTERN, line) {
                stat.deleted = count;
            }
        }
    }

    stat
}

fn first_integer(text: &str) -> Option<usize> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn capture_count(pattern: &Regex, line: &str) -> Option<usize> {
    pattern
        .captures(line)
        .and_then(|captures| captures.get(1))
        .and_then(|group| group.as_str().parse().ok())
}
