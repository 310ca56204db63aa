//! Relatedness detection between small commits.
//!
//! Grouping is a single forward pass over the metrics sequence (most recent
//! first). Each not-yet-grouped commit seeds a group, and every subsequent
//! ungrouped commit related to the seed joins it. Relation is always tested
//! against the seed, never transitively against other members, and a commit
//! belongs to at most one group. Singleton groups are discarded.

use std::collections::HashSet;

use super::classifier::CommitClassifier;
use super::metrics::{CommitMetrics, SizeCategory};

const FILE_OVERLAP_THRESHOLD: f64 = 0.5;
const MESSAGE_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Whether two commits look like parts of the same unit of work.
///
/// Only tiny and small commits can relate; any one signal suffices.
pub fn are_related(
    seed: &CommitMetrics,
    other: &CommitMetrics,
    classifier: &CommitClassifier,
) -> bool {
    let squashable =
        |commit: &CommitMetrics| matches!(commit.category, SizeCategory::Tiny | SizeCategory::Small);
    if !squashable(seed) || !squashable(other) {
        return false;
    }

    file_overlap(&seed.files, &other.files) > FILE_OVERLAP_THRESHOLD
        || shares_directory(&seed.files, &other.files)
        || message_similarity(&seed.message, &other.message) > MESSAGE_SIMILARITY_THRESHOLD
        || (classifier.is_fix_like(&seed.message) && classifier.is_fix_like(&other.message))
        || (classifier.is_trivial_message(&seed.message)
            && classifier.is_trivial_message(&other.message))
}

/// Groups of related commit indices, each group seeded by its first element.
pub fn group_related(commits: &[CommitMetrics], classifier: &CommitClassifier) -> Vec<Vec<usize>> {
    let mut grouped: HashSet<usize> = HashSet::new();
    let mut groups = Vec::new();

    for seed in 0..commits.len() {
        if grouped.contains(&seed) {
            continue;
        }
        let mut group = vec![seed];
        for candidate in seed + 1..commits.len() {
            if grouped.contains(&candidate) {
                continue;
            }
            if are_related(&commits[seed], &commits[candidate], classifier) {
                group.push(candidate);
            }
        }
        if group.len() >= 2 {
            grouped.extend(group.iter().copied());
            groups.push(group);
        }
    }

    groups
}

/// Jaccard ratio of the two file sets; 0.0 when either list is missing.
fn file_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn shares_directory(a: &[String], b: &[String]) -> bool {
    let dirs = |files: &[String]| -> HashSet<String> {
        files
            .iter()
            .map(|path| {
                path.rsplit_once('/')
                    .map_or_else(|| ".".to_string(), |(dir, _)| dir.to_string())
            })
            .collect()
    };
    !dirs(a).is_disjoint(&dirs(b))
}

/// Character-level similarity `2·LCS / (|a| + |b|)` over lower-cased trimmed
/// strings. Identical strings score 1.0, disjoint character sets 0.0.
pub(crate) fn message_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // One-row LCS table; messages are short so O(|a|·|b|) is fine.
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let lcs = previous[b.len()];
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}
