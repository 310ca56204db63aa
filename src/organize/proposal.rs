//! Squash-proposal generation.
//!
//! Two passes feed the proposal list. The rule-based pass is the reliability
//! backbone: it absorbs tiny commits into their predecessors and collapses
//! groups of related small commits. The AI pass asks the completion service
//! for additional proposals and silently contributes nothing when the service
//! is unavailable or answers with garbage. Merging keeps every rule-based
//! proposal and drops AI proposals that overlap one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::OrganizeOptions;
use crate::llm::{prompts, ChatMessage, CompletionClient};
use crate::vcs::{VcsBackend, VcsError};

use super::classifier::CommitClassifier;
use super::diff_stat::parse_diff_stat;
use super::metrics::CommitMetrics;
use super::related::group_related;

const ABSORB_CONFIDENCE: f64 = 0.9;
const GROUP_CONFIDENCE: f64 = 0.8;
const AI_CONFIDENCE: f64 = 0.7;

/// Commits whose details are spelled out in the AI prompt.
const AI_DETAIL_COMMITS: usize = 5;
const AI_MAX_TOKENS: u32 = 500;
const AI_TEMPERATURE: f64 = 0.1;

/// One suggested squash: which commits, into which target, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquashProposal {
    /// All commits being consolidated, most recent first, target included.
    pub source_commits: Vec<String>,
    /// The commit that survives and receives the content.
    pub target_commit: String,
    /// Human-readable rationale.
    pub reason: String,
    /// Message for the surviving commit.
    pub suggested_message: String,
    /// Score in `[0, 1]`; higher means safer to apply.
    pub confidence: f64,
}

#[derive(Deserialize)]
struct AiProposalList {
    proposals: Vec<AiProposal>,
}

#[derive(Deserialize)]
struct AiProposal {
    source_commits: Vec<String>,
    target_commit: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    suggested_message: String,
}

/// Analyzes recent history and produces squash proposals.
pub struct ProposalGenerator {
    options: OrganizeOptions,
    classifier: CommitClassifier,
    llm: Option<CompletionClient>,
}

impl ProposalGenerator {
    /// Generator with the given options; without a completion client only
    /// the rule-based pass runs.
    pub fn new(options: OrganizeOptions, llm: Option<CompletionClient>) -> Self {
        let classifier = CommitClassifier::new(&options);
        Self {
            options,
            classifier,
            llm,
        }
    }

    /// Runs the full pipeline against `backend`: fetch log, extract ids,
    /// collect metrics, generate and merge proposals.
    ///
    /// Fewer than two commits is not an error; the result is just empty.
    /// Only a failed log fetch aborts the analysis.
    pub async fn analyze(&self, backend: &dyn VcsBackend) -> Result<Vec<SquashProposal>, VcsError> {
        let log_text = backend.commit_log(self.options.limit).await?;

        let mut ids = extract_commit_ids(&log_text);
        if ids.len() < 2 {
            tracing::debug!(found = ids.len(), "not enough commits to analyze");
            return Ok(Vec::new());
        }
        ids.truncate(self.options.limit);

        let commits = self.collect_metrics(backend, &ids).await;
        let rule_based = self.rule_based_proposals(&commits);
        let ai = self.ai_proposals(&log_text, &commits).await;
        Ok(merge_proposals(rule_based, ai))
    }

    /// Gathers metrics for each id, degrading per-commit failures to
    /// placeholder metrics instead of aborting the batch.
    async fn collect_metrics(
        &self,
        backend: &dyn VcsBackend,
        ids: &[String],
    ) -> Vec<CommitMetrics> {
        let mut commits = Vec::with_capacity(ids.len());
        for id in ids {
            match self.metrics_for(backend, id).await {
                Ok(metrics) => commits.push(metrics),
                Err(err) => {
                    tracing::debug!(commit = %id, error = %err, "metrics collection failed");
                    commits.push(CommitMetrics::unknown(id.clone()));
                }
            }
        }
        commits
    }

    async fn metrics_for(
        &self,
        backend: &dyn VcsBackend,
        id: &str,
    ) -> Result<CommitMetrics, VcsError> {
        let message = backend.commit_message(id).await?;
        let stat_text = backend.commit_diff_stat(id).await?;
        let files = backend.changed_files(id).await?;

        let stat = parse_diff_stat(&stat_text);
        let category = self
            .classifier
            .categorize_size(stat.added + stat.deleted, stat.files_changed);
        Ok(CommitMetrics {
            commit_id: id.to_string(),
            message: message.trim().to_string(),
            files,
            files_changed: stat.files_changed,
            lines_added: stat.added,
            lines_deleted: stat.deleted,
            category,
        })
    }

    /// The heuristic pass: tiny-commit absorption plus related-group
    /// consolidation.
    pub fn rule_based_proposals(&self, commits: &[CommitMetrics]) -> Vec<SquashProposal> {
        let mut proposals = Vec::new();

        for index in self.classifier.detect_tiny_commits(commits) {
            // The predecessor is the next-older commit; the oldest entry in
            // the window has nowhere to be absorbed into.
            let Some(predecessor) = commits.get(index + 1) else {
                continue;
            };
            let tiny = &commits[index];
            let suggested_message = if self.classifier.is_trivial_message(&tiny.message) {
                predecessor.message.clone()
            } else {
                format!("{} and {} combined", predecessor.message, tiny.message)
            };
            proposals.push(SquashProposal {
                source_commits: vec![tiny.commit_id.clone(), predecessor.commit_id.clone()],
                target_commit: predecessor.commit_id.clone(),
                reason: format!(
                    "Tiny commit ({} changed lines) can be absorbed into its predecessor",
                    tiny.total_lines()
                ),
                suggested_message,
                confidence: ABSORB_CONFIDENCE,
            });
        }

        for group in group_related(commits, &self.classifier) {
            let total: usize = group.iter().map(|&i| commits[i].total_lines()).sum();
            let target = &commits[group[0]];
            proposals.push(SquashProposal {
                source_commits: group
                    .iter()
                    .map(|&i| commits[i].commit_id.clone())
                    .collect(),
                target_commit: target.commit_id.clone(),
                reason: format!(
                    "{} related commits changing {total} lines in total",
                    group.len()
                ),
                suggested_message: target.message.clone(),
                confidence: GROUP_CONFIDENCE,
            });
        }

        proposals
    }

    /// The AI pass. Every failure path returns an empty list.
    async fn ai_proposals(
        &self,
        log_text: &str,
        commits: &[CommitMetrics],
    ) -> Vec<SquashProposal> {
        let Some(client) = &self.llm else {
            return Vec::new();
        };

        let details = render_commit_details(commits);
        let prompt = prompts::squash_analysis_prompt(client.language(), log_text, &details);
        let response = match client
            .complete(&[ChatMessage::user(prompt)], AI_MAX_TOKENS, AI_TEMPERATURE)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "AI proposal pass failed");
                return Vec::new();
            }
        };

        parse_ai_response(&response).unwrap_or_else(|| {
            tracing::debug!("AI response was not a proposal object");
            Vec::new()
        })
    }
}

/// Change ids from raw log text: the first token of every line that does not
/// start with whitespace, provided the token is at least 8 characters.
pub fn extract_commit_ids(log_text: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for line in log_text.lines() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some(token) = line.split_whitespace().next() {
            if token.chars().count() >= 8 {
                ids.push(token.to_string());
            }
        }
    }
    ids
}

/// Merges the two passes: rule-based proposals always survive; an AI proposal
/// survives only if its sources overlap no rule-based sources and its target
/// duplicates no rule-based target.
pub fn merge_proposals(
    rule_based: Vec<SquashProposal>,
    ai: Vec<SquashProposal>,
) -> Vec<SquashProposal> {
    let rule_sources: Vec<HashSet<&str>> = rule_based
        .iter()
        .map(|p| p.source_commits.iter().map(String::as_str).collect())
        .collect();
    let rule_targets: HashSet<&str> = rule_based
        .iter()
        .map(|p| p.target_commit.as_str())
        .collect();

    let accepted_ai: Vec<SquashProposal> = ai
        .into_iter()
        .filter(|proposal| {
            let sources: HashSet<&str> =
                proposal.source_commits.iter().map(String::as_str).collect();
            let overlaps = rule_sources.iter().any(|rs| !rs.is_disjoint(&sources))
                || rule_targets.contains(proposal.target_commit.as_str());
            !overlaps
        })
        .collect();

    let mut merged = rule_based;
    merged.extend(accepted_ai);
    merged
}

/// Keeps only proposals at or above `threshold`.
pub fn filter_by_confidence(
    proposals: Vec<SquashProposal>,
    threshold: f64,
) -> Vec<SquashProposal> {
    proposals
        .into_iter()
        .filter(|proposal| proposal.confidence >= threshold)
        .collect()
}

fn render_commit_details(commits: &[CommitMetrics]) -> String {
    commits
        .iter()
        .take(AI_DETAIL_COMMITS)
        .map(|commit| {
            format!(
                "{}: {}\n{} files, +{}/-{}",
                commit.commit_id,
                commit.message,
                commit.files_changed,
                commit.lines_added,
                commit.lines_deleted
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_ai_response(response: &str) -> Option<Vec<SquashProposal>> {
    let cleaned = prompts::clean_response_text(response);
    let json = prompts::extract_json_object(&cleaned)?;
    let parsed: AiProposalList = serde_json::from_str(json).ok()?;
    Some(
        parsed
            .proposals
            .into_iter()
            .map(|proposal| SquashProposal {
                source_commits: proposal.source_commits,
                target_commit: proposal.target_commit,
                reason: proposal.reason,
                suggested_message: proposal.suggested_message,
                confidence: AI_CONFIDENCE,
            })
            .collect(),
    )
}
