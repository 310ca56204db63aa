//! Commit-history analysis and squash proposals.
//!
//! The pipeline runs in stages: recent history is read through a
//! [`crate::vcs::VcsBackend`], each commit is measured
//! ([`metrics`], [`diff_stat`]) and classified ([`classifier`]), related
//! commits are grouped ([`related`]), and the generator ([`proposal`]) turns
//! the findings into scored [`SquashProposal`]s. Accepted proposals are
//! applied by the [`executor`], always behind a backup marker.

pub mod classifier;
pub mod diff_stat;
pub mod executor;
pub mod metrics;
pub mod proposal;
pub mod related;

pub use classifier::CommitClassifier;
pub use diff_stat::parse_diff_stat;
pub use executor::{ExecuteError, SquashExecutor};
pub use metrics::{CommitMetrics, DiffStat, SizeCategory};
pub use proposal::{filter_by_confidence, ProposalGenerator, SquashProposal};
pub use related::{are_related, group_related};
