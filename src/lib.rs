//! # vcs-valet
//!
//! AI-assisted commit automation and history organizing for Git and Jujutsu
//! repositories.
//!
//! vcs-valet runs as a set of editor hooks (auto-committing after file edits,
//! starting fresh changes before them) and as an interactive `organize`
//! command that analyzes recent history, proposes squashes of tiny or related
//! commits, and applies the proposals the user accepts, after dropping a
//! backup bookmark/branch for manual recovery.
//!
//! Both VCSes are driven through their command-line tools behind the
//! [`vcs::VcsBackend`] trait, so everything above the backend layer is
//! agnostic to which system governs the working directory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod hooks;
pub mod llm;
pub mod organize;
pub mod summarize;
pub mod vcs;

pub use crate::cli::Cli;

/// The current version of vcs-valet.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
