//! CLI interface for vcs-valet

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod display;
pub mod hook;
pub mod install;
pub mod organize;

/// vcs-valet: commit organization for Git and Jujutsu repositories
#[derive(Parser)]
#[command(name = "vcs-valet")]
#[command(about = "AI-assisted commit organization for Git and Jujutsu", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze recent commits and propose squash operations
    Organize(organize::OrganizeCommand),
    /// Run an editor hook (reads a JSON payload from stdin)
    Hook(hook::HookCommand),
    /// Install editor hooks into a settings file
    Install(install::InstallCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Organize(organize_cmd) => organize_cmd.execute().await,
            Commands::Hook(hook_cmd) => hook_cmd.execute().await,
            Commands::Install(install_cmd) => install_cmd.execute(),
        }
    }
}
