//! Organize command: analyze recent commits and squash the noisy ones.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{LlmConfig, OrganizeOptions, Settings};
use crate::llm::CompletionClient;
use crate::organize::{filter_by_confidence, ProposalGenerator, SquashExecutor};
use crate::vcs::{resolve_backend, VcsBackend};

use super::display;

/// Unpushed-commit count above which the run needs explicit confirmation.
const UNPUSHED_WARNING_LIMIT: usize = 10;

/// Organize command options.
#[derive(Parser)]
pub struct OrganizeCommand {
    /// Shows proposals without executing any squash.
    #[arg(long)]
    pub dry_run: bool,

    /// Applies every proposal without prompting.
    #[arg(long)]
    pub auto: bool,

    /// Prints the filtered proposals as YAML and exits (for scripting).
    #[arg(long)]
    pub yaml: bool,

    /// Number of recent commits to analyze.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Maximum changed lines for a commit to count as tiny.
    #[arg(long, default_value_t = 5)]
    pub tiny_threshold: usize,

    /// Maximum changed lines for a commit to count as small.
    #[arg(long, default_value_t = 20)]
    pub small_threshold: usize,

    /// Minimum confidence score a proposal needs (0.0-1.0).
    #[arg(long, default_value_t = 0.7)]
    pub confidence_threshold: f64,

    /// Commit-message pattern to leave out of analysis (repeatable).
    #[arg(long = "exclude-pattern", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Also surfaces low-confidence proposals (threshold capped at 0.5).
    #[arg(long)]
    pub aggressive: bool,
}

impl OrganizeCommand {
    /// Executes the organize command.
    pub async fn execute(self) -> Result<()> {
        use std::io::IsTerminal;

        let backend = resolve_backend(Path::new("."))
            .await
            .context("No Git or Jujutsu repository found in the current directory")?;

        self.run(
            backend.as_ref(),
            std::io::stdin().is_terminal(),
            &mut std::io::BufReader::new(std::io::stdin()),
        )
        .await
    }

    /// The full organize flow against an already-resolved backend.
    ///
    /// `is_terminal` and `reader` are injected so tests can drive the flow
    /// without blocking on real stdin.
    async fn run(
        &self,
        backend: &dyn VcsBackend,
        is_terminal: bool,
        reader: &mut (dyn std::io::BufRead + Send),
    ) -> Result<()> {
        let options = self.to_options();
        let threshold = options.effective_confidence_threshold();

        // YAML mode is a read-only scripting surface: no warnings on stdout,
        // no prompts, no backup marker.
        if !self.yaml {
            self.check_safety(backend, is_terminal, reader).await?;

            if !self.dry_run {
                match SquashExecutor::new(backend).create_backup().await {
                    Ok(name) => println!("✅ Backup created: {name}"),
                    Err(err) => println!("⚠️  Backup creation failed: {err}"),
                }
            }
        }

        let llm = CompletionClient::new(LlmConfig::from_env(&Settings::load()?)).ok();
        if llm.is_none() && !self.yaml {
            eprintln!("warning: no API key configured, running rule-based analysis only");
        }

        if !self.yaml {
            println!(
                "🔍 Analyzing the last {} commits ({} repository)...",
                self.limit,
                backend.name()
            );
        }

        let generator = ProposalGenerator::new(options, llm);
        let proposals = generator
            .analyze(backend)
            .await
            .context("Commit analysis failed")?;

        if proposals.is_empty() {
            if !self.yaml {
                println!("✨ No consolidation needed; the history is already organized.");
            }
            return Ok(());
        }

        let total = proposals.len();
        let filtered = filter_by_confidence(proposals, threshold);

        if self.yaml {
            let rendered = serde_yaml::to_string(&filtered)
                .context("Failed to serialize proposals to YAML")?;
            print!("{rendered}");
            return Ok(());
        }

        if filtered.is_empty() {
            println!(
                "📊 All {total} proposals fall below the {:.0}% confidence threshold.",
                threshold * 100.0
            );
            println!("   Re-run with --aggressive or a lower --confidence-threshold.");
            return Ok(());
        }

        println!(
            "📊 Analysis complete: {} of {total} proposals meet the threshold.",
            filtered.len()
        );

        let mut selected = Vec::new();
        for (index, proposal) in filtered.iter().enumerate() {
            println!("\n{}", display::render_proposal(index + 1, proposal));

            if self.auto || self.dry_run {
                selected.push(proposal);
            } else if confirm("Apply this proposal?", is_terminal, reader)? {
                selected.push(proposal);
            }
        }

        if self.dry_run {
            println!(
                "\n⚠️  Dry-run mode: no changes were made ({} proposals would apply).",
                selected.len()
            );
            return Ok(());
        }

        if selected.is_empty() {
            println!("\nNo proposals selected; nothing to do.");
            return Ok(());
        }
        if self.auto {
            println!("\n🤖 Auto mode: executing {} proposals", selected.len());
        }

        let executor = SquashExecutor::new(backend);
        let mut executed = 0usize;
        let mut failed = 0usize;

        for (index, proposal) in selected.iter().enumerate() {
            println!("\n🔧 Squashing {}/{}...", index + 1, selected.len());
            match executor.execute(proposal).await {
                Ok(message) => {
                    println!("✅ {message}");
                    executed += 1;
                }
                Err(err) => {
                    println!("❌ {err}");
                    failed += 1;
                    if !self.auto
                        && index + 1 < selected.len()
                        && !confirm("Continue with the remaining proposals?", is_terminal, reader)?
                    {
                        break;
                    }
                }
            }
        }

        println!(
            "\n{}",
            display::render_summary(executed, failed, selected.len(), filtered.len())
        );
        if executed > 0 {
            println!("Inspect the new history with `{} log`.", backend.name());
        }

        Ok(())
    }

    /// Warns about risky preconditions and asks whether to continue.
    async fn check_safety(
        &self,
        backend: &dyn VcsBackend,
        is_terminal: bool,
        reader: &mut (dyn std::io::BufRead + Send),
    ) -> Result<()> {
        let warning = match backend.unpushed_count().await {
            Ok(count) if count > UNPUSHED_WARNING_LIMIT => {
                Some(format!("{count} unpushed commits are in scope"))
            }
            Ok(_) => None,
            Err(err) => Some(format!("could not count unpushed commits: {err}")),
        };

        if let Some(warning) = warning {
            println!("⚠️  Warning: {warning}");
            if !self.auto && !confirm("Continue anyway?", is_terminal, reader)? {
                anyhow::bail!("cancelled");
            }
        }

        Ok(())
    }

    /// Maps the CLI flags onto the engine's option object.
    fn to_options(&self) -> OrganizeOptions {
        OrganizeOptions {
            tiny_threshold: self.tiny_threshold,
            small_threshold: self.small_threshold,
            confidence_threshold: self.confidence_threshold,
            exclude_patterns: self.exclude_patterns.clone(),
            aggressive: self.aggressive,
            limit: self.limit,
        }
    }
}

/// Asks a yes/no question, defaulting to "no".
///
/// `is_terminal` and `reader` are injected so tests can drive the function
/// without blocking on real stdin.
fn confirm(
    question: &str,
    is_terminal: bool,
    reader: &mut (dyn std::io::BufRead + Send),
) -> Result<bool> {
    use std::io::Write;

    if !is_terminal {
        eprintln!("warning: stdin is not interactive, answering no");
        return Ok(false);
    }

    loop {
        print!("❓ {question} [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        let bytes = reader.read_line(&mut input)?;
        if bytes == 0 {
            return Ok(false);
        }

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => println!("Please answer 'y' or 'n'."),
        }
    }
}
