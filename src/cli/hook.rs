//! Hook command: the stdin/exit-code bridge between the editor host and
//! the hook runners.

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::{LlmConfig, Settings};
use crate::hooks::{self, HookInput, HookOutcome};
use crate::llm::CompletionClient;
use crate::summarize::ChangeSummarizer;

/// Hook entry points the host can invoke.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HookKind {
    /// After a file-editing tool ran: auto-commit the result.
    PostToolUse,
    /// Before a file-editing tool runs: open a fresh revision.
    PreToolUse,
    /// When a prompt is submitted: branch off for task-like prompts.
    UserPromptSubmit,
}

/// Hook command options.
#[derive(Parser)]
pub struct HookCommand {
    /// The hook entry point to run.
    #[arg(value_enum)]
    pub kind: HookKind,
}

impl HookCommand {
    /// Reads the host's JSON payload from stdin, runs the matching hook,
    /// and exits with the code the host contract expects (0 or 2).
    pub async fn execute(self) -> Result<()> {
        let input = match HookInput::from_reader(std::io::stdin().lock()) {
            Ok(input) => input,
            Err(err) => {
                // A payload we cannot read is never a reason to block the host.
                eprintln!("warning: unreadable hook payload: {err}");
                return Ok(());
            }
        };

        let summarizer = Settings::load()
            .map(|settings| LlmConfig::from_env(&settings))
            .ok()
            .and_then(|config| CompletionClient::new(config).ok())
            .map(ChangeSummarizer::new);

        let outcome = match self.kind {
            HookKind::PostToolUse => hooks::run_post_tool_use(&input, summarizer.as_ref()).await,
            HookKind::PreToolUse => hooks::run_pre_tool_use(&input).await,
            HookKind::UserPromptSubmit => {
                hooks::run_user_prompt_submit(&input, summarizer.as_ref()).await
            }
        };

        report(&outcome);
        if outcome.exit_code() != 0 {
            std::process::exit(outcome.exit_code());
        }
        Ok(())
    }
}

/// Prints the outcome where the host expects it: completed work to stdout,
/// everything else to stderr.
fn report(outcome: &HookOutcome) {
    match outcome {
        HookOutcome::Done(message) => println!("✅ {message}"),
        HookOutcome::Skip(reason) => eprintln!("skipped: {reason}"),
        HookOutcome::Block(message) => eprintln!("❌ {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_kinds_parse_from_kebab_case() {
        let cmd = HookCommand::parse_from(["hook", "post-tool-use"]);
        assert!(matches!(cmd.kind, HookKind::PostToolUse));

        let cmd = HookCommand::parse_from(["hook", "pre-tool-use"]);
        assert!(matches!(cmd.kind, HookKind::PreToolUse));

        let cmd = HookCommand::parse_from(["hook", "user-prompt-submit"]);
        assert!(matches!(cmd.kind, HookKind::UserPromptSubmit));
    }

    #[test]
    fn unknown_hook_kinds_are_rejected() {
        assert!(HookCommand::try_parse_from(["hook", "on-save"]).is_err());
    }
}
