//! Shared display formatting for the organize command.
//!
//! Pure functions extracted from the command flow so rendering is unit
//! testable without a terminal.

use crate::organize::SquashProposal;

/// Display width for commit ids.
const SHORT_ID_LEN: usize = 8;

/// Truncates a commit id to [`SHORT_ID_LEN`] characters for display.
pub(crate) fn short_id(id: &str) -> &str {
    if id.len() > SHORT_ID_LEN {
        &id[..SHORT_ID_LEN]
    } else {
        id
    }
}

/// Returns an ANSI-colored percentage label for a confidence score.
pub(crate) fn format_confidence(score: f64) -> String {
    let color = if score >= 0.9 {
        "\x1b[32m" // green
    } else if score >= 0.7 {
        "\x1b[33m" // yellow
    } else {
        "\x1b[31m" // red
    };
    format!("{color}{:.0}%\x1b[0m", score * 100.0)
}

/// Renders one proposal as a numbered multi-line block.
pub(crate) fn render_proposal(number: usize, proposal: &SquashProposal) -> String {
    let sources: Vec<&str> = proposal
        .source_commits
        .iter()
        .map(|id| short_id(id))
        .collect();

    format!(
        "📦 Proposal {number} (confidence: {})\n   🎯 Target:  {}\n   📝 Sources: {}\n   💡 Reason:  {}\n   💬 Message: {}",
        format_confidence(proposal.confidence),
        short_id(&proposal.target_commit),
        sources.join(", "),
        proposal.reason,
        proposal.suggested_message,
    )
}

/// Formats the end-of-run summary line.
pub(crate) fn render_summary(executed: usize, failed: usize, selected: usize, total: usize) -> String {
    format!(
        "🎉 Done: {executed} executed, {failed} failed ({selected} selected of {total} proposed)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proposal() -> SquashProposal {
        SquashProposal {
            source_commits: vec![
                "aaaa1111bbbb2222".to_string(),
                "cccc3333dddd4444".to_string(),
            ],
            target_commit: "cccc3333dddd4444".to_string(),
            reason: "2 related commits changing 14 lines in total".to_string(),
            suggested_message: "Add retry handling".to_string(),
            confidence: 0.8,
        }
    }

    // --- short_id ---

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("aaaa1111bbbb2222"), "aaaa1111");
    }

    #[test]
    fn short_id_keeps_short_ids() {
        assert_eq!(short_id("abc12"), "abc12");
        assert_eq!(short_id("abcd1234"), "abcd1234");
    }

    // --- format_confidence ---

    #[test]
    fn confidence_is_shown_as_a_percentage() {
        assert!(format_confidence(0.9).contains("90%"));
        assert!(format_confidence(0.75).contains("75%"));
    }

    #[test]
    fn confidence_colors_track_the_score() {
        assert!(format_confidence(0.9).contains("\x1b[32m")); // green
        assert!(format_confidence(0.7).contains("\x1b[33m")); // yellow
        assert!(format_confidence(0.5).contains("\x1b[31m")); // red
    }

    // --- render_proposal ---

    #[test]
    fn proposal_blocks_show_all_fields() {
        let block = render_proposal(1, &sample_proposal());
        assert!(block.contains("Proposal 1"));
        assert!(block.contains("Target:  cccc3333"));
        assert!(block.contains("Sources: aaaa1111, cccc3333"));
        assert!(block.contains("2 related commits"));
        assert!(block.contains("Add retry handling"));
        assert!(block.contains("80%"));
    }

    // --- render_summary ---

    #[test]
    fn summary_counts_are_rendered() {
        let line = render_summary(2, 1, 3, 4);
        assert!(line.contains("2 executed"));
        assert!(line.contains("1 failed"));
        assert!(line.contains("3 selected"));
        assert!(line.contains("4 proposed"));
    }
}
