//! Prompt templates and response scrubbing.
//!
//! All prompts exist in English and Japanese, selected by the configured
//! [`PromptLanguage`]. Model output is never trusted as-is: callers run it
//! through [`clean_response_text`] and, for structured answers,
//! [`extract_json_object`].

use crate::config::PromptLanguage;

/// Prompt asking for squash proposals over a commit log.
///
/// `commit_details` is the pre-rendered per-commit block (message and diff
/// statistics for the most recent commits).
pub fn squash_analysis_prompt(
    language: PromptLanguage,
    log_text: &str,
    commit_details: &str,
) -> String {
    match language {
        PromptLanguage::English => format!(
            "You are helping tidy a commit history before it is shared.\n\n\
             Recent commit log:\n{log_text}\n\n\
             Commit details:\n{commit_details}\n\n\
             Identify commits that belong together (tiny fixups, fragments of \
             one logical change) and should be squashed. Respond with JSON \
             only, in exactly this shape:\n\
             {{\"proposals\": [{{\"source_commits\": [\"id\"], \
             \"target_commit\": \"id\", \"reason\": \"...\", \
             \"suggested_message\": \"...\"}}]}}\n\
             Respond with {{\"proposals\": []}} when nothing should change."
        ),
        PromptLanguage::Japanese => format!(
            "共有前のコミット履歴を整理しています。\n\n\
             直近のコミットログ:\n{log_text}\n\n\
             コミット詳細:\n{commit_details}\n\n\
             ひとつの論理的な変更に属するコミット(小さな修正や断片)を特定し、\
             squashすべき組み合わせを提案してください。次の形式のJSONのみで\
             回答してください:\n\
             {{\"proposals\": [{{\"source_commits\": [\"id\"], \
             \"target_commit\": \"id\", \"reason\": \"...\", \
             \"suggested_message\": \"...\"}}]}}\n\
             変更が不要な場合は {{\"proposals\": []}} を返してください。"
        ),
    }
}

/// Prompt asking for a one-line commit message for the working copy.
pub fn commit_summary_prompt(language: PromptLanguage, status: &str, diff: &str) -> String {
    match language {
        PromptLanguage::English => format!(
            "Summarize the following working-copy changes as a commit message \
             of at most 50 characters. Output only the message itself, \
             without quotes or markup.\n\n\
             Status:\n{status}\n\nDiff:\n{diff}"
        ),
        PromptLanguage::Japanese => format!(
            "以下の作業コピーの変更を50文字以内のコミットメッセージに\
             要約してください。引用符や装飾なしで、メッセージ本文のみを\
             出力してください。\n\n\
             ステータス:\n{status}\n\n差分:\n{diff}"
        ),
    }
}

/// System prompt for branch naming; the task description is sent as the
/// user message.
pub fn branch_name_system_prompt(language: PromptLanguage) -> &'static str {
    match language {
        PromptLanguage::English => {
            "You name version-control branches. Reply with a single \
             kebab-case branch name of at most 20 characters, using only \
             lowercase letters, digits, and hyphens. No explanations."
        }
        PromptLanguage::Japanese => {
            "あなたはバージョン管理のブランチ名を考えます。小文字・数字・\
             ハイフンのみを使った20文字以内のケバブケースのブランチ名を\
             1つだけ返してください。説明は不要です。"
        }
    }
}

/// Removes a surrounding Markdown code fence, when present.
pub fn clean_response_text(text: &str) -> String {
    let trimmed = text.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines
        .first()
        .is_some_and(|line| line.trim_start().starts_with("```"))
    {
        lines.remove(0);
    }
    if lines
        .last()
        .is_some_and(|line| line.trim_end().ends_with("```"))
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// The outermost `{...}` region of `text`, when one exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
