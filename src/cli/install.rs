//! Install command for registering the hooks in Claude Code settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};

/// Substring identifying hook entries owned by this tool.
const COMMAND_MARKER: &str = "vcs-valet";

/// Register the hook commands in a Claude Code `settings.json`.
#[derive(Parser)]
pub struct InstallCommand {
    /// Install into the global ~/.claude/settings.json
    #[arg(long, conflicts_with = "path")]
    pub global: bool,

    /// Project directory to install into (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Show the settings fragment without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl InstallCommand {
    /// Executes the install command.
    pub fn execute(self) -> Result<()> {
        let settings_file = self.settings_file()?;
        let fragment = hook_settings_fragment();

        if self.dry_run {
            println!("📋 Would merge into {}:", settings_file.display());
            println!("{}", serde_json::to_string_pretty(&fragment)?);
            println!();
            println!("Re-run without --dry-run to apply.");
            return Ok(());
        }

        println!("📦 Installing hooks into {}", settings_file.display());

        let existing = read_settings(&settings_file);
        let merged = merge_settings(existing, &fragment);

        if settings_file.exists() {
            let backup = backup_path(&settings_file);
            std::fs::copy(&settings_file, &backup).with_context(|| {
                format!("Failed to back up settings to {}", backup.display())
            })?;
            println!("💾 Existing settings backed up to {}", backup.display());
        }

        if let Some(parent) = settings_file.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory {}", parent.display())
            })?;
        }
        let rendered = serde_json::to_string_pretty(&merged)?;
        std::fs::write(&settings_file, rendered).with_context(|| {
            format!("Failed to write {}", settings_file.display())
        })?;

        println!("✅ Hooks installed. They activate on the next editor session.");
        Ok(())
    }

    /// Resolves the settings file the hooks get registered in.
    fn settings_file(&self) -> Result<PathBuf> {
        if self.global {
            let home = dirs::home_dir().context("Failed to determine the home directory")?;
            return Ok(home.join(".claude").join("settings.json"));
        }

        let project = match &self.path {
            Some(path) => {
                anyhow::ensure!(path.is_dir(), "Not a directory: {}", path.display());
                path.clone()
            }
            None => std::env::current_dir().context("Failed to determine the current directory")?,
        };
        Ok(project.join(".claude").join("settings.json"))
    }
}

// --- Extracted pure functions ---

/// The hook registrations merged into `settings.json`.
///
/// The edit hooks match the file-editing tools only; the prompt hook fires
/// on every prompt and needs no matcher.
fn hook_settings_fragment() -> Value {
    json!({
        "hooks": {
            "PreToolUse": [
                {
                    "matcher": "Edit|Write|MultiEdit",
                    "hooks": [
                        {
                            "type": "command",
                            "command": "vcs-valet hook pre-tool-use",
                            "timeout": 15
                        }
                    ]
                }
            ],
            "PostToolUse": [
                {
                    "matcher": "Edit|Write|MultiEdit",
                    "hooks": [
                        {
                            "type": "command",
                            "command": "vcs-valet hook post-tool-use",
                            "timeout": 30
                        }
                    ]
                }
            ],
            "UserPromptSubmit": [
                {
                    "hooks": [
                        {
                            "type": "command",
                            "command": "vcs-valet hook user-prompt-submit",
                            "timeout": 30
                        }
                    ]
                }
            ]
        }
    })
}

/// Reads the existing settings file.
///
/// A missing file yields an empty object. An unparseable file also yields an
/// empty object after a warning; the backup taken before writing preserves
/// the original bytes.
fn read_settings(path: &Path) -> Value {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("warning: could not parse {}: {err}", path.display());
                json!({})
            }
        },
        Err(_) => json!({}),
    }
}

/// Merges the hook fragment into the existing settings.
///
/// Unrelated keys and hook entries registered by other tools survive
/// untouched. Entries whose command mentions vcs-valet are replaced by the
/// fresh registration so repeated installs never duplicate.
fn merge_settings(existing: Value, fragment: &Value) -> Value {
    let mut root = match existing {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    let Some(fragment_hooks) = fragment.get("hooks").and_then(Value::as_object) else {
        return Value::Object(root);
    };

    let hooks_slot = root.entry("hooks").or_insert_with(|| json!({}));
    if !hooks_slot.is_object() {
        *hooks_slot = json!({});
    }
    if let Some(hooks) = hooks_slot.as_object_mut() {
        for (event, additions) in fragment_hooks {
            let event_slot = hooks.entry(event.clone()).or_insert_with(|| json!([]));
            if !event_slot.is_array() {
                *event_slot = json!([]);
            }
            if let Some(entries) = event_slot.as_array_mut() {
                entries.retain(|entry| !is_own_entry(entry));
                if let Some(additions) = additions.as_array() {
                    entries.extend(additions.iter().cloned());
                }
            }
        }
    }

    Value::Object(root)
}

/// Whether a hooks array entry was registered by this tool.
fn is_own_entry(entry: &Value) -> bool {
    entry
        .get("hooks")
        .and_then(Value::as_array)
        .is_some_and(|commands| {
            commands.iter().any(|command| {
                command
                    .get("command")
                    .and_then(Value::as_str)
                    .is_some_and(|line| line.contains(COMMAND_MARKER))
            })
        })
}

/// Sibling path the existing settings are copied to before writing.
fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    path.with_extension(format!("json.bak.{stamp}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn fragment_commands(fragment: &Value, event: &str) -> Vec<String> {
        fragment["hooks"][event]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|entry| entry["hooks"].as_array().unwrap())
            .map(|hook| hook["command"].as_str().unwrap().to_string())
            .collect()
    }

    // --- fragment shape ---

    #[test]
    fn fragment_registers_all_three_hooks() {
        let fragment = hook_settings_fragment();

        assert_eq!(
            fragment_commands(&fragment, "PreToolUse"),
            vec!["vcs-valet hook pre-tool-use"]
        );
        assert_eq!(
            fragment_commands(&fragment, "PostToolUse"),
            vec!["vcs-valet hook post-tool-use"]
        );
        assert_eq!(
            fragment_commands(&fragment, "UserPromptSubmit"),
            vec!["vcs-valet hook user-prompt-submit"]
        );
    }

    #[test]
    fn edit_hooks_match_file_editing_tools() {
        let fragment = hook_settings_fragment();

        for event in ["PreToolUse", "PostToolUse"] {
            let matcher = fragment["hooks"][event][0]["matcher"].as_str().unwrap();
            assert_eq!(matcher, "Edit|Write|MultiEdit");
        }
        assert!(fragment["hooks"]["UserPromptSubmit"][0].get("matcher").is_none());
    }

    // --- merge semantics ---

    #[test]
    fn merge_preserves_unrelated_keys_and_foreign_hooks() {
        let existing = json!({
            "model": "opus",
            "permissions": {"allow": ["Bash"]},
            "hooks": {
                "PostToolUse": [
                    {
                        "matcher": "Bash",
                        "hooks": [{"type": "command", "command": "other-tool lint"}]
                    }
                ],
                "Stop": [
                    {"hooks": [{"type": "command", "command": "notify-send done"}]}
                ]
            }
        });

        let merged = merge_settings(existing, &hook_settings_fragment());

        assert_eq!(merged["model"], "opus");
        assert_eq!(merged["permissions"]["allow"][0], "Bash");
        assert_eq!(
            merged["hooks"]["Stop"][0]["hooks"][0]["command"],
            "notify-send done"
        );

        let post = merged["hooks"]["PostToolUse"].as_array().unwrap();
        assert_eq!(post.len(), 2);
        assert_eq!(post[0]["hooks"][0]["command"], "other-tool lint");
        assert_eq!(post[1]["hooks"][0]["command"], "vcs-valet hook post-tool-use");
    }

    #[test]
    fn merge_replaces_stale_own_entries() {
        let existing = json!({
            "hooks": {
                "PostToolUse": [
                    {
                        "matcher": "Edit",
                        "hooks": [{"type": "command", "command": "vcs-valet hook post-tool-use --legacy"}]
                    },
                    {
                        "matcher": "Bash",
                        "hooks": [{"type": "command", "command": "other-tool lint"}]
                    }
                ]
            }
        });

        let merged = merge_settings(existing, &hook_settings_fragment());

        let post = merged["hooks"]["PostToolUse"].as_array().unwrap();
        assert_eq!(post.len(), 2);
        assert_eq!(post[0]["hooks"][0]["command"], "other-tool lint");
        assert_eq!(post[1]["matcher"], "Edit|Write|MultiEdit");
        assert_eq!(post[1]["hooks"][0]["command"], "vcs-valet hook post-tool-use");
    }

    #[test]
    fn merge_starts_from_scratch_on_empty_or_malformed_settings() {
        for existing in [json!({}), json!(null), json!([1, 2])] {
            let merged = merge_settings(existing, &hook_settings_fragment());
            assert_eq!(
                merged["hooks"]["PreToolUse"][0]["hooks"][0]["command"],
                "vcs-valet hook pre-tool-use"
            );
        }
    }

    #[test]
    fn repeated_merges_never_duplicate() {
        let once = merge_settings(json!({}), &hook_settings_fragment());
        let twice = merge_settings(once.clone(), &hook_settings_fragment());
        assert_eq!(once, twice);
    }

    // --- file handling ---

    #[test]
    fn missing_and_malformed_settings_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(read_settings(&dir.path().join("absent.json")), json!({}));

        let malformed = dir.path().join("settings.json");
        std::fs::write(&malformed, "{not json").unwrap();
        assert_eq!(read_settings(&malformed), json!({}));
    }

    #[test]
    fn backup_paths_are_timestamped() {
        let backup = backup_path(Path::new("/tmp/.claude/settings.json"));
        let name = backup.file_name().unwrap().to_str().unwrap();

        assert!(name.starts_with("settings.json.bak."));
        let stamp = name.trim_start_matches("settings.json.bak.");
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
    }

    // --- command surface ---

    #[test]
    fn global_and_path_flags_are_mutually_exclusive() {
        let result = InstallCommand::try_parse_from(["install", "--global", "--path", "/tmp"]);
        assert!(result.is_err());
    }

    #[test]
    fn settings_file_lands_under_the_project_directory() {
        let dir = tempfile::tempdir().unwrap();
        let command = InstallCommand {
            global: false,
            path: Some(dir.path().to_path_buf()),
            dry_run: false,
        };

        let file = command.settings_file().unwrap();
        assert_eq!(file, dir.path().join(".claude").join("settings.json"));
    }

    #[test]
    fn missing_project_directories_are_rejected() {
        let command = InstallCommand {
            global: false,
            path: Some(PathBuf::from("/no/such/dir")),
            dry_run: false,
        };
        assert!(command.settings_file().is_err());
    }

    #[test]
    fn install_merges_into_an_existing_project_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let claude_dir = dir.path().join(".claude");
        std::fs::create_dir_all(&claude_dir).unwrap();
        let settings_file = claude_dir.join("settings.json");
        std::fs::write(&settings_file, r#"{"model": "opus"}"#).unwrap();

        let command = InstallCommand {
            global: false,
            path: Some(dir.path().to_path_buf()),
            dry_run: false,
        };
        command.execute().unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&settings_file).unwrap()).unwrap();
        assert_eq!(written["model"], "opus");
        assert_eq!(
            written["hooks"]["PostToolUse"][0]["hooks"][0]["command"],
            "vcs-valet hook post-tool-use"
        );

        let backups: Vec<_> = std::fs::read_dir(&claude_dir)
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("settings.json.bak.")
            })
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let command = InstallCommand {
            global: false,
            path: Some(dir.path().to_path_buf()),
            dry_run: true,
        };
        command.execute().unwrap();

        assert!(!dir.path().join(".claude").exists());
    }
}
