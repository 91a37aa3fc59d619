//! Result types and summary/JSON rendering for each CLI subcommand: one
//! result struct per operation, each `Serialize`d directly for
//! `--format json` and rendered through a small text summary otherwise.

use serde::{Deserialize, Serialize};

use crate::report::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" | "text" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResult {
    pub plan_id: String,
    pub total_inputs: usize,
    pub to_rename: usize,
    pub two_steps: usize,
    pub nb_conflicts: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyResult {
    pub plan_id: String,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub exit_code: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UndoResult {
    pub history_id: String,
    pub reverted: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedoResult {
    pub history_id: String,
    pub renamed: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResult {
    pub last_plan_id: Option<String>,
    pub history_count: usize,
    pub lock_held: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub created_at: String,
    pub renames: usize,
    pub reverted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResult {
    pub entries: Vec<HistoryItem>,
}

impl ApplyResult {
    pub fn from_summary(plan_id: String, summary: Summary, exit_code: i32) -> Self {
        Self { plan_id, renamed: summary.renamed, skipped: summary.skipped, failed: summary.failed, exit_code }
    }
}

/// Renders a result as either a one-line-per-field human summary or
/// pretty-printed JSON, picked by `--format`.
pub struct OutputFormatter {
    pub format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn plan(&self, result: &PlanResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => {
                let mode = if result.dry_run { " (dry run)" } else { "" };
                format!(
                    "plan {}{mode}: {} inputs, {} to rename ({} two-step), {} conflicts",
                    result.plan_id, result.total_inputs, result.to_rename, result.two_steps, result.nb_conflicts
                )
            },
        }
    }

    pub fn apply(&self, result: &ApplyResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => format!(
                "plan {}: {} renamed, {} skipped, {} failed (exit {})",
                result.plan_id, result.renamed, result.skipped, result.failed, result.exit_code
            ),
        }
    }

    pub fn undo(&self, result: &UndoResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => {
                format!("undo {}: {} reverted, {} failed", result.history_id, result.reverted, result.failed)
            },
        }
    }

    pub fn redo(&self, result: &RedoResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => {
                format!("redo {}: {} renamed, {} failed", result.history_id, result.renamed, result.failed)
            },
        }
    }

    pub fn status(&self, result: &StatusResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => {
                let last = result.last_plan_id.as_deref().unwrap_or("(none)");
                format!(
                    "last plan: {last}\nhistory entries: {}\nlock held: {}",
                    result.history_count, result.lock_held
                )
            },
        }
    }

    pub fn history(&self, result: &HistoryResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Summary => {
                if result.entries.is_empty() {
                    return "(no history)".to_string();
                }
                result
                    .entries
                    .iter()
                    .map(|e| {
                        let revert_marker = if e.reverted { " [reverted]" } else { "" };
                        format!("{}  {}  {} renames{revert_marker}", e.id, e.created_at, e.renames)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
