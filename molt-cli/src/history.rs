use anyhow::{Context, Result};
use molt_core::{History, HistoryItem, HistoryResult, OutputFormatter};

use crate::cli::FormatArg;
use crate::workspace::molt_dir;

pub fn handle_history(limit: Option<usize>, format: FormatArg) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let dir = molt_dir(&cwd);

    let history = History::load(&dir)?;
    let entries = history
        .list(limit)
        .into_iter()
        .map(|e| HistoryItem {
            id: e.id.clone(),
            created_at: e.created_at.clone(),
            renames: e.renames.len(),
            reverted: e.reverted,
        })
        .collect();

    let result = HistoryResult { entries };
    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.history(&result));

    Ok(0)
}
