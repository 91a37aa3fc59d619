use anyhow::{Context, Result};
use molt_core::{History, OutputFormatter, StatusResult};

use crate::cli::FormatArg;
use crate::workspace::molt_dir;

pub fn handle_status(format: FormatArg) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let dir = molt_dir(&cwd);

    let history = History::load(&dir)?;
    let lock_held = dir.join("molt.lock").exists();

    let result = StatusResult {
        last_plan_id: history.last().map(|e| e.id.clone()),
        history_count: history.len(),
        lock_held,
    };

    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.status(&result));

    Ok(0)
}
