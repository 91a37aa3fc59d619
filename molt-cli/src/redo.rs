use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use molt_core::{render, ExecOptions, ExitCode, History, HistoryEntry, OutputFormatter, RealFs, RenameOutcome};

use crate::cli::FormatArg;
use crate::undo::resolve_id;
use crate::workspace::{molt_dir, now_rfc3339};

/// Replays a reverted batch forward again, from the plan it originally
/// executed, and appends a new history entry marking which entry it redid.
pub fn handle_redo(id: &str, format: FormatArg, cancelled: Arc<AtomicBool>) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let dir = molt_dir(&cwd);

    let mut history = History::load(&dir)?;
    let entry = resolve_id(&history, id, true)?.clone();

    let fs = RealFs;
    let opts = ExecOptions { dry_run: false, continue_on_error: true, cancelled: Some(cancelled) };
    let reports = molt_core::execute_planned(&entry.plan.actions, &fs, &opts);

    for line in render(&reports, entry.plan.options.output) {
        if line.is_error {
            eprintln!("{}", line.text);
        } else {
            println!("{}", line.text);
        }
    }

    let mut renamed = 0;
    let mut failed = 0;
    let mut exit_code = ExitCode::empty();
    let mut renames = Vec::new();
    for report in &reports {
        match &report.outcome {
            RenameOutcome::Renamed { orig, new } | RenameOutcome::RenamedTwoStep { orig, new, .. } => {
                renamed += 1;
                renames.push((orig.clone(), new.clone()));
            },
            RenameOutcome::Failed { source, .. } => {
                failed += 1;
                exit_code.insert(ExitCode::for_error(source));
            },
            RenameOutcome::Skipped { reason, .. } => {
                failed += 1;
                exit_code.insert(ExitCode::for_error(reason));
            },
            RenameOutcome::NoOp { .. } => {},
        }
    }

    let redo_id = format!("{}-redo-{}", entry.id, history.len());
    history.append(HistoryEntry {
        id: redo_id.clone(),
        created_at: now_rfc3339(),
        plan: entry.plan.clone(),
        renames,
        reverted: false,
        redo_of: Some(entry.id.clone()),
    })?;

    let exit = exit_code.into_process_code();
    let result = molt_core::RedoResult { history_id: redo_id, renamed, failed };
    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.redo(&result));

    Ok(exit)
}
