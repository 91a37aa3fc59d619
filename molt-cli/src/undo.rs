use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use molt_core::{execute, render, CanonicalPath, EngineContext, ExecOptions, ExitCode, History, OutputFormatter, RealFs, RenameOutcome};

use crate::cli::FormatArg;
use crate::workspace::molt_dir;

/// Reverts a previously applied batch by replaying its recorded renames
/// backwards. Rebuilds a fresh `EngineContext` from the (new -> orig) pairs
/// rather than hand-reversing the stored plan's actions, so the classifier
/// re-derives two-step/conflict structure for the reverse direction itself
/// instead of trusting flags computed for the forward direction.
pub fn handle_undo(id: &str, format: FormatArg, cancelled: Arc<AtomicBool>) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let dir = molt_dir(&cwd);

    let mut history = History::load(&dir)?;
    let entry = resolve_id(&history, id, false)?;

    if entry.renames.is_empty() {
        anyhow::bail!("history entry {id} recorded no renames to undo");
    }

    let fs = RealFs;
    let mut ctx = EngineContext::new(fs);
    for (orig, new) in &entry.renames {
        ctx.ingest(CanonicalPath::new(new, &cwd), Some(CanonicalPath::new(orig, &cwd)));
    }

    let opts = ExecOptions { dry_run: false, continue_on_error: true, cancelled: Some(cancelled) };
    let reports = execute(&mut ctx, &opts);

    for line in render(&reports, molt_core::OutputMode::Standard) {
        if line.is_error {
            eprintln!("{}", line.text);
        } else {
            println!("{}", line.text);
        }
    }

    let mut reverted = 0;
    let mut failed = 0;
    let mut exit_code = ExitCode::empty();
    for report in &reports {
        match &report.outcome {
            RenameOutcome::Renamed { .. } | RenameOutcome::RenamedTwoStep { .. } => reverted += 1,
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

    let entry_id = entry.id.clone();
    if failed == 0 {
        history.mark_reverted(&entry_id)?;
    }

    let exit = exit_code.into_process_code();
    let result = molt_core::UndoResult { history_id: entry_id, reverted, failed };
    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.undo(&result));

    Ok(exit)
}

/// Resolves `id`, with the `"latest"` shorthand meaning the most recently
/// applied entry that hasn't been reverted (or, for redo, the most
/// recently reverted one).
pub(crate) fn resolve_id<'a>(
    history: &'a History,
    id: &str,
    want_reverted: bool,
) -> Result<&'a molt_core::HistoryEntry> {
    if id == "latest" {
        history
            .list(None)
            .into_iter()
            .find(|e| e.reverted == want_reverted)
            .with_context(|| format!("no history entry to {} ", if want_reverted { "redo" } else { "undo" }))
    } else {
        history.find(id).with_context(|| format!("no history entry with id {id}"))
    }
}
