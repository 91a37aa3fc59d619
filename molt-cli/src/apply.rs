use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use molt_core::{
    execute_planned, render, summarize, ApplyResult, Config, ExecOptions, ExitCode, History, HistoryEntry,
    LockFile, OutputFormatter, RealFs, RenameOutcome, RenamePlan, RunOptions,
};

use crate::cli::{FormatArg, TargetArgs};
use crate::workspace::{build_engine_context, molt_dir, new_plan_id, now_rfc3339, report_ingest_errors};

#[allow(clippy::too_many_arguments)]
pub fn handle_apply(
    plan_path: Option<PathBuf>,
    in_place: bool,
    target: &TargetArgs,
    continue_on_error: bool,
    dry_run: bool,
    format: FormatArg,
    quiet: bool,
    cancelled: Arc<AtomicBool>,
) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let dir = molt_dir(&cwd);
    let lock = LockFile::acquire(&dir).context("failed to acquire molt lock")?;

    let config = Config::load().unwrap_or_default();
    let default_plan_path = dir.join("plan.json");
    let mut ingest_code = ExitCode::empty();

    let plan = if in_place {
        if target.paths.is_empty() {
            anyhow::bail!("apply --in-place requires at least one input path");
        }
        let effective_continue_on_error = continue_on_error || config.defaults.continue_on_error;
        let (ctx, ingest_errors) = build_engine_context(target, effective_continue_on_error)?;
        ingest_code = report_ingest_errors(&ingest_errors);

        // Input/rule errors short-circuit the run unless continue-on-error
        // is set (spec §7): ingestion already stopped at the first one, so
        // here we just skip planning/executing a truncated batch.
        if !effective_continue_on_error && !ingest_errors.is_empty() {
            lock.release().context("failed to release molt lock")?;
            return Ok(ingest_code.into_process_code());
        }

        let run_options = RunOptions {
            continue_on_error: effective_continue_on_error,
            dry_run,
            only_rules: false,
            process_fullname: target.process_fullname,
            allow_path: target.allow_path,
            output_fullname: false,
            output: config.defaults.output_mode(),
        };
        let plan = RenamePlan::from_context(&ctx, new_plan_id(), now_rfc3339(), run_options);
        plan.save(&default_plan_path)
            .with_context(|| format!("failed to write plan to {}", default_plan_path.display()))?;
        plan
    } else {
        let path = plan_path.unwrap_or(default_plan_path);
        RenamePlan::load(&path).with_context(|| format!("failed to load plan from {}", path.display()))?
    };

    let opts = ExecOptions {
        dry_run: dry_run || plan.options.effective_dry_run(),
        continue_on_error: continue_on_error || plan.options.continue_on_error,
        cancelled: Some(cancelled),
    };

    let fs = RealFs;
    let reports = execute_planned(&plan.actions, &fs, &opts);

    if !quiet {
        for line in render(&reports, plan.options.output) {
            if line.is_error {
                eprintln!("{}", line.text);
            } else {
                println!("{}", line.text);
            }
        }
    }

    let summary = summarize(&reports);
    let mut exit_code = ingest_code;
    let mut renames = Vec::new();
    for report in &reports {
        match &report.outcome {
            RenameOutcome::Renamed { orig, new } | RenameOutcome::RenamedTwoStep { orig, new, .. } => {
                renames.push((orig.clone(), new.clone()));
            },
            RenameOutcome::Failed { source, .. } => exit_code.insert(ExitCode::for_error(source)),
            RenameOutcome::Skipped { reason, .. } => exit_code.insert(ExitCode::for_error(reason)),
            RenameOutcome::NoOp { .. } => {},
        }
    }

    if !opts.dry_run {
        let mut history = History::load(&dir)?;
        history.append(HistoryEntry {
            id: plan.id.clone(),
            created_at: now_rfc3339(),
            plan: plan.clone(),
            renames,
            reverted: false,
            redo_of: None,
        })?;
    }

    lock.release().context("failed to release molt lock")?;

    let exit = exit_code.into_process_code();
    let result = ApplyResult::from_summary(plan.id, summary, exit);

    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.apply(&result));

    Ok(exit)
}
