use std::path::PathBuf;

use anyhow::{Context, Result};
use molt_core::{render_preview, Config, ExitCode, MoltError, OutputFormatter, PlanResult, RenamePlan, RunOptions};

use crate::cli::{FormatArg, OutputModeArg, PreviewArg, TargetArgs};
use crate::workspace::{build_engine_context, new_plan_id, now_rfc3339, report_ingest_errors, run_rules_only};

#[allow(clippy::too_many_arguments)]
pub fn handle_plan(
    target: &TargetArgs,
    plan_out: &std::path::Path,
    only_rules: bool,
    dry_run: bool,
    output_fullname: bool,
    output: OutputModeArg,
    preview: PreviewArg,
    format: FormatArg,
    quiet: bool,
    use_color: bool,
) -> Result<i32> {
    if only_rules {
        handle_only_rules(target)?;
        return Ok(0);
    }

    let config = Config::load().unwrap_or_default();
    let continue_on_error = config.defaults.continue_on_error;
    let (ctx, ingest_errors) = build_engine_context(target, continue_on_error)?;
    let ingest_code = report_ingest_errors(&ingest_errors);

    // Input/rule errors short-circuit the run unless continue-on-error is
    // set (spec §7): ingestion already stopped at the first one, so here
    // we just skip writing a plan or previewing a truncated batch.
    if !continue_on_error && !ingest_errors.is_empty() {
        return Ok(ingest_code.into_process_code());
    }

    let run_options = RunOptions {
        continue_on_error,
        dry_run,
        only_rules: false,
        process_fullname: target.process_fullname,
        allow_path: target.allow_path,
        output_fullname,
        output: output.into(),
    };

    let id = new_plan_id();
    let plan = RenamePlan::from_context(&ctx, id, now_rfc3339(), run_options);

    if !dry_run {
        let out_path = if plan_out.is_relative() {
            std::env::current_dir().context("failed to determine current directory")?.join(plan_out)
        } else {
            plan_out.to_path_buf()
        };
        plan.save(&out_path).with_context(|| format!("failed to write plan to {}", out_path.display()))?;
    }

    if !quiet && preview != PreviewArg::None {
        let use_color = Some(use_color);
        print!("{}", render_preview(&plan, preview.into(), use_color));
    }

    let result = PlanResult {
        plan_id: plan.id.clone(),
        total_inputs: target.paths.len(),
        to_rename: plan.actions.iter().filter(|a| a.to_rename).count(),
        two_steps: plan.nb_two_steps,
        nb_conflicts: plan.nb_conflicts,
        dry_run,
    };

    let formatter = OutputFormatter::new(format.into());
    println!("{}", formatter.plan(&result));

    Ok(ingest_code.union(exit_code_for_plan(&plan)).into_process_code())
}

/// `--only-rules`: run the pipeline over every input and print the raw
/// candidate, skipping conflict planning and any filesystem write.
fn handle_only_rules(target: &TargetArgs) -> Result<()> {
    let results = run_rules_only(target)?;
    for (orig, candidate) in results {
        match candidate {
            Some(name) => println!("{} -> {name}", orig.display()),
            None => println!("{} (no-op)", orig.display()),
        }
    }
    Ok(())
}

fn exit_code_for_plan(plan: &RenamePlan) -> ExitCode {
    let mut code = ExitCode::empty();
    for action in &plan.actions {
        if action.conflict {
            code.insert(ExitCode::for_error(&MoltError::IntraBatchConflict(action.orig.clone())));
        }
        if action.conflict_fs {
            code.insert(ExitCode::for_error(&MoltError::FsConflict {
                path: action.orig.clone(),
                new_name: action.new.clone().unwrap_or_default(),
            }));
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::molt_dir;

    #[test]
    fn molt_dir_lives_under_the_given_directory() {
        let dir = PathBuf::from("/w");
        assert_eq!(molt_dir(&dir), PathBuf::from("/w/.molt"));
    }
}
