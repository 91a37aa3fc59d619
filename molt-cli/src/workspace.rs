//! Small pieces of plumbing shared by more than one subcommand handler:
//! resolving `.molt/`, running the rule pipeline over a batch of inputs to
//! build a classified `EngineContext`, and minting plan/history ids.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use molt_core::{run_pipeline, CanonicalPath, EngineContext, ExitCode, FsProbe, MoltError, PipelineOutcome, RealFs, Rule};
use rand::Rng;

use crate::cli::TargetArgs;
use crate::rule_spec::build_pipeline;

pub fn molt_dir(cwd: &Path) -> PathBuf {
    cwd.join(".molt")
}

pub fn new_plan_id() -> String {
    let now = chrono::Utc::now().to_rfc3339();
    let entropy: String = {
        let mut rng = rand::thread_rng();
        (0..8).map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap()).collect()
    };
    molt_core::generate_id(&now, &entropy)
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Run `target`'s rule pipeline over every input path and feed the results
/// into a fresh `EngineContext`, ready for `RenamePlan::from_context`.
///
/// Every per-action failure (a missing input, a failed rule, an invalid
/// candidate name) is recorded as a `MoltError` in the returned list rather
/// than aborting the batch outright. When `continue_on_error` is `false`
/// (the spec's default propagation policy, §7), ingestion stops at the
/// first such error instead of bailing out of the process: the caller
/// decides whether to still act on the truncated context or to short-
/// circuit the whole run, and either way gets a typed error to fold into
/// `ExitCode` instead of a generic process exit.
pub fn build_engine_context(
    target: &TargetArgs,
    continue_on_error: bool,
) -> Result<(EngineContext<RealFs>, Vec<MoltError>)> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let mut pipeline = build_pipeline(&target.rules)?;
    let fs = RealFs;
    let mut ctx = EngineContext::new(fs);
    let total = target.paths.len();
    let mut errors = Vec::new();

    for (index, input) in target.paths.iter().enumerate() {
        let orig = CanonicalPath::new(input, &cwd);
        if !ctx.fs().exists(orig.as_path()) {
            errors.push(MoltError::FileNotFound(orig.into_path_buf()));
            if continue_on_error {
                continue;
            }
            break;
        }

        let subject = if target.process_fullname { orig.to_string() } else { orig.base().to_string() };
        let outcome = match run_pipeline(&mut pipeline, &subject, index, total, target.allow_path) {
            Ok(outcome) => outcome,
            Err(e) => {
                errors.push(MoltError::RuleRunFailed { path: orig.into_path_buf(), message: e.to_string() });
                if continue_on_error {
                    continue;
                }
                break;
            },
        };

        let new = match outcome {
            PipelineOutcome::Valid(name) => {
                let full = if target.process_fullname { PathBuf::from(name) } else { orig.sibling(&name) };
                let new = CanonicalPath::new(full, &cwd);
                if new == orig {
                    None
                } else {
                    Some(new)
                }
            },
            PipelineOutcome::Unchanged => None,
            PipelineOutcome::Invalid(name) => {
                errors.push(MoltError::InvalidNewName { path: orig.clone().into_path_buf(), name });
                None
            },
        };

        ctx.ingest(orig, new);
    }

    Ok((ctx, errors))
}

/// Print one diagnostic line per ingest error and fold them into the
/// `ExitCode` bits the spec's §6 exit-code union requires them to
/// contribute (file-not-found, rule-failed, invalid-name).
pub fn report_ingest_errors(errors: &[MoltError]) -> ExitCode {
    let mut code = ExitCode::empty();
    for err in errors {
        eprintln!("Error: {err}");
        code.insert(ExitCode::for_error(err));
    }
    code
}

/// Run the configured pipeline over each input without planning or
/// touching the filesystem; used by `plan --only-rules`.
pub fn run_rules_only(target: &TargetArgs) -> Result<Vec<(PathBuf, Option<String>)>> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let mut pipeline: Vec<Box<dyn Rule>> = build_pipeline(&target.rules)?;
    let total = target.paths.len();

    target
        .paths
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let orig = CanonicalPath::new(input, &cwd);
            let subject = if target.process_fullname { orig.to_string() } else { orig.base().to_string() };
            let outcome = run_pipeline(&mut pipeline, &subject, index, total, target.allow_path)
                .with_context(|| format!("{orig}: rule failed"))?;
            let candidate = match outcome {
                PipelineOutcome::Valid(name) => Some(name),
                PipelineOutcome::Unchanged | PipelineOutcome::Invalid(_) => None,
            };
            Ok((orig.into_path_buf(), candidate))
        })
        .collect()
}
