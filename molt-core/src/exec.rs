//! The executor (C5): walks the classified actions in sequence order and
//! performs the renames the planner decided on, staging two-step actions
//! through a temporary name so cyclic swaps don't need a real filesystem
//! transaction.
//!
//! Deliberately dumb relative to the planner: it does not re-derive any
//! ordering, it just walks `EngineContext::actions()` twice. Pass 1 does
//! every one-step rename directly and stages every two-step rename to a
//! temporary name; pass 2 (skipped entirely when there are no two-step
//! actions) finishes those by renaming the temporary name to the real
//! target.

use crate::artifact::PlannedAction;
use crate::error::MoltError;
use crate::fs_probe::FsProbe;
use crate::plan::{ActionId, ActionState, EngineContext};
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Don't touch the filesystem; report what would happen.
    pub dry_run: bool,
    /// Keep executing later actions after one rename fails, instead of
    /// stopping the batch at the first failure.
    pub continue_on_error: bool,
    /// Consulted between actions, never mid-rename: when set, a batch
    /// stops cleanly at the next action boundary instead of leaving a
    /// two-step action half-staged. The CLI's SIGINT/SIGTERM handler
    /// flips this; nothing in this crate ever sets it itself.
    pub cancelled: Option<Arc<AtomicBool>>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            continue_on_error: true,
            cancelled: None,
        }
    }
}

impl ExecOptions {
    fn is_cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|c| c.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
pub enum RenameOutcome {
    /// Renamed directly (possibly a dry-run no-op), `orig -> new`.
    Renamed { orig: PathBuf, new: PathBuf },
    /// A two-step rename went through both the staging and the final hop.
    RenamedTwoStep { orig: PathBuf, tmp: PathBuf, new: PathBuf },
    /// Never attempted: the action ended up CONFLICT or CONFLICT_FS.
    Skipped { orig: PathBuf, reason: MoltError },
    /// The rename syscall itself failed, at either hop.
    Failed { orig: PathBuf, attempted: PathBuf, source: MoltError },
    /// No candidate, or candidate equal to orig: nothing to do.
    NoOp { orig: PathBuf },
}

#[derive(Debug, Clone)]
pub struct ActionReport {
    pub action: ActionId,
    /// The action's planning-time sequence number, carried alongside
    /// `action` so a report is still identifiable after it has been
    /// serialized and reloaded (an `ActionId` is only meaningful against
    /// the `EngineContext` that produced it; `seq` is stable across that
    /// boundary).
    pub seq: u32,
    pub outcome: RenameOutcome,
}

/// Generates the `_molt_xxxxxxxx.basename` staging name used to unblock a
/// two-step rename, colliding with neither endpoint of any action.
fn temp_name(rng: &mut impl Rng, target_basename: &str) -> String {
    let suffix: String = (0..8).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
    format!("_molt_{suffix}.{target_basename}")
}

/// Run the two-pass execution described above against every TO_RENAME
/// action in `ctx`. Returns one report per action that had a candidate
/// (conflicted actions are reported too, as `Skipped`, so callers can
/// produce a complete diagnostic listing without a second pass over the
/// plan).
pub fn execute<F: FsProbe>(ctx: &mut EngineContext<F>, opts: &ExecOptions) -> Vec<ActionReport> {
    let mut rng = rand::thread_rng();
    let mut reports = Vec::with_capacity(ctx.actions().len());
    let mut stop = false;
    // Unresolved conflicts without permission to proceed anyway: perform no
    // renames at all, but still report every action so a caller can print
    // the full diagnostic listing.
    let gated = !opts.dry_run && !opts.continue_on_error && ctx.nb_conflicts() > 0;

    // Pass 1.
    for idx in 0..ctx.actions().len() {
        if !stop && opts.is_cancelled() {
            stop = true;
        }

        let id = ActionId::from_index(idx);
        let action = ctx.action(id);
        let seq = action.seq;
        let orig = action.orig.as_path().to_path_buf();

        if action.new.is_none() {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::NoOp { orig },
            });
            continue;
        }

        let state = action.state;
        if state.contains(ActionState::CONFLICT) || state.contains(ActionState::CONFLICT_FS) {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Skipped {
                    orig: orig.clone(),
                    reason: conflict_error(&orig, ctx, id),
                },
            });
            continue;
        }

        if !state.contains(ActionState::TO_RENAME) {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::NoOp { orig },
            });
            continue;
        }

        if gated {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Skipped {
                    orig: orig.clone(),
                    reason: MoltError::BatchGated(ctx.nb_conflicts()),
                },
            });
            continue;
        }

        if stop {
            let message = if opts.is_cancelled() {
                "batch cancelled"
            } else {
                "batch aborted after an earlier failure"
            };
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Skipped {
                    orig: orig.clone(),
                    reason: MoltError::InvalidArgument(message.into()),
                },
            });
            continue;
        }

        let new = ctx.action(id).new.as_ref().unwrap().as_path().to_path_buf();

        if state.contains(ActionState::TWO_STEPS) {
            let basename = ctx.action(id).new.as_ref().unwrap().base().to_string();
            let tmp = ctx.action(id).orig.sibling(&temp_name(&mut rng, &basename));

            if opts.dry_run {
                ctx.set_tmp(id, tmp.clone());
                reports.push(ActionReport {
                    action: id,
                    seq,
                    outcome: RenameOutcome::RenamedTwoStep { orig, tmp, new },
                });
                continue;
            }

            match ctx.fs().rename(&orig, &tmp) {
                Ok(()) => {
                    ctx.set_tmp(id, tmp);
                    // Pass 2 will report completion; nothing to push yet.
                },
                Err(source) => {
                    reports.push(ActionReport {
                        action: id,
                        seq,
                        outcome: RenameOutcome::Failed {
                            orig: orig.clone(),
                            attempted: tmp,
                            source: MoltError::RenameFailed { path: orig, new_path: new, source },
                        },
                    });
                    if !opts.continue_on_error {
                        stop = true;
                    }
                },
            }
        } else if opts.dry_run {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Renamed { orig, new },
            });
        } else {
            match ctx.fs().rename(&orig, &new) {
                Ok(()) => reports.push(ActionReport {
                    action: id,
                    seq,
                    outcome: RenameOutcome::Renamed { orig, new },
                }),
                Err(source) => {
                    reports.push(ActionReport {
                        action: id,
                        seq,
                        outcome: RenameOutcome::Failed {
                            orig: orig.clone(),
                            attempted: new.clone(),
                            source: MoltError::RenameFailed { path: orig, new_path: new, source },
                        },
                    });
                    if !opts.continue_on_error {
                        stop = true;
                    }
                },
            }
        }
    }

    // Pass 2: finish every two-step action that was successfully staged.
    if ctx.nb_two_steps() > 0 {
        for idx in 0..ctx.actions().len() {
            let id = ActionId::from_index(idx);
            let action = ctx.action(id);
            if !action.state.contains(ActionState::TWO_STEPS) {
                continue;
            }
            let seq = action.seq;
            let Some(tmp) = action.tmp.clone() else {
                // Staging never happened (dry-run already reported it
                // above, or pass 1 failed and skipped this action).
                continue;
            };
            let orig = action.orig.as_path().to_path_buf();
            let new = action.new.as_ref().unwrap().as_path().to_path_buf();

            if opts.dry_run {
                continue;
            }

            match ctx.fs().rename(&tmp, &new) {
                Ok(()) => reports.push(ActionReport {
                    action: id,
                    seq,
                    outcome: RenameOutcome::RenamedTwoStep { orig, tmp, new },
                }),
                Err(source) => reports.push(ActionReport {
                    action: id,
                    seq,
                    outcome: RenameOutcome::Failed {
                        orig,
                        attempted: new.clone(),
                        source: MoltError::RenameFailed { path: tmp, new_path: new, source },
                    },
                }),
            }
        }
    }

    reports
}

/// Execute a previously saved `RenamePlan`'s actions directly against `fs`,
/// without rebuilding an `EngineContext` (and therefore without
/// reclassifying anything: conflicts are trusted as already decided at
/// plan time). Used by `apply` when the plan being applied was loaded from
/// disk rather than just produced in the same process.
pub fn execute_planned<F: FsProbe>(actions: &[PlannedAction], fs: &F, opts: &ExecOptions) -> Vec<ActionReport> {
    let mut rng = rand::thread_rng();
    let mut reports = Vec::with_capacity(actions.len());
    let mut stop = false;
    let mut staged: Vec<Option<PathBuf>> = vec![None; actions.len()];
    let nb_conflicts = actions.iter().filter(|a| a.conflict || a.conflict_fs).count();
    let gated = !opts.dry_run && !opts.continue_on_error && nb_conflicts > 0;

    for (idx, action) in actions.iter().enumerate() {
        let id = ActionId::from_index(idx);
        let seq = action.seq;
        let orig = action.orig.clone();

        if action.new.is_none() || action.is_no_op() {
            reports.push(ActionReport { action: id, seq, outcome: RenameOutcome::NoOp { orig } });
            continue;
        }

        if action.conflict || action.conflict_fs {
            let reason = if action.conflict {
                MoltError::IntraBatchConflict(orig.clone())
            } else {
                MoltError::FsConflict { path: orig.clone(), new_name: action.new.clone().unwrap_or_default() }
            };
            reports.push(ActionReport { action: id, seq, outcome: RenameOutcome::Skipped { orig, reason } });
            continue;
        }

        if !action.to_rename {
            reports.push(ActionReport { action: id, seq, outcome: RenameOutcome::NoOp { orig } });
            continue;
        }

        if gated {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Skipped { orig: orig.clone(), reason: MoltError::BatchGated(nb_conflicts) },
            });
            continue;
        }

        if stop {
            reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Skipped {
                    orig: orig.clone(),
                    reason: MoltError::InvalidArgument("batch aborted after an earlier failure".into()),
                },
            });
            continue;
        }

        let new = action.new.clone().unwrap();

        if action.two_steps {
            let basename = new.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let parent = orig.parent().map(|p| p.to_path_buf()).unwrap_or_default();
            let tmp = parent.join(temp_name(&mut rng, &basename));

            if opts.dry_run {
                reports.push(ActionReport {
                    action: id,
                    seq,
                    outcome: RenameOutcome::RenamedTwoStep { orig, tmp, new },
                });
                continue;
            }

            match fs.rename(&orig, &tmp) {
                Ok(()) => staged[idx] = Some(tmp),
                Err(source) => {
                    reports.push(ActionReport {
                        action: id,
                        seq,
                        outcome: RenameOutcome::Failed {
                            orig: orig.clone(),
                            attempted: tmp,
                            source: MoltError::RenameFailed { path: orig, new_path: new, source },
                        },
                    });
                    if !opts.continue_on_error {
                        stop = true;
                    }
                },
            }
        } else if opts.dry_run {
            reports.push(ActionReport { action: id, seq, outcome: RenameOutcome::Renamed { orig, new } });
        } else {
            match fs.rename(&orig, &new) {
                Ok(()) => {
                    reports.push(ActionReport { action: id, seq, outcome: RenameOutcome::Renamed { orig, new } })
                },
                Err(source) => {
                    reports.push(ActionReport {
                        action: id,
                        seq,
                        outcome: RenameOutcome::Failed {
                            orig: orig.clone(),
                            attempted: new.clone(),
                            source: MoltError::RenameFailed { path: orig, new_path: new, source },
                        },
                    });
                    if !opts.continue_on_error {
                        stop = true;
                    }
                },
            }
        }
    }

    if opts.dry_run {
        return reports;
    }

    for (idx, action) in actions.iter().enumerate() {
        let Some(tmp) = staged[idx].clone() else {
            continue;
        };
        let id = ActionId::from_index(idx);
        let seq = action.seq;
        let orig = action.orig.clone();
        let new = action.new.clone().unwrap();

        match fs.rename(&tmp, &new) {
            Ok(()) => reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::RenamedTwoStep { orig, tmp, new },
            }),
            Err(source) => reports.push(ActionReport {
                action: id,
                seq,
                outcome: RenameOutcome::Failed {
                    orig,
                    attempted: new.clone(),
                    source: MoltError::RenameFailed { path: tmp, new_path: new, source },
                },
            }),
        }
    }

    reports
}

fn conflict_error<F: FsProbe>(orig: &std::path::Path, ctx: &EngineContext<F>, id: ActionId) -> MoltError {
    let action = ctx.action(id);
    if action.state.contains(ActionState::CONFLICT) {
        MoltError::IntraBatchConflict(orig.to_path_buf())
    } else {
        MoltError::FsConflict {
            path: orig.to_path_buf(),
            new_name: action.new.as_ref().map(|p| p.as_path().to_path_buf()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_probe::FakeFs;
    use crate::paths::CanonicalPath;
    use std::path::Path;

    fn cwd() -> PathBuf {
        PathBuf::from("/w")
    }

    fn cp(s: &str) -> CanonicalPath {
        CanonicalPath::new(s, &cwd())
    }

    #[test]
    fn one_step_rename_executes_directly() {
        let fs = FakeFs::new([cp("a").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        let id = ctx.ingest(cp("a"), Some(cp("b")));

        let reports = execute(&mut ctx, &ExecOptions::default());

        assert!(matches!(reports[0].outcome, RenameOutcome::Renamed { .. }));
        assert!(ctx.fs().exists(Path::new("/w/b")));
        assert!(!ctx.fs().exists(Path::new("/w/a")));
        let _ = id;
    }

    #[test]
    fn swap_cycle_executes_via_staging() {
        let fs = FakeFs::new([cp("a").into_path_buf(), cp("b").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("b")));
        ctx.ingest(cp("b"), Some(cp("a")));
        assert_eq!(ctx.nb_two_steps(), 1);

        let reports = execute(&mut ctx, &ExecOptions::default());

        assert!(ctx.fs().exists(Path::new("/w/a")));
        assert!(ctx.fs().exists(Path::new("/w/b")));
        assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::RenamedTwoStep { .. })));
        assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::Renamed { .. })));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let fs = FakeFs::new([cp("a").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("b")));

        let opts = ExecOptions { dry_run: true, ..ExecOptions::default() };
        execute(&mut ctx, &opts);

        assert!(ctx.fs().exists(Path::new("/w/a")));
        assert!(!ctx.fs().exists(Path::new("/w/b")));
    }

    #[test]
    fn cancelled_before_execution_skips_every_action() {
        let fs = FakeFs::new([cp("a").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("b")));

        let cancelled = Arc::new(AtomicBool::new(true));
        let opts = ExecOptions { cancelled: Some(cancelled), ..ExecOptions::default() };
        let reports = execute(&mut ctx, &opts);

        assert!(matches!(reports[0].outcome, RenameOutcome::Skipped { .. }));
        assert!(ctx.fs().exists(Path::new("/w/a")));
    }

    #[test]
    fn conflicted_action_is_skipped_not_attempted() {
        let fs = FakeFs::new([cp("a").into_path_buf(), cp("c").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("b")));
        ctx.ingest(cp("c"), Some(cp("b")));

        let reports = execute(&mut ctx, &ExecOptions::default());

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| matches!(r.outcome, RenameOutcome::Skipped { .. })));
    }

    #[test]
    fn execute_planned_replays_a_swap_cycle_from_a_loaded_plan() {
        let fs = FakeFs::new([cp("a").into_path_buf(), cp("b").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("b")));
        ctx.ingest(cp("b"), Some(cp("a")));

        let planned: Vec<PlannedAction> = ctx
            .actions()
            .iter()
            .map(|a| PlannedAction {
                seq: a.seq,
                orig: a.orig.as_path().to_path_buf(),
                new: a.new.as_ref().map(|p| p.as_path().to_path_buf()),
                to_rename: a.state.contains(ActionState::TO_RENAME),
                two_steps: a.state.contains(ActionState::TWO_STEPS),
                conflict: a.state.contains(ActionState::CONFLICT),
                conflict_fs: a.state.contains(ActionState::CONFLICT_FS),
            })
            .collect();

        let reports = execute_planned(&planned, ctx.fs(), &ExecOptions::default());

        assert!(ctx.fs().exists(Path::new("/w/a")));
        assert!(ctx.fs().exists(Path::new("/w/b")));
        assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::RenamedTwoStep { .. })));
        assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::Renamed { .. })));
    }

    #[test]
    fn unresolved_conflicts_without_continue_on_error_gate_the_whole_batch() {
        let fs = FakeFs::new([cp("a").into_path_buf(), cp("b").into_path_buf(), cp("c").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("z")));
        ctx.ingest(cp("b"), Some(cp("z")));
        ctx.ingest(cp("c"), Some(cp("d")));
        assert!(ctx.nb_conflicts() > 0);

        let opts = ExecOptions { continue_on_error: false, ..ExecOptions::default() };
        let reports = execute(&mut ctx, &opts);

        assert!(reports.iter().all(|r| matches!(r.outcome, RenameOutcome::Skipped { .. })));
        assert!(ctx.fs().exists(Path::new("/w/a")));
        assert!(ctx.fs().exists(Path::new("/w/c")));
        assert!(!ctx.fs().exists(Path::new("/w/d")));
    }

    #[test]
    fn continue_on_error_still_executes_the_unconflicted_actions() {
        let fs = FakeFs::new([cp("a").into_path_buf(), cp("b").into_path_buf(), cp("c").into_path_buf()]);
        let mut ctx = EngineContext::new(fs);
        ctx.ingest(cp("a"), Some(cp("z")));
        ctx.ingest(cp("b"), Some(cp("z")));
        ctx.ingest(cp("c"), Some(cp("d")));

        let opts = ExecOptions { continue_on_error: true, ..ExecOptions::default() };
        execute(&mut ctx, &opts);

        assert!(ctx.fs().exists(Path::new("/w/d")));
        assert!(!ctx.fs().exists(Path::new("/w/c")));
    }

    #[test]
    fn execute_planned_skips_conflicted_actions_without_touching_fs() {
        let fs = FakeFs::new([cp("a").into_path_buf()]);
        let planned = vec![PlannedAction {
            seq: 1,
            orig: cp("a").into_path_buf(),
            new: Some(cp("b").into_path_buf()),
            to_rename: false,
            two_steps: false,
            conflict: true,
            conflict_fs: false,
        }];

        let reports = execute_planned(&planned, &fs, &ExecOptions::default());

        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].outcome, RenameOutcome::Skipped { .. }));
        assert!(fs.exists(Path::new("/w/a")));
    }
}
