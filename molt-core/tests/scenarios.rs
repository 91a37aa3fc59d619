//! Integration-level replays of the planner's six canonical classification
//! scenarios (simple rename, swap cycle, intra-batch conflict, unresolved
//! filesystem conflict, a filesystem conflict resolved by a rename chain,
//! and an orphaning cascade), exercising the public API end to end
//! (`EngineContext::ingest` through `execute`) against an in-memory
//! `FakeFs`, rather than just the planner's internal state as the unit
//! tests in `molt-core::plan` do.

use molt_core::{execute, ActionState, CanonicalPath, EngineContext, ExecOptions, FakeFs, FsProbe, RenameOutcome};
use std::path::{Path, PathBuf};

fn cwd() -> PathBuf {
    PathBuf::from("/w")
}

fn cp(s: &str) -> CanonicalPath {
    CanonicalPath::new(s, &cwd())
}

fn ctx(existing: &[&str]) -> EngineContext<FakeFs> {
    EngineContext::new(FakeFs::new(existing.iter().map(|s| cp(s).into_path_buf())))
}

#[test]
fn scenario_1_simple_rename_lands_on_disk() {
    let mut context = ctx(&["a"]);
    context.ingest(cp("a"), Some(cp("b")));

    let reports = execute(&mut context, &ExecOptions::default());

    assert!(reports.iter().all(|r| matches!(r.outcome, RenameOutcome::Renamed { .. })));
    assert!(context.fs().exists(Path::new("/w/b")));
    assert!(!context.fs().exists(Path::new("/w/a")));
}

#[test]
fn scenario_2_swap_cycle_lands_both_files_via_staging() {
    let mut context = ctx(&["a", "b"]);
    context.ingest(cp("a"), Some(cp("b")));
    context.ingest(cp("b"), Some(cp("a")));
    assert_eq!(context.nb_two_steps(), 1);

    let reports = execute(&mut context, &ExecOptions::default());

    assert!(context.fs().exists(Path::new("/w/a")));
    assert!(context.fs().exists(Path::new("/w/b")));
    assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::RenamedTwoStep { .. })));
}

#[test]
fn scenario_3_intra_batch_conflict_renames_nothing() {
    let mut context = ctx(&["a", "c"]);
    context.ingest(cp("a"), Some(cp("b")));
    context.ingest(cp("c"), Some(cp("b")));
    assert_eq!(context.nb_conflicts(), 2);

    let reports = execute(&mut context, &ExecOptions::default());

    assert!(reports.iter().all(|r| matches!(r.outcome, RenameOutcome::Skipped { .. })));
    assert!(context.fs().exists(Path::new("/w/a")));
    assert!(context.fs().exists(Path::new("/w/c")));
    assert!(!context.fs().exists(Path::new("/w/b")));
}

#[test]
fn scenario_4_unresolved_fs_conflict_blocks_the_whole_chain() {
    // a->b, b->c; FS has a, b, and a pre-existing c that nothing frees.
    let mut context = ctx(&["a", "b", "c"]);
    let b = context.ingest(cp("b"), Some(cp("c")));
    let a = context.ingest(cp("a"), Some(cp("b")));

    assert!(context.action(a).state.contains(ActionState::CONFLICT_FS));
    assert!(context.action(b).state.contains(ActionState::CONFLICT_FS));

    let reports = execute(&mut context, &ExecOptions::default());
    assert!(reports.iter().all(|r| matches!(r.outcome, RenameOutcome::Skipped { .. })));
    for name in ["/w/a", "/w/b", "/w/c"] {
        assert!(context.fs().exists(Path::new(name)));
    }
}

#[test]
fn scenario_5_fs_conflict_resolved_by_chain_renames_every_link() {
    // a->b, b->c, c->d; FS has a, b, c (not d): the chain fully resolves.
    let mut context = ctx(&["a", "b", "c"]);
    context.ingest(cp("b"), Some(cp("c")));
    context.ingest(cp("c"), Some(cp("d")));
    context.ingest(cp("a"), Some(cp("b")));
    assert_eq!(context.nb_conflicts(), 0);

    execute(&mut context, &ExecOptions::default());

    assert!(context.fs().exists(Path::new("/w/b")));
    assert!(context.fs().exists(Path::new("/w/c")));
    assert!(context.fs().exists(Path::new("/w/d")));
    assert!(!context.fs().exists(Path::new("/w/a")));
}

#[test]
fn scenario_6_orphaning_cascade_renames_only_the_winner() {
    // a->b, c->a, d->a: c wins the reservation on `a`'s vacated name first,
    // d loses and drags c down with it via the orphaning cascade.
    let mut context = ctx(&["a", "c", "d"]);
    context.ingest(cp("a"), Some(cp("b")));
    context.ingest(cp("c"), Some(cp("a")));
    context.ingest(cp("d"), Some(cp("a")));
    assert_eq!(context.nb_conflicts(), 2);

    execute(&mut context, &ExecOptions::default());

    assert!(context.fs().exists(Path::new("/w/b")));
    assert!(context.fs().exists(Path::new("/w/c")));
    assert!(context.fs().exists(Path::new("/w/d")));
    assert!(!context.fs().exists(Path::new("/w/a")));
}

#[test]
fn dry_run_plans_a_swap_cycle_without_touching_disk() {
    let mut context = ctx(&["a", "b"]);
    context.ingest(cp("a"), Some(cp("b")));
    context.ingest(cp("b"), Some(cp("a")));

    let opts = ExecOptions { dry_run: true, ..ExecOptions::default() };
    let reports = execute(&mut context, &opts);

    assert!(reports.iter().any(|r| matches!(r.outcome, RenameOutcome::RenamedTwoStep { .. })));
    assert!(context.fs().exists(Path::new("/w/a")));
    assert!(context.fs().exists(Path::new("/w/b")));
}
