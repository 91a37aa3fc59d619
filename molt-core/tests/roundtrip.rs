//! Property test: any batch of renames this engine decides to execute,
//! when reversed and replayed against the resulting filesystem state,
//! restores the original state exactly. Covers the rename/swap/chain/
//! conflict shapes that the hand-written scenario tests enumerate
//! individually, but over randomly generated batches.

use molt_core::{execute, CanonicalPath, EngineContext, ExecOptions, FakeFs, FsProbe, RenameOutcome};
use proptest::prelude::*;
use std::path::PathBuf;

fn cwd() -> PathBuf {
    PathBuf::from("/w")
}

fn cp(s: &str) -> CanonicalPath {
    CanonicalPath::new(s, &cwd())
}

const NAMES: [&str; 5] = ["a", "b", "c", "d", "e"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// `mapping[i]` is the index into `NAMES` that entry `i` proposes to
    /// become. Entries proposing themselves are no-ops; everything else
    /// is some shape of rename, swap, chain, or intra-batch conflict,
    /// depending on how the indices collide.
    #[test]
    fn reversing_every_performed_rename_restores_the_original_fs_state(
        mapping in prop::collection::vec(0usize..NAMES.len(), 2..=NAMES.len())
    ) {
        let n = mapping.len();
        let existing: Vec<PathBuf> = NAMES[..n].iter().map(|s| cp(s).into_path_buf()).collect();

        let fs = FakeFs::new(existing);
        let mut context = EngineContext::new(fs);
        for (i, &target_idx) in mapping.iter().enumerate() {
            let orig = cp(NAMES[i]);
            let candidate = cp(NAMES[target_idx]);
            let new = if candidate == orig { None } else { Some(candidate) };
            context.ingest(orig, new);
        }

        let original_snapshot = context.fs().snapshot();
        let reports = execute(&mut context, &ExecOptions::default());

        let mut forward_renames = Vec::new();
        for report in &reports {
            match &report.outcome {
                RenameOutcome::Renamed { orig, new } => forward_renames.push((orig.clone(), new.clone())),
                RenameOutcome::RenamedTwoStep { orig, new, .. } => forward_renames.push((orig.clone(), new.clone())),
                _ => {},
            }
        }

        let fs_after = context.fs().snapshot();
        let reverse_fs = FakeFs::new(fs_after);
        let mut reverse_context = EngineContext::new(reverse_fs);
        for (orig, new) in &forward_renames {
            reverse_context.ingest(
                CanonicalPath::new(new, &cwd()),
                Some(CanonicalPath::new(orig, &cwd())),
            );
        }
        execute(&mut reverse_context, &ExecOptions::default());

        prop_assert_eq!(reverse_context.fs().snapshot(), original_snapshot);
    }
}
