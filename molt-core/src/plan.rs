//! The classifier / planner (C2, C3, C4): the hard core of `molt`.
//!
//! Implements the four mutually-recursive classification operations that
//! decide, for every input path, whether it can rename in one step, needs
//! staging through a temporary name to break a cycle, collides with
//! another input in this same batch, or collides with something already
//! on disk that nothing in the batch is about to vacate. State lives in
//! an owned `EngineContext` rather than process-global hash tables, and
//! actions refer to each other through a stable `ActionId` index rather
//! than raw pointers, so cascading mutation doesn't fight the borrow
//! checker.

use crate::fs_probe::FsProbe;
use crate::paths::CanonicalPath;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Index into `EngineContext::actions`. Stable for the lifetime of the
/// context; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u32);

impl ActionId {
    /// Build an `ActionId` from a position in `EngineContext::actions()`.
    /// For callers (the executor, the reporter) that walk the action list
    /// by index rather than holding onto the ids `ingest` returned.
    pub fn from_index(idx: usize) -> Self {
        Self(u32::try_from(idx).expect("absurd number of actions"))
    }
}

/// The state set drawn from {TO_RENAME, TWO_STEPS, CONFLICT, CONFLICT_FS}.
/// A small bitset newtype, in the same spirit as `ExitCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionState(u8);

impl ActionState {
    pub const TO_RENAME: Self = Self(1 << 0);
    pub const TWO_STEPS: Self = Self(1 << 1);
    pub const CONFLICT: Self = Self(1 << 2);
    pub const CONFLICT_FS: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// One unit of intended work for a single input path.
#[derive(Debug, Clone)]
pub struct Action {
    /// Monotone sequence number assigned at ingest; governs execution
    /// order and cascade tie-breaks.
    pub seq: u32,
    pub orig: CanonicalPath,
    /// Absent if the rule pipeline produced no new name, or the candidate
    /// was invalid, or it is identical to `orig` (all equivalent to a
    /// no-op at the planner level).
    pub new: Option<CanonicalPath>,
    /// Staging name, assigned iff this action is classified two-step and
    /// actually executed.
    pub tmp: Option<PathBuf>,
    pub state: ActionState,
    /// Deferred diagnostic, used when output must be reordered around a
    /// two-step execution pass.
    pub error: Option<String>,
}

impl Action {
    fn new(seq: u32, orig: CanonicalPath, new: Option<CanonicalPath>) -> Self {
        Self {
            seq,
            orig,
            new,
            tmp: None,
            state: ActionState::empty(),
            error: None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.state.is_empty()
    }
}

/// Owns the action table, the reservation table, and the global counters.
/// Planner operations are methods on it; nothing here is global/static.
pub struct EngineContext<F: FsProbe> {
    actions: Vec<Action>,
    /// orig_full -> action owning that path as its original name.
    by_orig: HashMap<PathBuf, ActionId>,
    /// proposed_path -> the action currently claiming it. At most one
    /// live reservation per path.
    reservations: HashMap<PathBuf, ActionId>,
    nb_conflicts: usize,
    nb_two_steps: usize,
    fs: F,
}

impl<F: FsProbe> EngineContext<F> {
    pub fn new(fs: F) -> Self {
        Self {
            actions: Vec::new(),
            by_orig: HashMap::new(),
            reservations: HashMap::new(),
            nb_conflicts: 0,
            nb_two_steps: 0,
            fs,
        }
    }

    pub fn nb_conflicts(&self) -> usize {
        self.nb_conflicts
    }

    pub fn nb_two_steps(&self) -> usize {
        self.nb_two_steps
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.0 as usize]
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Record the staging name a two-step action was actually renamed to.
    /// Executor-only: the planner never assigns `tmp`.
    pub fn set_tmp(&mut self, id: ActionId, tmp: PathBuf) {
        self.actions[id.0 as usize].tmp = Some(tmp);
    }

    /// Ingest one input: assign a sequence number, record it in the action
    /// table, and classify it immediately if it proposes an actual rename.
    /// `new` must already be canonicalised (C1) and distinct from `orig`;
    /// pass `None` for a no-op (no candidate, or candidate equal to orig).
    pub fn ingest(&mut self, orig: CanonicalPath, new: Option<CanonicalPath>) -> ActionId {
        let seq = u32::try_from(self.actions.len()).expect("absurd number of actions") + 1;
        let id = ActionId(self.actions.len() as u32);
        self.by_orig.insert(orig.as_path().to_path_buf(), id);
        self.actions.push(Action::new(seq, orig, new));

        if self.actions[id.0 as usize].new.is_some() {
            self.plan(id);
        }
        id
    }

    fn state(&self, id: ActionId) -> ActionState {
        self.actions[id.0 as usize].state
    }

    fn set_state(&mut self, id: ActionId, state: ActionState) {
        self.actions[id.0 as usize].state = state;
    }

    fn target_of(&self, id: ActionId) -> PathBuf {
        self.actions[id.0 as usize]
            .new
            .as_ref()
            .expect("planner operation on an action with no candidate")
            .as_path()
            .to_path_buf()
    }

    /// Operation A's step 1, reused verbatim by Operation D: is the
    /// candidate target already reserved by a *different* action? If so,
    /// handle the resulting conflict(s) and report "blocked".
    fn reservation_check(&mut self, id: ActionId) -> bool {
        let target = self.target_of(id);
        let Some(&other) = self.reservations.get(&target) else {
            return false;
        };
        if other == id {
            return false;
        }

        let mut state = self.state(id);
        state.insert(ActionState::CONFLICT);
        self.set_state(id, state);
        self.nb_conflicts += 1;

        if !self.state(other).contains(ActionState::CONFLICT) {
            self.promote_to_conflict(other);
        }
        true
    }

    /// `b` already reserved a path some other action now also wants:
    /// promote `b` to the terminal CONFLICT state, cascading orphaning if
    /// `b` was previously going to free its own original name.
    fn promote_to_conflict(&mut self, b: ActionId) {
        let mut state = self.state(b);
        let was_two_steps = state.contains(ActionState::TWO_STEPS);
        let was_conflict_fs = state.contains(ActionState::CONFLICT_FS);
        let was_to_rename = state.contains(ActionState::TO_RENAME);

        if was_two_steps {
            self.nb_two_steps -= 1;
        }
        if !was_conflict_fs {
            self.nb_conflicts += 1;
        }

        state.remove(ActionState::TO_RENAME);
        state.remove(ActionState::TWO_STEPS);
        state.remove(ActionState::CONFLICT_FS);
        state.insert(ActionState::CONFLICT);
        self.set_state(b, state);

        if was_to_rename || was_conflict_fs {
            self.orphan(b);
        }
    }

    /// Operation A, entry point: classify `action` as to-rename if
    /// possible, on `action`'s own behalf.
    fn plan(&mut self, action: ActionId) {
        self.classify(action, action);
    }

    /// Operation A's actual body. `goal` is the action whose vacated
    /// original name this classification is ultimately being driven by
    /// (itself, at top-level entry; threaded through unchanged across a
    /// `try_resolve_fs` cascade otherwise). When `action`'s candidate
    /// target is exactly `goal`'s original name, `goal` is by construction
    /// the one about to free it, so the owner checks below are skipped:
    /// that path is known free without a table lookup.
    fn classify(&mut self, action: ActionId, goal: ActionId) {
        if self.reservation_check(action) {
            return;
        }

        let target = self.target_of(action);
        let owner = self.by_orig.get(&target).copied();

        match owner {
            None => {
                if self.fs.exists(&target) {
                    self.set_conflict_fs(action);
                    return;
                }
            },
            Some(o) if o == action => {},
            Some(o) if o == goal => {
                // `goal` is vacating this exact path for us; nothing more
                // to check.
            },
            Some(o) => {
                if self.state(o).contains(ActionState::TO_RENAME) {
                    // Owner will move away; fall through, noted for the
                    // two-step check in commit_to_rename.
                } else if self.state(o).contains(ActionState::CONFLICT_FS) {
                    let resolved = self.try_resolve_fs(o, action, goal);
                    if !(resolved && self.state(o).contains(ActionState::TO_RENAME)) {
                        self.set_conflict_fs(action);
                        return;
                    }
                } else {
                    // CONFLICT, or no new name, or new name == old: blocked.
                    self.set_conflict_fs(action);
                    return;
                }
            },
        }

        self.commit_to_rename(action, owner);
    }

    /// Step 4-5 of Operation A: reserve the target, mark TO_RENAME (with
    /// TWO_STEPS if the owner is walked by the executor after `action`),
    /// then unblock anything that was waiting on `action` to vacate its
    /// original name. By the time `owner` reaches here it is always
    /// either already TO_RENAME or, in the `goal`-shortcut case,
    /// guaranteed to become so by construction — no need to re-check.
    fn commit_to_rename(&mut self, action: ActionId, owner: Option<ActionId>) {
        let target = self.target_of(action);
        self.reservations.insert(target, action);

        let mut state = self.state(action);
        state.insert(ActionState::TO_RENAME);
        self.set_state(action, state);

        if let Some(o) = owner {
            if o != action && self.actions[o.0 as usize].seq > self.actions[action.0 as usize].seq {
                let mut state = self.state(action);
                state.insert(ActionState::TWO_STEPS);
                self.set_state(action, state);
                self.nb_two_steps += 1;
            }
        }

        self.unblock_waiting_on(action);
    }

    fn unblock_waiting_on(&mut self, action: ActionId) {
        let orig = self.actions[action.0 as usize].orig.as_path().to_path_buf();
        let Some(&waiting) = self.reservations.get(&orig) else {
            return;
        };
        if self.state(waiting).contains(ActionState::CONFLICT_FS) {
            let mut state = self.state(waiting);
            state.remove(ActionState::CONFLICT_FS);
            self.set_state(waiting, state);
            self.nb_conflicts -= 1;
            self.plan(waiting);
        }
    }

    /// Operation D: demote `action` to CONFLICT_FS (after first re-running
    /// the reservation check, since a demoted action is re-entering the
    /// classification it never left), then orphan it since it is no
    /// longer freeing its own original name.
    fn set_conflict_fs(&mut self, action: ActionId) {
        if self.reservation_check(action) {
            return;
        }

        let target = self.target_of(action);
        let mut state = self.state(action);
        state.insert(ActionState::CONFLICT_FS);
        self.set_state(action, state);
        self.nb_conflicts += 1;
        self.reservations.insert(target, action);

        self.orphan(action);
    }

    /// Operation C: `action` will no longer free its original name. Any
    /// other action `b` reserving `action.orig` as its target was
    /// depending on that; demote it to CONFLICT_FS.
    fn orphan(&mut self, action: ActionId) {
        let orig = self.actions[action.0 as usize].orig.as_path().to_path_buf();
        let Some(&b) = self.reservations.get(&orig) else {
            return;
        };
        if b == action || self.state(b).contains(ActionState::CONFLICT) {
            return;
        }

        let mut state = self.state(b);
        if state.contains(ActionState::TWO_STEPS) {
            self.nb_two_steps -= 1;
        }
        state.remove(ActionState::TO_RENAME);
        state.remove(ActionState::TWO_STEPS);
        self.set_state(b, state);

        self.set_conflict_fs(b);
    }

    /// Operation B: attempt to resolve `blocked`'s CONFLICT_FS because
    /// `pending` is about to take (or free a path towards) its target.
    /// `goal` is threaded through unchanged, for the recursive
    /// `classify` calls this performs on `blocked`'s behalf: a resolved
    /// `blocked` is reclassified "for" the same action that originally
    /// triggered this whole cascade, not for `pending` or for itself.
    fn try_resolve_fs(&mut self, blocked: ActionId, pending: ActionId, goal: ActionId) -> bool {
        let blocked_target = self.target_of(blocked);
        let pending_orig = self.actions[pending.0 as usize].orig.as_path().to_path_buf();

        if blocked_target == pending_orig {
            let mut state = self.state(blocked);
            state.remove(ActionState::CONFLICT_FS);
            self.set_state(blocked, state);
            self.nb_conflicts -= 1;
            self.classify(blocked, goal);
            return self.state(blocked).contains(ActionState::TO_RENAME);
        }

        match self.by_orig.get(&blocked_target).copied() {
            Some(owner) if self.state(owner).contains(ActionState::TO_RENAME) => {
                self.classify(blocked, goal);
                self.state(blocked).contains(ActionState::TO_RENAME)
            },
            Some(owner) if self.state(owner).contains(ActionState::CONFLICT_FS) => {
                if self.try_resolve_fs(owner, pending, goal) && self.state(owner).contains(ActionState::TO_RENAME) {
                    if !self.state(blocked).contains(ActionState::TO_RENAME) {
                        self.classify(blocked, goal);
                    }
                    self.state(blocked).contains(ActionState::TO_RENAME)
                } else {
                    false
                }
            },
            _ => false,
        }
    }

    /// Check invariants I1-I6 from spec §8. For tests.
    #[cfg(test)]
    fn assert_invariants(&self) {
        for (idx, action) in self.actions.iter().enumerate() {
            let id = ActionId(idx as u32);
            let s = action.state;

            assert!(
                !(s.contains(ActionState::CONFLICT) && s.contains(ActionState::CONFLICT_FS)),
                "I3: action {idx} is both CONFLICT and CONFLICT_FS"
            );
            assert!(
                !(s.contains(ActionState::CONFLICT) && s.contains(ActionState::TO_RENAME)),
                "I3: action {idx} is both CONFLICT and TO_RENAME"
            );
            assert!(
                !(s.contains(ActionState::CONFLICT_FS) && s.contains(ActionState::TO_RENAME)),
                "I4/I3: action {idx} is both CONFLICT_FS and TO_RENAME"
            );
            assert!(
                !s.contains(ActionState::TWO_STEPS) || s.contains(ActionState::TO_RENAME),
                "I4: action {idx} is TWO_STEPS without TO_RENAME"
            );

            if s.contains(ActionState::TO_RENAME) || s.contains(ActionState::CONFLICT_FS) {
                let target = action.new.as_ref().unwrap().as_path();
                assert_eq!(
                    self.reservations.get(target).copied(),
                    Some(id),
                    "I1/I2: action {idx} does not hold its own reservation"
                );
            }
        }

        let counted_conflicts = self
            .actions
            .iter()
            .filter(|a| a.state.contains(ActionState::CONFLICT) || a.state.contains(ActionState::CONFLICT_FS))
            .count();
        assert_eq!(counted_conflicts, self.nb_conflicts, "I5: nb_conflicts mismatch");

        let counted_two_steps = self
            .actions
            .iter()
            .filter(|a| a.state.contains(ActionState::TWO_STEPS))
            .count();
        assert_eq!(counted_two_steps, self.nb_two_steps, "I5: nb_two_steps mismatch");

        let mut seen_targets: HashMap<&Path, ActionId> = HashMap::new();
        for (idx, action) in self.actions.iter().enumerate() {
            if !action.state.contains(ActionState::TO_RENAME) {
                continue;
            }
            let id = ActionId(idx as u32);
            let target = action.new.as_ref().unwrap().as_path();
            if let Some(&prev) = seen_targets.get(target) {
                panic!("I6: actions {:?} and {idx} both TO_RENAME to {target:?}", prev);
            }
            seen_targets.insert(target, id);
        }
    }
}
