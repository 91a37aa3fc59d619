//! The serializable plan artifact: what `plan` writes to disk and
//! `apply`/`--dry-run` inspection reads back. A plain `serde`-derived
//! snapshot of an `EngineContext`, decoupled from the live planner so
//! `apply` can re-execute a plan without re-running the classifier
//! against (potentially changed) disk state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fs_probe::FsProbe;
use crate::options::RunOptions;
use crate::plan::{ActionState, EngineContext};

/// A serializable projection of one `Action`, as it stood right after
/// planning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedAction {
    pub seq: u32,
    pub orig: PathBuf,
    pub new: Option<PathBuf>,
    pub to_rename: bool,
    pub two_steps: bool,
    pub conflict: bool,
    pub conflict_fs: bool,
}

impl PlannedAction {
    pub fn is_no_op(&self) -> bool {
        !self.to_rename && !self.conflict && !self.conflict_fs
    }
}

/// The artifact written by `plan` and consumed by `apply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    /// A short, random-looking token identifying this plan, stable across
    /// `plan` -> `apply` -> `history`.
    pub id: String,
    /// RFC3339 timestamp of when the plan was computed.
    pub created_at: String,
    pub actions: Vec<PlannedAction>,
    pub options: RunOptions,
    pub nb_conflicts: usize,
    pub nb_two_steps: usize,
}

impl RenamePlan {
    /// Snapshot `ctx` into a `RenamePlan`. Called once, right after every
    /// input has been ingested and classified.
    pub fn from_context<F: FsProbe>(
        ctx: &EngineContext<F>,
        id: String,
        created_at: String,
        options: RunOptions,
    ) -> Self {
        let actions = ctx
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

        Self { id, created_at, actions, options, nb_conflicts: ctx.nb_conflicts(), nb_two_steps: ctx.nb_two_steps() }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse plan file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write plan file: {}", path.display()))
    }
}

/// A timestamp-prefixed, low-collision-risk token for naming applied
/// batches in the history log.
pub fn generate_id(now_rfc3339: &str, entropy: &str) -> String {
    let compact: String = now_rfc3339.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let prefix = &compact[..compact.len().min(14)];
    format!("{prefix}-{entropy}")
}
