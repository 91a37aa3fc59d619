use std::path::PathBuf;
use thiserror::Error;

/// Typed errors a caller might want to match on, as opposed to the
/// `anyhow::Error` used everywhere else for plain propagation.
#[derive(Debug, Error)]
pub enum MoltError {
    #[error("{0}: no such file or directory")]
    FileNotFound(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("rule init failed: {0}")]
    RuleInitFailed(String),

    #[error("{path}: rule failed: {message}")]
    RuleRunFailed { path: PathBuf, message: String },

    #[error("{path}: invalid new name: {name}")]
    InvalidNewName { path: PathBuf, name: String },

    #[error("{0}: cannot be renamed, conflict")]
    IntraBatchConflict(PathBuf),

    #[error("{path}: cannot be renamed, new name ({new_name}) in use")]
    FsConflict { path: PathBuf, new_name: PathBuf },

    #[error("{path}: rename to {new_path} failed: {source}")]
    RenameFailed {
        path: PathBuf,
        new_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("execution held: batch has {0} unresolved conflict(s); rerun with continue-on-error to proceed anyway")]
    BatchGated(usize),
}

/// Exit-code bit union, one bit per error category (spec §6). A small
/// newtype rather than an external bitflags dependency: the set is fixed
/// and tiny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitCode(u32);

impl ExitCode {
    pub const FILE_NOT_FOUND: Self = Self(1 << 0);
    pub const SYNTAX: Self = Self(1 << 1);
    pub const RULE_FAILED: Self = Self(1 << 2);
    pub const INVALID_NAME: Self = Self(1 << 3);
    pub const CONFLICT_FS: Self = Self(1 << 4);
    pub const CONFLICT_RENAME: Self = Self(1 << 5);
    pub const RENAME_FAILURE: Self = Self(1 << 6);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Collapse into the process exit code: 0 on success, the bit union
    /// otherwise, with a defensive fallback to 255 if somehow non-empty
    /// errors produced an empty union.
    pub fn into_process_code(self) -> i32 {
        if self.is_empty() {
            0
        } else {
            i32::try_from(self.0).unwrap_or(255)
        }
    }

    pub fn for_error(err: &MoltError) -> Self {
        match err {
            MoltError::FileNotFound(_) => Self::FILE_NOT_FOUND,
            MoltError::InvalidArgument(_) => Self::SYNTAX,
            MoltError::RuleInitFailed(_) | MoltError::RuleRunFailed { .. } => Self::RULE_FAILED,
            MoltError::InvalidNewName { .. } => Self::INVALID_NAME,
            MoltError::IntraBatchConflict(_) => Self::CONFLICT_RENAME,
            MoltError::FsConflict { .. } => Self::CONFLICT_FS,
            MoltError::RenameFailed { .. } => Self::RENAME_FAILURE,
            // The actions actually in conflict already contribute
            // CONFLICT_RENAME/CONFLICT_FS; this variant marks their
            // otherwise-clean batch-mates as held, not itself a new cause.
            MoltError::BatchGated(_) => Self::empty(),
        }
    }
}

impl std::ops::BitOr for ExitCode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ExitCode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}
