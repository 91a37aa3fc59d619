//! Planner-visible options (spec §6): the small set of flags that change
//! how the rule driver, executor, and reporter behave, without touching
//! the classifier itself (C4 never consults these — it only ever sees
//! candidates the driver already validated).

use serde::{Deserialize, Serialize};

/// Report format (C7, spec §4.5 / §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// `old -> new`
    Standard,
    /// `new` only.
    NewNames,
    /// `old` then `new` on separate lines.
    BothNames,
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Standard
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "new-names" | "new_names" => Ok(Self::NewNames),
            "both-names" | "both_names" => Ok(Self::BothNames),
            other => Err(format!("unknown output mode: {other}")),
        }
    }
}

/// The full set of flags spec §6 lists as "planner-visible options". None
/// of these change Operations A-D; they change what the driver hands the
/// planner, and what the executor/reporter do with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Execute renames even when `nb_conflicts > 0`.
    pub continue_on_error: bool,
    /// Skip all rename syscalls; still emit the plan.
    pub dry_run: bool,
    /// Imply dry-run; skip conflict detection entirely and emit raw rule
    /// output per action, unplanned.
    pub only_rules: bool,
    /// Rules receive the absolute path, not just the basename; implies
    /// `output_fullname`.
    pub process_fullname: bool,
    /// Allow separators in a rule's new name (relative to the action's
    /// directory); implies `output_fullname`.
    pub allow_path: bool,
    /// Report absolute paths rather than basenames.
    pub output_fullname: bool,
    /// Report format.
    pub output: OutputMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            dry_run: false,
            only_rules: false,
            process_fullname: false,
            allow_path: false,
            output_fullname: false,
            output: OutputMode::default(),
        }
    }
}

impl RunOptions {
    /// `only-rules` implies `dry-run`.
    pub const fn effective_dry_run(&self) -> bool {
        self.dry_run || self.only_rules
    }

    /// `process-fullname` and `allow-path` both imply `output-fullname`.
    pub const fn effective_output_fullname(&self) -> bool {
        self.output_fullname || self.process_fullname || self.allow_path
    }
}
