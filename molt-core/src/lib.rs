#![allow(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! `molt-core`: the batch file-renaming engine.
//!
//! `plan` is the hard core (C1-C4, the classifier/planner); `exec` and
//! `rules` are its two collaborators (the executor and the rule pipeline
//! driver); everything else is the ambient stack a complete crate needs
//! around that core — config, history/undo, locking, reporting, and a
//! serializable plan artifact.

pub mod artifact;
pub mod case_model;
pub mod config;
pub mod error;
pub mod exec;
pub mod fs_probe;
pub mod history;
pub mod lock;
pub mod options;
pub mod output;
pub mod paths;
pub mod plan;
pub mod preview;
pub mod report;
pub mod rules;

pub use artifact::{generate_id, PlannedAction, RenamePlan};
pub use case_model::{coerce, detect_style, parse_to_tokens, to_style, Style, Token, TokenModel};
pub use config::{Config, DefaultsConfig};
pub use error::{ExitCode, MoltError};
pub use exec::{execute, execute_planned, ActionReport, ExecOptions, RenameOutcome};
pub use fs_probe::{FakeFs, FsProbe, RealFs};
pub use history::{History, HistoryEntry};
pub use lock::LockFile;
pub use options::{OutputMode, RunOptions};
pub use output::{ApplyResult, HistoryResult, OutputFormat, OutputFormatter, PlanResult, RedoResult, StatusResult, UndoResult};
pub use paths::CanonicalPath;
pub use plan::{ActionId, ActionState, EngineContext};
pub use preview::{render_preview, Preview};
pub use report::{render, summarize, ReportLine, Summary};
pub use rules::{
    check_stdin_consumers, run_pipeline, CaseStyleRule, NamesListRule, NumberingRule, PipelineOutcome, RegexRule,
    Rule, RuleContext, RuleOutcome, SubstringRule, TemplateRule,
};
