//! `clap::ValueEnum` wrappers around `molt-core`'s plain enums: clap needs
//! its own type to derive `ValueEnum` on, so each of these just forwards
//! to the core type it mirrors.

use clap::ValueEnum;
use molt_core::{OutputFormat as CoreOutputFormat, OutputMode, Preview};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PreviewArg {
    Table,
    Json,
    Summary,
    None,
}

impl From<PreviewArg> for Preview {
    fn from(arg: PreviewArg) -> Self {
        match arg {
            PreviewArg::Table => Self::Table,
            PreviewArg::Json => Self::Json,
            PreviewArg::Summary => Self::Summary,
            PreviewArg::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputModeArg {
    Standard,
    NewNames,
    BothNames,
}

impl From<OutputModeArg> for OutputMode {
    fn from(arg: OutputModeArg) -> Self {
        match arg {
            OutputModeArg::Standard => Self::Standard,
            OutputModeArg::NewNames => Self::NewNames,
            OutputModeArg::BothNames => Self::BothNames,
        }
    }
}

/// The `--format` flag that picks how the CLI's own result (plan counters,
/// apply counters, ...) is printed, as opposed to `--output` which picks
/// how individual rename lines are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Summary,
    Json,
}

impl From<FormatArg> for CoreOutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Summary => Self::Summary,
            FormatArg::Json => Self::Json,
        }
    }
}
