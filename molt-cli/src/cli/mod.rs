pub mod args;
pub mod types;

pub use args::{Cli, Commands, TargetArgs};
pub use types::{FormatArg, OutputModeArg, PreviewArg};
