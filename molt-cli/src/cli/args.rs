use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::types::{FormatArg, OutputModeArg, PreviewArg};

/// Batch file-renaming engine with conflict-free planning.
#[derive(Parser, Debug)]
#[command(name = "molt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Assume yes for all prompts
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,
}

/// Arguments shared by `plan` and `apply --in-place`: the inputs and the
/// rule pipeline that turns each one's basename into a candidate new name.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Input paths to plan renames for
    pub paths: Vec<PathBuf>,

    /// A rule to append to the pipeline, `kind:args` (see `molt-rules(7)`);
    /// repeatable, applied in the order given. Kinds: `sub:FROM:TO`,
    /// `regex:PATTERN:REPLACEMENT`, `case:STYLE`, `number[:WIDTH]`,
    /// `template:TEMPLATE`, `stdin` (read one replacement name per line).
    #[arg(long = "rule", value_name = "SPEC")]
    pub rules: Vec<String>,

    /// Allow path separators in a rule's output, relative to the action's
    /// own directory
    #[arg(long)]
    pub allow_path: bool,

    /// Rules receive the action's full path rather than just its basename
    #[arg(long)]
    pub process_fullname: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute a conflict-free rename plan and write it to disk
    Plan {
        #[command(flatten)]
        target: TargetArgs,

        /// Where to write the plan artifact
        #[arg(long, default_value = ".molt/plan.json")]
        plan_out: PathBuf,

        /// Skip conflict planning entirely; emit each rule's raw output,
        /// one candidate per input, unplanned (implies --dry-run)
        #[arg(long)]
        only_rules: bool,

        /// Don't write the plan artifact; only print the preview
        #[arg(long)]
        dry_run: bool,

        /// Report full paths rather than basenames in the preview
        #[arg(long)]
        output_fullname: bool,

        /// How individual rename lines are printed
        #[arg(long, value_enum, default_value = "standard")]
        output: OutputModeArg,

        /// How to render the plan on stdout
        #[arg(long, value_enum, default_value = "table")]
        preview: PreviewArg,

        /// Output format for the plan summary printed after the preview
        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,

        /// Suppress the preview (alias for --preview none)
        #[arg(long)]
        quiet: bool,
    },

    /// Execute a previously written plan, or plan-then-apply in one step
    Apply {
        /// Plan file to execute (defaults to .molt/plan.json)
        plan: Option<PathBuf>,

        /// Compute the plan from paths/rules and execute it immediately,
        /// instead of loading a saved plan
        #[arg(long)]
        in_place: bool,

        #[command(flatten)]
        target: TargetArgs,

        /// Execute the unconflicted actions even though the batch has
        /// unresolved conflicts (by default the whole batch is held)
        #[arg(long)]
        continue_on_error: bool,

        /// Don't touch the filesystem; report what would happen
        #[arg(long)]
        dry_run: bool,

        /// Output format for the apply summary
        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,

        /// Suppress per-action output, print only the summary
        #[arg(long)]
        quiet: bool,
    },

    /// Undo a previously applied batch
    Undo {
        /// History id to undo, or "latest" for the most recent non-reverted entry
        id: String,

        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,
    },

    /// Redo a previously undone batch
    Redo {
        /// History id to redo, or "latest" for the most recently reverted entry
        id: String,

        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,
    },

    /// Show whether a batch is in progress and the most recent plan/history
    Status {
        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,
    },

    /// List previously applied (and undone) batches
    History {
        /// Limit to the N most recent entries
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, value_enum, default_value = "summary")]
        format: FormatArg,
    },

    /// Acquire the lock and hold it for a while; used by the signal-handling
    /// integration tests to exercise SIGINT/SIGTERM cleanup end-to-end
    #[command(hide = true)]
    TestLock {
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
}
