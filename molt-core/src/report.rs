//! The reporter (C7): turns a batch of `ActionReport`s into the lines the
//! CLI prints to stdout, honoring `OutputMode` and the two-step reordering
//! rule from spec §6: a two-step action's line is only emitted once its
//! pass-2 hop has actually landed, so output always reads in the order
//! names became real, not the order the planner walked them in.

use std::fmt::Write as _;

use crate::exec::{ActionReport, RenameOutcome};
use crate::options::OutputMode;

/// One reportable line, already decided to be worth printing.
#[derive(Debug, Clone)]
pub struct ReportLine {
    pub seq: u32,
    pub text: String,
    /// Whether this line describes a skipped/failed action; callers use
    /// this to decide whether to route it to stderr or fold it into the
    /// process exit code.
    pub is_error: bool,
}

/// Render `reports` (in any order; re-sorted here by `seq`) into the lines
/// a run should print, per `mode`.
pub fn render(reports: &[ActionReport], mode: OutputMode) -> Vec<ReportLine> {
    let mut sorted: Vec<&ActionReport> = reports.iter().collect();
    sorted.sort_by_key(|r| r.seq);

    sorted.iter().filter_map(|r| render_one(r, mode)).collect()
}

fn render_one(report: &ActionReport, mode: OutputMode) -> Option<ReportLine> {
    let seq = report.seq;
    match &report.outcome {
        RenameOutcome::NoOp { .. } => None,
        RenameOutcome::Renamed { orig, new } => Some(ReportLine {
            seq,
            text: format_pair(orig.display().to_string(), new.display().to_string(), mode),
            is_error: false,
        }),
        RenameOutcome::RenamedTwoStep { orig, new, .. } => Some(ReportLine {
            seq,
            text: format_pair(orig.display().to_string(), new.display().to_string(), mode),
            is_error: false,
        }),
        RenameOutcome::Skipped { orig, reason } => {
            Some(ReportLine { seq, text: format!("{}: {reason}", orig.display()), is_error: true })
        },
        RenameOutcome::Failed { orig, source, .. } => {
            Some(ReportLine { seq, text: format!("{}: {source}", orig.display()), is_error: true })
        },
    }
}

fn format_pair(orig: String, new: String, mode: OutputMode) -> String {
    match mode {
        OutputMode::Standard => format!("{orig} -> {new}"),
        OutputMode::NewNames => new,
        OutputMode::BothNames => {
            let mut out = String::new();
            let _ = writeln!(out, "{orig}");
            let _ = write!(out, "{new}");
            out
        },
    }
}

/// Summary counters for the final status line (`status`, end-of-run
/// messages).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_op: usize,
}

pub fn summarize(reports: &[ActionReport]) -> Summary {
    let mut summary = Summary::default();
    for report in reports {
        match &report.outcome {
            RenameOutcome::Renamed { .. } | RenameOutcome::RenamedTwoStep { .. } => summary.renamed += 1,
            RenameOutcome::Skipped { .. } => summary.skipped += 1,
            RenameOutcome::Failed { .. } => summary.failed += 1,
            RenameOutcome::NoOp { .. } => summary.no_op += 1,
        }
    }
    summary
}
