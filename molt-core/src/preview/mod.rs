//! Plan preview rendering: a `--preview <table|json|summary>` switch.
//! There is no content diff in a pure rename batch, so `table` and
//! `summary` render the planned moves directly, and `json` is just the
//! serialized `RenamePlan` for scripting.

mod summary;
mod table;

pub use summary::render_summary;
pub use table::render_table;

use std::io::{self, IsTerminal, Write};

use anyhow::Result;

use crate::artifact::RenamePlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    Table,
    Json,
    Summary,
    None,
}

impl std::str::FromStr for Preview {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "summary" => Ok(Self::Summary),
            "none" => Ok(Self::None),
            other => Err(format!("invalid preview format: {other}")),
        }
    }
}

/// Honor an explicit `--color`/`--no-color` choice; fall back to terminal
/// detection only when the caller left it unset.
pub fn should_use_color(use_color: Option<bool>) -> bool {
    should_use_color_with_detector(use_color, || io::stdout().is_terminal())
}

pub fn should_use_color_with_detector<F: Fn() -> bool>(use_color: Option<bool>, is_terminal: F) -> bool {
    use_color.unwrap_or_else(is_terminal)
}

pub fn render_preview(plan: &RenamePlan, format: Preview, use_color: Option<bool>) -> String {
    let use_color = should_use_color(use_color);
    match format {
        Preview::Table => render_table(plan, use_color),
        Preview::Summary => render_summary(plan),
        Preview::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
        Preview::None => String::new(),
    }
}

pub fn write_preview(plan: &RenamePlan, format: Preview, use_color: Option<bool>) -> Result<()> {
    let output = render_preview(plan, format, use_color);
    let mut stdout = io::stdout();
    write!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
