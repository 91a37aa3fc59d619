use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::artifact::{PlannedAction, RenamePlan};

fn state_label(action: &PlannedAction) -> &'static str {
    if action.conflict {
        "conflict"
    } else if action.conflict_fs {
        "conflict (fs)"
    } else if action.two_steps {
        "to-rename (two-step)"
    } else if action.to_rename {
        "to-rename"
    } else {
        "no-op"
    }
}

/// Render a `RenamePlan` as a `comfy-table` of seq/orig/new/state, one row
/// per action, plus a totals row — the humans-reading-a-terminal
/// counterpart to `Preview::Json`.
pub fn render_table(plan: &RenamePlan, use_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let header = |text: &str| if use_color { Cell::new(text).fg(Color::Cyan) } else { Cell::new(text) };
    table.set_header(vec![header("Seq"), header("Original"), header("New"), header("State")]);

    for action in &plan.actions {
        let new = action.new.as_ref().map_or_else(String::new, |p| p.display().to_string());
        let mut state_cell = Cell::new(state_label(action));
        if use_color {
            state_cell = if action.conflict || action.conflict_fs {
                state_cell.fg(Color::Red)
            } else if action.two_steps {
                state_cell.fg(Color::Yellow)
            } else if action.to_rename {
                state_cell.fg(Color::Green)
            } else {
                state_cell
            };
        }
        table.add_row(vec![Cell::new(action.seq.to_string()), Cell::new(action.orig.display().to_string()), Cell::new(new), state_cell]);
    }

    table.add_row(vec![
        Cell::new("TOTALS"),
        Cell::new(format!("{} actions", plan.actions.len())),
        Cell::new(format!("{} two-step", plan.nb_two_steps)),
        Cell::new(format!("{} conflicts", plan.nb_conflicts)),
    ]);

    table.to_string()
}
