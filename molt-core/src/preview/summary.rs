use std::fmt::Write;

use crate::artifact::RenamePlan;

/// A terse, script-friendly summary: one header line of counts, then one
/// line per action, in sequence order.
pub fn render_summary(plan: &RenamePlan) -> String {
    let mut out = String::new();

    writeln!(out, "[PLAN SUMMARY]").unwrap();
    writeln!(out, "id: {}", plan.id).unwrap();
    writeln!(out, "actions: {}", plan.actions.len()).unwrap();
    writeln!(out, "two-step: {}", plan.nb_two_steps).unwrap();
    writeln!(out, "conflicts: {}", plan.nb_conflicts).unwrap();
    writeln!(out).unwrap();

    writeln!(out, "[ACTIONS]").unwrap();
    for action in &plan.actions {
        let orig = action.orig.display();
        match (&action.new, action.to_rename, action.conflict, action.conflict_fs) {
            (Some(new), true, _, _) if action.two_steps => {
                writeln!(out, "{orig} -> {} (two-step)", new.display()).unwrap();
            },
            (Some(new), true, _, _) => {
                writeln!(out, "{orig} -> {}", new.display()).unwrap();
            },
            (_, _, true, _) => {
                writeln!(out, "{orig}: conflict").unwrap();
            },
            (_, _, _, true) => {
                writeln!(out, "{orig}: conflict (fs)").unwrap();
            },
            _ => {
                writeln!(out, "{orig}: no-op").unwrap();
            },
        }
    }

    out
}
