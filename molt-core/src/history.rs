//! History / undo: one append-only `.molt/history.jsonl`, a JSON
//! `HistoryEntry` per line. A single JSONL file rather than one file per
//! entry, since a rename-only batch has no content diff to store
//! separately from the plan that produced it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::artifact::RenamePlan;

/// One applied (or reverted) batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Same id as the `RenamePlan` it executed.
    pub id: String,
    pub created_at: String,
    /// The plan this entry executed, kept verbatim so `undo` can replay its
    /// reverse without re-deriving anything from the rule pipeline.
    pub plan: RenamePlan,
    /// Renames actually performed, post-execution, `(orig, new)` pairs —
    /// only the ones that landed, which may be fewer than `plan.actions`
    /// if some failed.
    pub renames: Vec<(PathBuf, PathBuf)>,
    /// Set once `undo` has successfully reverted this entry.
    #[serde(default)]
    pub reverted: bool,
    /// If this entry is itself the result of a `redo`, the id of the
    /// entry it redid.
    #[serde(default)]
    pub redo_of: Option<String>,
}

/// The `.molt/history.jsonl` log: append-only, one `HistoryEntry` per
/// line, newest last.
pub struct History {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn load(molt_dir: &Path) -> Result<Self> {
        Self::load_from_path(&molt_dir.join("history.jsonl"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("failed to open history file: {}", path.display()))?;
            BufReader::new(file)
                .lines()
                .filter(|line| line.as_ref().is_ok_and(|l| !l.trim().is_empty()))
                .map(|line| {
                    let line = line?;
                    serde_json::from_str(&line)
                        .with_context(|| format!("failed to parse history entry: {line}"))
                })
                .collect::<Result<Vec<HistoryEntry>>>()?
        } else {
            Vec::new()
        };

        Ok(Self { path: path.to_path_buf(), entries })
    }

    /// Append one entry to the log, both in memory and on disk.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open history file: {}", self.path.display()))?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)
            .with_context(|| format!("failed to append to history file: {}", self.path.display()))?;

        self.entries.push(entry);
        Ok(())
    }

    /// Rewrite the whole log from the in-memory entries (used after
    /// mutating an existing entry in place, e.g. marking it reverted).
    fn rewrite(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        for entry in &self.entries {
            writeln!(file, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }

    /// Mark an entry reverted, persisting the change.
    pub fn mark_reverted(&mut self, id: &str) -> Result<()> {
        let entry =
            self.entries.iter_mut().find(|e| e.id == id).context(format!("no history entry with id {id}"))?;
        entry.reverted = true;
        self.rewrite()
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Newest-first, optionally capped to `limit` entries.
    pub fn list(&self, limit: Option<usize>) -> Vec<&HistoryEntry> {
        let entries: Vec<_> = self.entries.iter().rev().collect();
        match limit {
            Some(limit) => entries.into_iter().take(limit).collect(),
            None => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RunOptions;
    use tempfile::TempDir;

    fn plan(id: &str) -> RenamePlan {
        RenamePlan {
            id: id.to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            actions: vec![],
            options: RunOptions::default(),
            nb_conflicts: 0,
            nb_two_steps: 0,
        }
    }

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            plan: plan(id),
            renames: vec![(PathBuf::from("/w/a"), PathBuf::from("/w/b"))],
            reverted: false,
            redo_of: None,
        }
    }

    #[test]
    fn append_and_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");

        let mut history = History::load_from_path(&path).unwrap();
        history.append(entry("plan-1")).unwrap();

        let reloaded = History::load_from_path(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.find("plan-1").unwrap().renames.len(), 1);
    }

    #[test]
    fn list_is_newest_first_and_respects_limit() {
        let dir = TempDir::new().unwrap();
        let mut history = History::load_from_path(&dir.path().join("history.jsonl")).unwrap();
        for i in 0..5 {
            history.append(entry(&format!("plan-{i}"))).unwrap();
        }

        let all = history.list(None);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, "plan-4");

        let limited = history.list(Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, "plan-4");
    }

    #[test]
    fn mark_reverted_persists_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut history = History::load_from_path(&path).unwrap();
        history.append(entry("plan-1")).unwrap();

        history.mark_reverted("plan-1").unwrap();

        let reloaded = History::load_from_path(&path).unwrap();
        assert!(reloaded.find("plan-1").unwrap().reverted);
    }

    #[test]
    fn last_is_the_most_recently_appended_entry() {
        let dir = TempDir::new().unwrap();
        let mut history = History::load_from_path(&dir.path().join("history.jsonl")).unwrap();
        history.append(entry("plan-1")).unwrap();
        history.append(entry("plan-2")).unwrap();
        assert_eq!(history.last().unwrap().id, "plan-2");
    }
}
