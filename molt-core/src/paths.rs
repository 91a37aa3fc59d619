//! Lexical path canonicalisation (C1).
//!
//! Deliberately not `realpath`: symlink-following would change reservation
//! semantics (two symlinks to the same file would collide). Two paths are
//! equal, for reservation and conflict purposes, iff their canonical forms
//! are string-equal.

use std::path::{Component, Path, PathBuf};

/// An absolute, lexically-normalized path, with the byte offset of its
/// final segment cached so callers don't re-walk components to find the
/// basename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath {
    full: PathBuf,
}

impl CanonicalPath {
    /// Canonicalise `input` lexically against `cwd`. `input` may be
    /// relative or absolute; no filesystem access is performed.
    pub fn new(input: impl AsRef<Path>, cwd: &Path) -> Self {
        let input = input.as_ref();
        let absolute = if input.is_absolute() {
            input.to_path_buf()
        } else {
            cwd.join(input)
        };

        let mut out: Vec<Component> = Vec::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {},
                Component::ParentDir => {
                    match out.last() {
                        Some(Component::Normal(_)) => {
                            out.pop();
                        },
                        // Clamp: never ascend past the root.
                        _ => {},
                    }
                },
                other => out.push(other),
            }
        }

        let full: PathBuf = out.iter().collect();
        Self { full }
    }

    pub fn as_path(&self) -> &Path {
        &self.full
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.full
    }

    /// The final path segment ("basename").
    pub fn base(&self) -> &str {
        self.full
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// The parent directory of this path, if any (a root has none).
    pub fn parent(&self) -> Option<&Path> {
        self.full.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Build a sibling path in the same directory with the given basename.
    pub fn sibling(&self, basename: &str) -> PathBuf {
        match self.parent() {
            Some(parent) => parent.join(basename),
            None => PathBuf::from(basename),
        }
    }
}

impl std::fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full.display())
    }
}
