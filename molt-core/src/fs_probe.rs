//! Filesystem probe (C8): the planner and executor only ever touch the
//! real filesystem through this trait, so the planner's cascading-conflict
//! tests (spec §8) can run against an in-memory fake instead of real disk.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

pub trait FsProbe {
    /// Does this path resolve to any filesystem object (file, directory,
    /// or symlink)? No type discrimination at classification time.
    fn exists(&self, path: &Path) -> bool;

    /// Perform the rename syscall. Expected to be atomic within a
    /// filesystem; errno is surfaced verbatim by the caller.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The real filesystem, via `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl FsProbe for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

/// An in-memory filesystem used exclusively by tests: a set of paths that
/// "exist", mutated by `rename`.
#[derive(Debug, Default, Clone)]
pub struct FakeFs {
    entries: std::cell::RefCell<HashSet<PathBuf>>,
}

impl FakeFs {
    pub fn new(initial: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            entries: std::cell::RefCell::new(initial.into_iter().collect()),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.borrow().contains(path)
    }

    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.entries.borrow().clone()
    }
}

impl FsProbe for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.entries.borrow().contains(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut entries = self.entries.borrow_mut();
        if !entries.contains(from) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", from.display()),
            ));
        }
        if entries.contains(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        entries.remove(from);
        entries.insert(to.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_fs_renames_existing_entry() {
        let fs = FakeFs::new([PathBuf::from("/a")]);
        fs.rename(Path::new("/a"), Path::new("/b")).unwrap();
        assert!(!fs.contains(Path::new("/a")));
        assert!(fs.contains(Path::new("/b")));
    }

    #[test]
    fn fake_fs_rename_fails_if_source_missing() {
        let fs = FakeFs::new([]);
        assert!(fs.rename(Path::new("/a"), Path::new("/b")).is_err());
    }

    #[test]
    fn fake_fs_rename_fails_if_dest_exists() {
        let fs = FakeFs::new([PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(fs.rename(Path::new("/a"), Path::new("/b")).is_err());
    }
}
