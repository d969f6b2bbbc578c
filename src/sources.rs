//! C3 — Source Set: an insertion-ordered, deduplicating collection of
//! source file paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Preserves insertion order while rejecting duplicates, mirroring
/// `appbuild`'s `SourceFiles` (an ordered vector backed by a lookup set).
#[derive(Debug, Default, Clone)]
pub struct SourceSet {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` (resolved against `project_dir` when not already
    /// absolute) if it exists on disk and has not already been added.
    /// Returns `false` with a warning, without inserting, if the file is
    /// missing — mirroring `SourceFiles::AddFile`'s existence check.
    pub fn add(&mut self, path: impl Into<PathBuf>, project_dir: &Path) -> bool {
        let path = path.into();
        let resolved = if path.is_absolute() {
            path.clone()
        } else {
            project_dir.join(&path)
        };
        if !resolved.is_file() {
            log::warn!("input filename not found {}", resolved.display());
            return false;
        }
        if self.seen.insert(path.clone()) {
            self.order.push(path);
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_project(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sources-test-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), "").unwrap();
        }
        dir
    }

    #[test]
    fn preserves_insertion_order_and_dedups() {
        let dir = temp_project("order-dedup", &["b.c", "a.c"]);
        let mut set = SourceSet::new();
        assert!(set.add("b.c", &dir));
        assert!(set.add("a.c", &dir));
        assert!(!set.add("b.c", &dir));
        let collected: Vec<_> = set.iter().cloned().collect();
        assert_eq!(collected, vec![PathBuf::from("b.c"), PathBuf::from("a.c")]);
        assert_eq!(set.len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_set_reports_empty() {
        let set = SourceSet::new();
        assert!(set.is_empty());
    }

    #[test]
    fn missing_file_is_dropped_with_warning() {
        let dir = temp_project("missing-file", &[]);
        let mut set = SourceSet::new();
        assert!(!set.add("nope.c", &dir));
        assert!(set.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
