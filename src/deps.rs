//! C2 — Dependency Engine: decides whether a source file needs
//! recompiling by walking its `#include` graph and comparing modification
//! times, with per-build memoization and a recursion guard for cycles.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Caches include lists and file times across a whole run of the engine;
/// per-build memoization (`mFileDependencyState`/`mFileCheckedState` in the
/// original) is reset at the start of every `requires_rebuild` call.
pub struct DependencyEngine {
    includes_cache: HashMap<PathBuf, HashSet<PathBuf>>,
    file_times: HashMap<PathBuf, SystemTime>,
    dependency_state: HashMap<PathBuf, bool>,
    checked: HashSet<PathBuf>,
    project_file_time: Option<SystemTime>,
}

impl DependencyEngine {
    /// `project_file` is the descriptor whose own mtime forces a rebuild of
    /// everything when touched.
    pub fn new(project_file: &Path) -> Self {
        let mut engine = DependencyEngine {
            includes_cache: HashMap::new(),
            file_times: HashMap::new(),
            dependency_state: HashMap::new(),
            checked: HashSet::new(),
            project_file_time: None,
        };
        engine.project_file_time = engine.file_time(project_file);
        engine
    }

    /// Returns `true` if `source` (producing `object`) is stale: the
    /// object is missing, the project descriptor was touched after it, or
    /// the source / any transitively included header is younger than it.
    pub fn requires_rebuild(
        &mut self,
        source: &Path,
        object: &Path,
        include_paths: &[PathBuf],
    ) -> bool {
        let mut paths = include_paths.to_vec();
        if let Some(parent) = source.parent() {
            paths.push(parent.to_path_buf());
        }

        self.dependency_state.clear();
        self.checked.clear();

        let object_time = match self.file_time(object) {
            Some(t) => t,
            None => return true,
        };

        if let Some(project_time) = self.project_file_time {
            if project_time > object_time {
                return true;
            }
        }

        self.check_dependencies(source, object_time, &paths)
    }

    fn check_dependencies(
        &mut self,
        file: &Path,
        object_time: SystemTime,
        include_paths: &[PathBuf],
    ) -> bool {
        if let Some(&result) = self.dependency_state.get(file) {
            return result;
        }

        if self.younger_than(file, object_time) {
            return true;
        }

        let includes = self.includes_of(file, include_paths);
        for include in includes {
            if !self.checked.contains(&include) {
                self.checked.insert(include.clone());
                let result = self.check_dependencies(&include, object_time, include_paths);
                self.dependency_state.insert(include, result);
                if result {
                    return true;
                }
            }
        }

        false
    }

    fn younger_than(&mut self, file: &Path, object_time: SystemTime) -> bool {
        match self.file_time(file) {
            // Missing dependency means something the build relies on
            // vanished; force a rebuild rather than silently trusting the
            // cached object.
            None => true,
            Some(t) => t > object_time,
        }
    }

    fn file_time(&mut self, file: &Path) -> Option<SystemTime> {
        if let Some(time) = self.file_times.get(file) {
            return Some(*time);
        }
        let metadata = std::fs::metadata(file).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok()?;
        self.file_times.insert(file.to_path_buf(), modified);
        Some(modified)
    }

    /// Extracts the `#include` targets of `file` by manual character
    /// scanning (never regex): this intentionally does not special-case
    /// comments or string literals, matching the original scanner's
    /// tolerant-but-imprecise behavior.
    fn includes_of(&mut self, file: &Path, include_paths: &[PathBuf]) -> HashSet<PathBuf> {
        if let Some(cached) = self.includes_cache.get(file) {
            return cached.clone();
        }

        let mut includes = HashSet::new();
        if let Ok(contents) = std::fs::read_to_string(file) {
            for line in contents.lines() {
                if let Some(spelled) = extract_include(line) {
                    for dir in include_paths {
                        let candidate = dir.join(&spelled);
                        if candidate.is_file() {
                            includes.insert(candidate);
                            break;
                        }
                    }
                }
            }
        }

        self.includes_cache.insert(file.to_path_buf(), includes.clone());
        includes
    }
}

/// Scans one line for a `#include` token and returns the literal text
/// between the following `"..."` or `<...>` delimiters, unresolved.
fn extract_include(line: &str) -> Option<String> {
    if line.len() < 12 {
        return None;
    }
    let bytes = line.as_bytes();
    let start = line.find("#include")? + 8;

    let mut idx = start;
    while idx < bytes.len() {
        let (terminator, content_start) = match bytes[idx] {
            b'"' => (b'"', idx + 1),
            b'<' => (b'>', idx + 1),
            _ => {
                idx += 1;
                continue;
            }
        };
        let mut end = content_start;
        while end < bytes.len() && bytes[end] != terminator {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == terminator {
            return Some(line[content_start..end].to_string());
        }
        return None;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn extracts_quoted_include() {
        assert_eq!(extract_include("#include \"foo.h\""), Some("foo.h".to_string()));
    }

    #[test]
    fn extracts_angle_bracket_include() {
        assert_eq!(extract_include("#include <stdio.h>"), Some("stdio.h".to_string()));
    }

    #[test]
    fn ignores_short_lines() {
        assert_eq!(extract_include("#include"), None);
    }

    #[test]
    fn tolerates_trailing_comment_text_after_include() {
        // Matches the original's documented looseness: it does not treat
        // // or /* specially, so this still extracts "foo.h".
        assert_eq!(
            extract_include("#include \"foo.h\" // some comment"),
            Some("foo.h".to_string())
        );
    }

    #[test]
    fn missing_object_forces_rebuild() {
        let dir = std::env::temp_dir().join(format!("deps-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let project = dir.join("proj.json");
        fs::write(&project, "{}").unwrap();
        let source = dir.join("main.c");
        fs::write(&source, "int main(){}").unwrap();

        let mut engine = DependencyEngine::new(&project);
        let object = dir.join("main.o");
        assert!(engine.requires_rebuild(&source, &object, &[]));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn up_to_date_object_does_not_rebuild() {
        let dir = std::env::temp_dir().join(format!("deps-test2-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let project = dir.join("proj.json");
        fs::write(&project, "{}").unwrap();
        let source = dir.join("main.c");
        fs::write(&source, "int main(){}").unwrap();
        sleep(Duration::from_millis(10));
        let object = dir.join("main.o");
        fs::write(&object, "obj").unwrap();

        let mut engine = DependencyEngine::new(&project);
        assert!(!engine.requires_rebuild(&source, &object, &[]));

        fs::remove_dir_all(&dir).ok();
    }
}
