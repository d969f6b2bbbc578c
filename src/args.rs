//! C4 — Arg Builder: an ordered accumulator for compiler/linker arguments,
//! with typed adders for the handful of argument shapes the build needs.

use std::path::{Path, PathBuf};

/// Translates a library name into its linker reference form. Names that
/// look like a bare filename (`lib<name>.a` / `lib<name>.so`) are passed
/// through with a colon prefix so the linker takes them verbatim; anything
/// else gets the ordinary `-l<name>` treatment.
pub fn library_link_arg(name: &str) -> String {
    let is_filename = name.starts_with("lib")
        && (name.ends_with(".a") || name.ends_with(".so"));
    if is_filename {
        format!("-l:{}", name)
    } else {
        format!("-l{}", name)
    }
}

/// Ordered argument list, mirroring `appbuild`'s `ArgList`. Include search
/// paths are tracked separately so the dependency engine can reuse them
/// when resolving `#include` directives.
#[derive(Debug, Default, Clone)]
pub struct ArgList {
    arguments: Vec<String>,
    include_paths: Vec<PathBuf>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_arg(&mut self, arg: impl Into<String>) {
        self.arguments.push(arg.into());
    }

    pub fn add_args(&mut self, args: impl IntoIterator<Item = String>) {
        self.arguments.extend(args);
    }

    /// Resolves `path` relative to `project_dir` when it is not already
    /// absolute, then emits `<flag><resolved>` (`flag` is `-I` for
    /// GNU/Clang, `/I` for MSVC). A path that does not resolve to an
    /// existing directory is warned about and dropped rather than passed
    /// to the compiler.
    pub fn add_include_search_path(&mut self, path: &str, project_dir: &Path, flag: &str) {
        let resolved = resolve_path(path, project_dir);
        if !resolved.is_dir() {
            log::warn!("include search path not found, dropping: {}", resolved.display());
            return;
        }
        self.arguments.push(format!("{}{}", flag, resolved.display()));
        self.include_paths.push(resolved);
    }

    /// Resolves `path` relative to `project_dir` when it is not already
    /// absolute, then emits `-L<resolved>`. Dropped with a warning if the
    /// directory does not exist.
    pub fn add_library_search_path(&mut self, path: &str, project_dir: &Path) {
        let resolved = resolve_path(path, project_dir);
        if !resolved.is_dir() {
            log::warn!("library search path not found, dropping: {}", resolved.display());
            return;
        }
        self.arguments.push(format!("-L{}", resolved.display()));
    }

    pub fn add_library(&mut self, name: &str) {
        self.arguments.push(library_link_arg(name));
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn as_slice(&self) -> &[String] {
        &self.arguments
    }

    pub fn into_vec(self) -> Vec<String> {
        self.arguments
    }
}

fn resolve_path(path: &str, project_dir: &Path) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        project_dir.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_library_gets_dash_l() {
        assert_eq!(library_link_arg("pthread"), "-lpthread");
    }

    #[test]
    fn filename_style_library_gets_colon_prefix() {
        assert_eq!(library_link_arg("libfoo.a"), "-l:libfoo.a");
        assert_eq!(library_link_arg("libfoo.so"), "-l:libfoo.so");
    }

    fn temp_dir_with(name: &str, subdir: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("args-test-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(dir.join(subdir)).unwrap();
        dir
    }

    #[test]
    fn include_path_resolves_relative_to_project_dir() {
        let project_dir = temp_dir_with("include-relative", "include");
        let mut args = ArgList::new();
        args.add_include_search_path("include", &project_dir, "-I");
        let expected = project_dir.join("include");
        assert_eq!(args.as_slice(), &[format!("-I{}", expected.display())]);
        assert_eq!(args.include_paths(), &[expected]);
        std::fs::remove_dir_all(&project_dir).ok();
    }

    #[test]
    fn absolute_include_path_is_kept_as_is() {
        let dir = temp_dir_with("include-absolute", "");
        let mut args = ArgList::new();
        args.add_include_search_path(&dir.to_string_lossy(), Path::new("/proj"), "-I");
        assert_eq!(args.as_slice(), &[format!("-I{}", dir.display())]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn msvc_flag_prefix_is_used_when_given() {
        let project_dir = temp_dir_with("include-msvc", "include");
        let mut args = ArgList::new();
        args.add_include_search_path("include", &project_dir, "/I");
        let expected = project_dir.join("include");
        assert_eq!(args.as_slice(), &[format!("/I{}", expected.display())]);
        std::fs::remove_dir_all(&project_dir).ok();
    }

    #[test]
    fn nonexistent_include_path_is_dropped() {
        let mut args = ArgList::new();
        args.add_include_search_path("does/not/exist", Path::new("/proj"), "-I");
        assert!(args.as_slice().is_empty());
        assert!(args.include_paths().is_empty());
    }

    #[test]
    fn nonexistent_library_search_path_is_dropped() {
        let mut args = ArgList::new();
        args.add_library_search_path("does/not/exist", Path::new("/proj"));
        assert!(args.as_slice().is_empty());
    }
}
