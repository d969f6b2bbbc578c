//! C5 — Configuration: a named build profile. Owns its target kind,
//! toolchain, search paths, defines, dependency list and per-configuration
//! source set, and knows how to turn a project's sources into a plan of
//! compile tasks plus the final link/archive command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use educe::Educe;

use crate::args::ArgList;
use crate::descriptor::{ConfigurationDescriptor, Dependency, TargetKindDescriptor};
use crate::error::{Error, Result};
use crate::pkgconfig;
use crate::sources::SourceSet;
use crate::tool::{self, ToolFamily};

#[derive(Educe, parse_display::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[educe(Default)]
pub enum TargetKind {
    #[educe(Default)]
    #[display("executable")]
    Executable,
    #[display("static archive")]
    StaticArchive,
    #[display("shared object")]
    SharedObject,
}

impl From<TargetKindDescriptor> for TargetKind {
    fn from(value: TargetKindDescriptor) -> Self {
        match value {
            TargetKindDescriptor::Executable => TargetKind::Executable,
            TargetKindDescriptor::Library => TargetKind::StaticArchive,
            TargetKindDescriptor::Sharedlibrary => TargetKind::SharedObject,
        }
    }
}

/// A single compile unit planned from a configuration's sources.
#[derive(Debug, Clone)]
pub struct CompileTask {
    pub label: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub compiler: String,
    pub args: Vec<String>,
}

pub struct Configuration {
    pub name: String,
    pub is_default: bool,
    pub target: TargetKind,

    pub compiler: String,
    pub linker: String,
    pub archiver: String,

    pub output_path: PathBuf,
    pub output_name: String,

    pub standard: String,
    pub optimisation: String,
    pub debug_level: String,

    pub pkg_config_packages: Vec<String>,

    pub include_search_paths: Vec<String>,
    pub library_search_paths: Vec<String>,
    pub library_files: Vec<String>,
    pub defines: Vec<String>,

    pub dependencies: Vec<(String, Option<String>)>,
    pub source_files: SourceSet,

    project_dir: PathBuf,
}

impl Configuration {
    /// Builds a `Configuration` from its descriptor form, applying every
    /// default the original tool applies when a key is absent.
    pub fn from_descriptor(
        name: &str,
        descriptor: &ConfigurationDescriptor,
        project_dir: &Path,
        project_name: &str,
    ) -> Result<Self> {
        let target = descriptor.target.map(TargetKind::from).unwrap_or_default();

        let output_path = descriptor
            .output_path
            .clone()
            .unwrap_or_else(|| "./bin/".to_string());
        let output_path = ensure_trailing_slash(&output_path);

        let output_name = match &descriptor.output_name {
            Some(name) => normalize_target_filename(name, target),
            None => normalize_target_filename(project_name, target),
        };

        let mut pkg_config_packages = descriptor.pkg_config_packages.clone();
        if pkg_config_packages.is_empty() {
            if let Some(legacy) = &descriptor.gtk_version {
                pkg_config_packages.push(legacy.clone());
            }
        }

        let include_search_paths = if descriptor.include.is_empty() {
            vec!["/usr/include".to_string()]
        } else {
            descriptor.include.clone()
        };

        let (library_search_paths, library_files) = if descriptor.libpaths.is_empty() {
            (Vec::new(), default_libraries_if_absent(&descriptor.libs))
        } else {
            (descriptor.libpaths.clone(), descriptor.libs.clone())
        };

        let defines = if descriptor.define.is_empty() {
            vec!["NDEBUG".to_string()]
        } else {
            descriptor.define.clone()
        };

        let dependencies = descriptor
            .dependencies
            .iter()
            .map(Dependency::path_and_config)
            .collect();

        let mut source_files = SourceSet::new();
        for file in &descriptor.source_files {
            source_files.add(PathBuf::from(file), project_dir);
        }

        let compiler = descriptor.compiler.clone().unwrap_or_else(|| "gcc".to_string());
        let linker = descriptor.linker.clone().unwrap_or_else(|| compiler.clone());
        let archiver = descriptor.archiver.clone().unwrap_or_else(|| "ar".to_string());

        Ok(Configuration {
            name: name.to_string(),
            is_default: descriptor.default,
            target,
            compiler,
            linker,
            archiver,
            output_path: PathBuf::from(output_path),
            output_name,
            standard: descriptor.standard.clone(),
            optimisation: descriptor.optimisation.clone(),
            debug_level: descriptor.debug_level.clone(),
            pkg_config_packages,
            include_search_paths,
            library_search_paths,
            library_files,
            defines,
            dependencies,
            source_files,
            project_dir: project_dir.to_path_buf(),
        })
    }

    pub fn pathed_target_name(&self) -> PathBuf {
        self.project_dir.join(&self.output_path).join(&self.output_name)
    }

    fn resolved_include_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .include_search_paths
            .iter()
            .map(|p| {
                let candidate = PathBuf::from(p);
                if candidate.is_absolute() {
                    candidate
                } else {
                    self.project_dir.join(candidate)
                }
            })
            .collect();
        paths.extend(pkgconfig::include_paths(&self.pkg_config_packages));
        paths
    }

    pub fn resolved_library_files(&self) -> Vec<String> {
        let mut libs = self.library_files.clone();
        libs.extend(pkgconfig::libraries(&self.pkg_config_packages));
        libs
    }

    /// Plans the compile tasks needed for this configuration's sources,
    /// iterating `[generated_resources, project_sources, own sources]` in
    /// that fixed order so basename disambiguation is deterministic
    /// regardless of scheduling order. Returns the full set of expected
    /// object files (including ones that did not need rebuilding) for the
    /// linker, plus the tasks that actually need to run.
    pub fn build_tasks(
        &self,
        generated_resources: &SourceSet,
        project_sources: &SourceSet,
        rebuild_all: bool,
        deps: &mut crate::deps::DependencyEngine,
    ) -> Result<(Vec<PathBuf>, Vec<CompileTask>)> {
        let mut seen = std::collections::HashSet::new();
        let mut use_count: HashMap<String, usize> = HashMap::new();
        let mut outputs = Vec::new();
        let mut tasks = Vec::new();

        let include_paths = self.resolved_include_paths();

        for set in [generated_resources, project_sources, &self.source_files] {
            for source in set.iter() {
                let input = if source.is_absolute() {
                    source.clone()
                } else {
                    self.project_dir.join(source)
                };

                if !seen.insert(input.clone()) {
                    return Err(Error::Config(
                        input.clone(),
                        "source file is in the project twice".to_string(),
                    ));
                }
                if !input.is_file() {
                    log::warn!("input filename not found {}", input.display());
                    continue;
                }

                let label = source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unnamed")
                    .to_string();
                let stem = source
                    .file_stem()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unnamed")
                    .to_string();
                let use_index = *use_count.entry(stem.clone()).or_insert(0);
                use_count.insert(stem.clone(), use_index + 1);

                let mut object_name = stem.clone();
                if use_index > 0 {
                    object_name.push('.');
                    object_name.push_str(&use_index.to_string());
                    object_name.push('.');
                }
                object_name.push_str(".obj");

                // Mirrors the source's own relative subdirectory under the
                // output directory, so same-basename sources from different
                // folders (e.g. src/a/util.cpp, src/b/util.cpp) land beside
                // each other's disambiguated siblings instead of flattening
                // into one directory.
                let group_dir = if source.is_absolute() {
                    None
                } else {
                    source.parent().filter(|p| !p.as_os_str().is_empty())
                };
                let output_dir = match group_dir {
                    Some(group_dir) => self.project_dir.join(&self.output_path).join(group_dir),
                    None => self.project_dir.join(&self.output_path),
                };
                let output = output_dir.join(object_name);
                outputs.push(output.clone());

                if rebuild_all || deps.requires_rebuild(&input, &output, &include_paths) {
                    std::fs::create_dir_all(&output_dir)
                        .map_err(|e| Error::CannotCreate(output_dir.clone(), e))?;
                    std::fs::remove_file(&output).ok();
                    tasks.push(self.plan_compile_task(&label, &input, &output, &include_paths)?);
                }
            }
        }

        Ok((outputs, tasks))
    }

    fn plan_compile_task(
        &self,
        label: &str,
        input: &Path,
        output: &Path,
        include_paths: &[PathBuf],
    ) -> Result<CompileTask> {
        let (_, family) = tool::resolve_tool(&self.compiler).unwrap_or((PathBuf::new(), ToolFamily::Gnu));

        let mut args = ArgList::new();
        args.add_arg(family.optimisation_flag(&self.optimisation));
        args.add_arg(family.debug_flag(&self.debug_level));

        for define in &self.defines {
            args.add_arg(format!("-D{}", define));
        }
        for path in include_paths {
            args.add_include_search_path(&path.to_string_lossy(), &self.project_dir, family.include_flag());
        }

        let is_c_file = input.extension().and_then(|e| e.to_str()) == Some("c");
        if !is_c_file {
            args.add_arg(family.standard_flag(&self.standard));
        }
        if matches!(self.target, TargetKind::SharedObject) {
            if let Some(flag) = family.position_independent_flag() {
                args.add_arg(flag);
            }
        }

        args.add_arg(family.object_output_flag());
        args.add_arg(output.to_string_lossy().to_string());
        args.add_arg(family.compile_only_flag());
        args.add_arg(input.to_string_lossy().to_string());

        Ok(CompileTask {
            label: label.to_string(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            compiler: self.compiler.clone(),
            args: args.into_vec(),
        })
    }

    /// Assembles the final link (executable / shared object) command's
    /// arguments, in the exact order the original linker invocation uses:
    /// library search paths, object files, library files, then `-o` output.
    pub fn link_args(
        &self,
        objects: &[PathBuf],
        dependency_library_paths: &[String],
        dependency_libraries: &[String],
    ) -> Vec<String> {
        let (_, family) = tool::resolve_tool(&self.linker).unwrap_or((PathBuf::new(), ToolFamily::Gnu));

        let mut args = ArgList::new();
        if matches!(self.target, TargetKind::SharedObject) {
            args.add_arg(family.shared_flag());
        }
        for path in &self.library_search_paths {
            args.add_library_search_path(path, &self.project_dir);
        }
        for path in dependency_library_paths {
            args.add_library_search_path(path, &self.project_dir);
        }
        for object in objects {
            args.add_arg(object.to_string_lossy().to_string());
        }
        for lib in dependency_libraries {
            args.add_library(lib);
        }
        for lib in self.resolved_library_files() {
            args.add_library(&lib);
        }
        args.add_arg(family.exe_output_flag());
        args.add_arg(self.pathed_target_name().to_string_lossy().to_string());
        args.into_vec()
    }

    /// Assembles the archiver command's arguments for a static archive:
    /// `rcs <target> <objects...>`.
    pub fn archive_args(&self, objects: &[PathBuf]) -> Vec<String> {
        let mut args = vec!["rcs".to_string(), self.pathed_target_name().to_string_lossy().to_string()];
        args.extend(objects.iter().map(|o| o.to_string_lossy().to_string()));
        args
    }
}

fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Applies the original's static-archive naming convention: the output
/// name must start with `lib` and end in `.a`.
fn normalize_target_filename(base: &str, target: TargetKind) -> String {
    if target != TargetKind::StaticArchive {
        return base.to_string();
    }
    let mut name = base.to_string();
    if !name.starts_with("lib") {
        name = format!("lib{}", name);
    }
    if !name.ends_with(".a") {
        name.push_str(".a");
    }
    name
}

/// When `libpaths` is absent from the descriptor, the original falls back
/// to adding `stdc++`/`pthread` as default libraries if no explicit libs
/// were given either — an original quirk this crate preserves rather than
/// silently "fixing", since changing link defaults would be a behavior
/// change beyond this crate's scope.
fn default_libraries_if_absent(explicit_libs: &[String]) -> Vec<String> {
    if explicit_libs.is_empty() {
        vec!["stdc++".to_string(), "pthread".to_string()]
    } else {
        explicit_libs.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ConfigurationDescriptor {
        ConfigurationDescriptor {
            default: true,
            target: Some(TargetKindDescriptor::Executable),
            compiler: None,
            linker: None,
            archiver: None,
            output_path: None,
            output_name: None,
            standard: "c++11".to_string(),
            optimisation: "0".to_string(),
            debug_level: "2".to_string(),
            gtk_version: None,
            pkg_config_packages: Vec::new(),
            include: Vec::new(),
            libpaths: Vec::new(),
            libs: Vec::new(),
            define: Vec::new(),
            dependencies: Vec::new(),
            source_files: Vec::new(),
        }
    }

    #[test]
    fn static_archive_output_name_is_normalized() {
        assert_eq!(normalize_target_filename("foo", TargetKind::StaticArchive), "libfoo.a");
        assert_eq!(normalize_target_filename("libfoo", TargetKind::StaticArchive), "libfoo.a");
        assert_eq!(normalize_target_filename("libfoo.a", TargetKind::StaticArchive), "libfoo.a");
    }

    #[test]
    fn executable_output_name_is_untouched() {
        assert_eq!(normalize_target_filename("foo", TargetKind::Executable), "foo");
    }

    #[test]
    fn defaults_fill_in_compiler_and_output() {
        let desc = descriptor();
        let config = Configuration::from_descriptor("debug", &desc, Path::new("/proj"), "myapp").unwrap();
        assert_eq!(config.compiler, "gcc");
        assert_eq!(config.linker, "gcc");
        assert_eq!(config.archiver, "ar");
        assert_eq!(config.output_name, "myapp");
        assert_eq!(config.include_search_paths, vec!["/usr/include".to_string()]);
    }

    #[test]
    fn missing_libpaths_falls_back_to_default_libs() {
        let desc = descriptor();
        let config = Configuration::from_descriptor("debug", &desc, Path::new("/proj"), "myapp").unwrap();
        assert_eq!(config.library_files, vec!["stdc++".to_string(), "pthread".to_string()]);
    }

    #[test]
    fn gtk_version_folds_into_pkg_config_packages() {
        let mut desc = descriptor();
        desc.gtk_version = Some("gtk+-3.0".to_string());
        let config = Configuration::from_descriptor("debug", &desc, Path::new("/proj"), "myapp").unwrap();
        assert_eq!(config.pkg_config_packages, vec!["gtk+-3.0".to_string()]);
    }

    #[test]
    fn same_basename_sources_from_different_dirs_keep_separate_object_dirs() {
        let dir = std::env::temp_dir().join(format!("config-test-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("a")).unwrap();
        std::fs::create_dir_all(dir.join("b")).unwrap();
        std::fs::write(dir.join("a").join("util.cpp"), "int a(){return 0;}").unwrap();
        std::fs::write(dir.join("b").join("util.cpp"), "int b(){return 0;}").unwrap();

        let mut desc = descriptor();
        desc.source_files = vec!["a/util.cpp".to_string(), "b/util.cpp".to_string()];
        let config = Configuration::from_descriptor("debug", &desc, &dir, "myapp").unwrap();

        let project_file = dir.join("project.json");
        std::fs::write(&project_file, "{}").unwrap();
        let mut deps = crate::deps::DependencyEngine::new(&project_file);

        let (outputs, tasks) = config
            .build_tasks(&SourceSet::new(), &SourceSet::new(), false, &mut deps)
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(outputs.contains(&dir.join("bin").join("a").join("util.obj")));
        assert!(outputs.contains(&dir.join("bin").join("b").join("util.1.obj")));
        assert!(dir.join("bin").join("a").is_dir());
        assert!(dir.join("bin").join("b").is_dir());

        std::fs::remove_dir_all(&dir).ok();
    }
}
