//! C8 — Script-Mode Driver: turns a shebang-style single-source C/C++
//! file into a cached, synthesized project that is rebuilt only when the
//! source changes, then hands off to the built executable.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::TargetKind;
use crate::descriptor::{parse_version, ConfigurationDescriptor, ProjectDescriptor, TargetKindDescriptor};
use crate::error::{Error, Result};
use crate::project::{new_loaded_projects, Project};

/// Cache locations derived from the source file's absolute path, mirroring
/// `appbuild`'s `/tmp<abs-path>[.proj|.exe]` scheme.
struct ScriptCache {
    stripped_source: PathBuf,
    descriptor: PathBuf,
    executable: PathBuf,
    temp_dir: PathBuf,
}

impl ScriptCache {
    fn for_source(source: &Path) -> Self {
        let mut key = std::env::temp_dir();
        for component in source.components() {
            key.push(component.as_os_str());
        }
        ScriptCache {
            temp_dir: key.parent().map(Path::to_path_buf).unwrap_or_else(|| key.clone()),
            stripped_source: key.clone(),
            descriptor: with_extra_extension(&key, "proj"),
            executable: with_extra_extension(&key, "exe"),
        }
    }
}

fn with_extra_extension(path: &Path, extra: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extra);
    path.with_file_name(name)
}

/// Runs `source` in script mode: strips its shebang line into a cached
/// copy (only when missing or stale), synthesizes a one-source project
/// descriptor (only when missing), builds it, then execs the result,
/// forwarding `forwarded_args` with leading whitespace trimmed.
pub fn run(source: &Path, forwarded_args: &[String]) -> Result<()> {
    let source = source
        .canonicalize()
        .map_err(|e| Error::Filesystem(source.to_path_buf(), e))?;

    let cache = ScriptCache::for_source(&source);
    std::fs::create_dir_all(&cache.temp_dir)
        .map_err(|e| Error::CannotCreate(cache.temp_dir.clone(), e))?;

    if source_is_newer(&source, &cache.stripped_source) {
        strip_shebang_line(&source, &cache.stripped_source)?;
    }

    if !cache.descriptor.exists() {
        write_synthesized_descriptor(&cache)?;
    }

    let loaded = new_loaded_projects();
    let project = Project::load(&cache.descriptor, 1, false, None, &loaded)?;
    let config_name = project.find_default_configuration_name().unwrap_or_else(|_| "shebang".to_string());
    project.build(&config_name, &loaded)?;

    if !cache.executable.is_file() {
        return Err(Error::MissingArtifact(cache.executable));
    }

    let trimmed: Vec<String> = forwarded_args
        .iter()
        .map(|arg| arg.trim_start().to_string())
        .filter(|arg| !arg.is_empty())
        .collect();

    crate::shell::run_replacing(&cache.executable, &trimmed)
}

fn source_is_newer(source: &Path, cached: &Path) -> bool {
    let cached_time = std::fs::metadata(cached).and_then(|m| m.modified());
    let source_time = match std::fs::metadata(source).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return true,
    };
    match cached_time {
        Ok(cached_time) => source_time > cached_time,
        Err(_) => true,
    }
}

fn strip_shebang_line(source: &Path, dest: &Path) -> Result<()> {
    let contents =
        std::fs::read_to_string(source).map_err(|e| Error::Filesystem(source.to_path_buf(), e))?;
    let mut lines = contents.lines();
    lines.next(); // drop the shebang line itself

    let mut out = std::fs::File::create(dest).map_err(|e| Error::CannotCreate(dest.to_path_buf(), e))?;
    for line in lines {
        writeln!(out, "{}", line).map_err(|e| Error::CannotCreate(dest.to_path_buf(), e))?;
    }
    Ok(())
}

fn write_synthesized_descriptor(cache: &ScriptCache) -> Result<()> {
    let mut configurations = std::collections::BTreeMap::new();
    configurations.insert(
        "shebang".to_string(),
        ConfigurationDescriptor {
            default: true,
            target: Some(TargetKindDescriptor::Executable),
            compiler: None,
            linker: None,
            archiver: None,
            output_path: Some("./".to_string()),
            output_name: Some(
                cache
                    .executable
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string(),
            ),
            standard: "c++11".to_string(),
            optimisation: "2".to_string(),
            debug_level: "0".to_string(),
            gtk_version: None,
            pkg_config_packages: Vec::new(),
            include: Vec::new(),
            libpaths: Vec::new(),
            libs: Vec::new(),
            define: Vec::new(),
            dependencies: Vec::new(),
            source_files: Vec::new(),
        },
    );

    let descriptor = ProjectDescriptor {
        configurations,
        source_files: vec![cache
            .stripped_source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()],
        resource_files: Vec::new(),
        version: "1.0.0".to_string(),
    };

    let _ = parse_version(&descriptor.version)?;
    let _ = TargetKind::from(TargetKindDescriptor::Executable);

    descriptor.write(&cache.descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn cache_paths_are_derived_from_absolute_source_path() {
        let cache = ScriptCache::for_source(Path::new("/home/user/tool.sh"));
        assert!(cache.descriptor.to_string_lossy().ends_with(".proj"));
        assert!(cache.executable.to_string_lossy().ends_with(".exe"));
    }

    #[test]
    fn strips_only_the_first_line() {
        let dir = std::env::temp_dir().join(format!("script-mode-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let source = dir.join("tool.sh");
        fs::write(&source, "#!/usr/bin/buildsmith -#\nint main(){return 0;}\n").unwrap();
        let dest = dir.join("stripped");

        strip_shebang_line(&source, &dest).unwrap();
        let stripped = fs::read_to_string(&dest).unwrap();
        assert_eq!(stripped.trim(), "int main(){return 0;}");

        fs::remove_dir_all(&dir).ok();
    }
}
