//! `-P NAME` / `new` project scaffolding: lays out a minimal C project
//! directory with a starter source file and a descriptor carrying a
//! debug and a release configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use console::style;

use crate::descriptor::{ConfigurationDescriptor, ProjectDescriptor, TargetKindDescriptor};
use crate::error::{Error, Result};
use crate::tool;

const MAIN_C: &str = r#"#include <stdio.h>

int main(int argc, char** argv)
{
    printf("hello, world\n");
    return 0;
}
"#;

fn default_compiler() -> String {
    match tool::find_tool() {
        Ok((path, _)) => path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "gcc".to_string()),
        Err(_) => "gcc".to_string(),
    }
}

/// Creates a new project directory at `path` named `project_name`, with a
/// `src/main.c` and a descriptor holding `debug`/`release` configurations.
pub fn create_project(path: &Path, project_name: &str) -> Result<()> {
    if path.exists() {
        return Err(Error::CannotCreate(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path already exists"),
        ));
    }

    fs::create_dir_all(path.join("src")).map_err(|e| Error::CannotCreate(path.to_path_buf(), e))?;
    fs::write(path.join("src").join("main.c"), MAIN_C)
        .map_err(|e| Error::CannotCreate(path.to_path_buf(), e))?;

    let compiler = default_compiler();
    let descriptor = default_descriptor(project_name, &compiler);
    descriptor.write(&path.join("project.json"))?;

    println!("{:>12} binary (application) `{}` package", style("Created").cyan(), project_name);
    Ok(())
}

fn default_descriptor(project_name: &str, compiler: &str) -> ProjectDescriptor {
    let mut configurations = BTreeMap::new();

    configurations.insert(
        "debug".to_string(),
        ConfigurationDescriptor {
            default: true,
            target: Some(TargetKindDescriptor::Executable),
            compiler: Some(compiler.to_string()),
            linker: Some(compiler.to_string()),
            archiver: Some("ar".to_string()),
            output_path: Some("./bin/debug/".to_string()),
            output_name: Some(project_name.to_string()),
            standard: "c11".to_string(),
            optimisation: "0".to_string(),
            debug_level: "2".to_string(),
            gtk_version: None,
            pkg_config_packages: Vec::new(),
            include: Vec::new(),
            libpaths: Vec::new(),
            libs: Vec::new(),
            define: vec!["DEBUG".to_string()],
            dependencies: Vec::new(),
            source_files: Vec::new(),
        },
    );

    configurations.insert(
        "release".to_string(),
        ConfigurationDescriptor {
            default: false,
            target: Some(TargetKindDescriptor::Executable),
            compiler: Some(compiler.to_string()),
            linker: Some(compiler.to_string()),
            archiver: Some("ar".to_string()),
            output_path: Some("./bin/release/".to_string()),
            output_name: Some(project_name.to_string()),
            standard: "c11".to_string(),
            optimisation: "2".to_string(),
            debug_level: "0".to_string(),
            gtk_version: None,
            pkg_config_packages: Vec::new(),
            include: Vec::new(),
            libpaths: Vec::new(),
            libs: Vec::new(),
            define: vec!["NDEBUG".to_string()],
            dependencies: Vec::new(),
            source_files: Vec::new(),
        },
    );

    ProjectDescriptor {
        configurations,
        source_files: vec!["src/main.c".to_string()],
        resource_files: Vec::new(),
        version: "1.0.0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_has_debug_and_release() {
        let descriptor = default_descriptor("myapp", "gcc");
        assert!(descriptor.configurations.contains_key("debug"));
        assert!(descriptor.configurations.contains_key("release"));
        assert!(descriptor.configurations["debug"].default);
        assert!(!descriptor.configurations["release"].default);
    }

    #[test]
    fn create_project_refuses_existing_path() {
        let dir = std::env::temp_dir().join(format!("scaffold-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let result = create_project(&dir, "myapp");
        assert!(result.is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
