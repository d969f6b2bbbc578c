//! Native `pkg-config` resolver used when a configuration names external
//! packages via `pkg_config_packages` (or the legacy `gtk_version` field).

use std::path::PathBuf;

use crate::shell;

/// Runs `pkg-config --cflags <packages>` and returns the include
/// directories it reports, skipping any that don't exist on disk.
pub fn include_paths(packages: &[String]) -> Vec<PathBuf> {
    if packages.is_empty() {
        return Vec::new();
    }
    let mut args = vec!["--cflags".to_string()];
    args.extend(packages.iter().cloned());

    let mut found = Vec::new();
    if let Ok(result) = shell::run_captured("pkg-config", &args, &[]) {
        if result.success {
            for token in result.output.split_whitespace() {
                if let Some(path) = token.strip_prefix("-I") {
                    let path = PathBuf::from(path.trim());
                    if path.is_dir() {
                        found.push(path);
                    } else {
                        log::warn!("pkg-config proposed folder not found: {}", path.display());
                    }
                }
            }
        } else {
            log::warn!("pkg-config --cflags {:?} failed: {}", packages, result.output);
        }
    }
    found
}

/// Runs `pkg-config --libs <packages>` and returns the library names it
/// reports (without the `-l` prefix).
pub fn libraries(packages: &[String]) -> Vec<String> {
    if packages.is_empty() {
        return Vec::new();
    }
    let mut args = vec!["--libs".to_string()];
    args.extend(packages.iter().cloned());

    let mut found = Vec::new();
    if let Ok(result) = shell::run_captured("pkg-config", &args, &[]) {
        if result.success {
            for token in result.output.split_whitespace() {
                if let Some(name) = token.strip_prefix("-l") {
                    found.push(name.trim().to_string());
                }
            }
        } else {
            log::warn!("pkg-config --libs {:?} failed: {}", packages, result.output);
        }
    }
    found
}
