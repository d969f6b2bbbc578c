//! Compiler family detection and the family-specific flag policy that
//! `config.rs` consults when assembling compile/link/archive argument
//! lists.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};

/// Finds a usable compiler on this system, in priority order: `clang`,
/// then a platform default (`clang-cl`/`cl` on Windows, `gcc` elsewhere).
pub fn find_tool() -> Result<(PathBuf, ToolFamily)> {
    macro_rules! exists_command {
        ($command_name:literal) => {
            Command::new($command_name).arg("--version").output().is_ok()
        };
    }

    if exists_command!("clang") {
        return Ok((which::which("clang").unwrap(), ToolFamily::Clang));
    }
    if cfg!(target_os = "windows") {
        if exists_command!("clang-cl") {
            return Ok((
                which::which("clang-cl").unwrap(),
                ToolFamily::Msvc { clang_cl: true },
            ));
        }
        if exists_command!("cl") {
            return Ok((which::which("cl").unwrap(), ToolFamily::Msvc { clang_cl: false }));
        }
    }
    if exists_command!("gcc") {
        return Ok((which::which("gcc").unwrap(), ToolFamily::Gnu));
    }

    Err(Error::NoCompilerFound)
}

/// Resolves a specific named compiler/linker/archiver binary, guessing its
/// family from the name (a real invocation would reveal more, but name
/// heuristics are enough to pick flag spellings).
pub fn resolve_tool(name: &str) -> Result<(PathBuf, ToolFamily)> {
    let path = which::which(name).map_err(|_| Error::NoCompilerFound)?;
    let family = if name.contains("clang-cl") {
        ToolFamily::Msvc { clang_cl: true }
    } else if name.contains("clang") {
        ToolFamily::Clang
    } else if name == "cl" || name.ends_with("cl.exe") {
        ToolFamily::Msvc { clang_cl: false }
    } else {
        ToolFamily::Gnu
    };
    Ok((path, family))
}

/// The family of tools a compiler/linker/archiver binary belongs to.
/// Detection is best-effort and only affects flag spelling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToolFamily {
    /// GNU Compiler Collection-like.
    Gnu,
    /// Clang-like; accepts a superset of GNU flags.
    Clang,
    /// MSVC `cl.exe`, or `clang-cl` masquerading as it.
    Msvc { clang_cl: bool },
}

impl ToolFamily {
    pub fn debug_flag(&self, level: &str) -> String {
        match self {
            ToolFamily::Msvc { .. } => "-Z7".to_string(),
            ToolFamily::Gnu | ToolFamily::Clang => format!("-g{}", level),
        }
    }

    pub fn optimisation_flag(&self, level: &str) -> String {
        match self {
            ToolFamily::Msvc { .. } => format!("/O{}", level),
            ToolFamily::Gnu | ToolFamily::Clang => format!("-o{}", level),
        }
    }

    pub fn include_flag(&self) -> &'static str {
        match self {
            ToolFamily::Msvc { .. } => "/I",
            _ => "-I",
        }
    }

    pub fn compile_only_flag(&self) -> &'static str {
        match self {
            ToolFamily::Msvc { .. } => "/c",
            _ => "-c",
        }
    }

    pub fn object_output_flag(&self) -> &'static str {
        match self {
            ToolFamily::Msvc { .. } => "/Fo:",
            _ => "-o",
        }
    }

    pub fn exe_output_flag(&self) -> &'static str {
        match self {
            ToolFamily::Msvc { .. } => "/Fe:",
            _ => "-o",
        }
    }

    pub fn position_independent_flag(&self) -> Option<&'static str> {
        match self {
            ToolFamily::Msvc { .. } => None,
            ToolFamily::Gnu | ToolFamily::Clang => Some("-fpic"),
        }
    }

    pub fn shared_flag(&self) -> &'static str {
        match self {
            ToolFamily::Msvc { .. } => "/LD",
            ToolFamily::Gnu | ToolFamily::Clang => "-shared",
        }
    }

    pub fn standard_flag(&self, standard: &str) -> String {
        match self {
            ToolFamily::Msvc { .. } => format!("/std:{}", standard),
            ToolFamily::Gnu | ToolFamily::Clang => format!("-std={}", standard),
        }
    }
}
