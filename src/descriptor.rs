//! Serde model of the JSON project descriptor (see `spec.md` §6), plus the
//! schema text printed by `-S` and the defaulted rewrite written by `-u`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dependency entry: either a bare project path (using its default
/// configuration) or an explicit `{ "path": "configuration-name" }` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Default(String),
    Named(BTreeMap<String, String>),
}

impl Dependency {
    pub fn path_and_config(&self) -> (String, Option<String>) {
        match self {
            Dependency::Default(path) => (path.clone(), None),
            Dependency::Named(map) => {
                let (path, config) = map
                    .iter()
                    .next()
                    .expect("dependency object must have exactly one entry");
                (path.clone(), Some(config.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKindDescriptor {
    Executable,
    Library,
    Sharedlibrary,
}

fn default_standard() -> String {
    "c++11".to_string()
}

fn default_optimisation() -> String {
    "0".to_string()
}

fn default_debug_level() -> String {
    "2".to_string()
}

/// One named build configuration as it appears in the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    #[serde(default)]
    pub default: bool,

    pub target: Option<TargetKindDescriptor>,

    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub linker: Option<String>,
    #[serde(default)]
    pub archiver: Option<String>,

    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_name: Option<String>,

    #[serde(default = "default_standard")]
    pub standard: String,

    #[serde(default = "default_optimisation", alias = "optimization")]
    pub optimisation: String,

    #[serde(default = "default_debug_level")]
    pub debug_level: String,

    /// Legacy single-package pkg-config field, folded into
    /// `pkg_config_packages` on load when that field is absent.
    #[serde(default)]
    pub gtk_version: Option<String>,

    #[serde(default)]
    pub pkg_config_packages: Vec<String>,

    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub libpaths: Vec<String>,
    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default)]
    pub define: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub source_files: Vec<String>,
}

/// The full on-disk project descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub configurations: BTreeMap<String, ConfigurationDescriptor>,
    pub source_files: Vec<String>,
    #[serde(default)]
    pub resource_files: Vec<String>,
    pub version: String,
}

impl ProjectDescriptor {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Filesystem(path.to_path_buf(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(path.to_path_buf(), e.to_string()))
    }

    pub fn write(&self, path: &std::path::Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, text).map_err(|e| Error::CannotCreate(path.to_path_buf(), e))
    }
}

/// Parses a `"MAJOR.MINOR.PATCH"` version string. Requires the textual
/// length to be at least 5 characters (`"0.0.0"`) and all three parts to
/// parse as non-negative integers, matching the original's `sscanf`-based
/// validation; the triple as a whole must be non-zero.
pub fn parse_version(text: &str) -> Result<(u16, u16, u16)> {
    if text.len() < 5 {
        return Err(Error::InvalidVersion(text.to_string()));
    }
    let mut parts = text.splitn(3, '.');
    let (major, minor, patch) = match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => return Err(Error::InvalidVersion(text.to_string())),
    };
    let major: u16 = major.parse().map_err(|_| Error::InvalidVersion(text.to_string()))?;
    let minor: u16 = minor.parse().map_err(|_| Error::InvalidVersion(text.to_string()))?;
    let patch: u16 = patch.parse().map_err(|_| Error::InvalidVersion(text.to_string()))?;

    if major == 0 && minor == 0 && patch == 0 {
        return Err(Error::InvalidVersion(text.to_string()));
    }

    Ok((major, minor, patch))
}

/// A short, hand-written description of the descriptor shape, printed by
/// `-S`. Not derived from a JSON-Schema crate — none of the retrieved
/// examples depend on one.
pub fn schema_text() -> &'static str {
    r#"Project descriptor (JSON)

configurations   object, required. Maps configuration name -> configuration.
  default          bool, optional. Marks the configuration used when none is named.
  target           "executable" | "library" | "sharedlibrary", optional (default "executable").
  compiler         string, optional. Compiler binary name (default "gcc").
  linker           string, optional. Linker binary name (defaults to compiler).
  archiver         string, optional. Archiver binary name (default "ar").
  output_path      string, optional. Directory the build output is written to.
  output_name      string, optional. Base name of the build output.
  standard         string, optional (default "c++11").
  optimisation     string, optional (default "0"); "optimization" accepted as an alias.
  debug_level      string, optional (default "2").
  gtk_version      string, optional, legacy. Folded into pkg_config_packages.
  pkg_config_packages  array of string, optional. Packages resolved via pkg-config.
  include          array of string, optional. Include search paths.
  libpaths         array of string, optional. Library search paths.
  libs             array of string, optional. Library names to link.
  define           array of string, optional. Preprocessor defines.
  dependencies     array of (string | { "path": "configuration-name" }), optional.
  source_files     array of string, optional. Extra sources for this configuration only.

source_files     array of string, required. Sources shared by every configuration.
resource_files   array of string, optional. Resources handed to the resource pipeline.
version          string, required. "MAJOR.MINOR.PATCH", must be non-zero.
"#
}
