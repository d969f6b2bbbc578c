use std::path::PathBuf;

/// Crate-wide error type. Each variant corresponds to one of the error
/// kinds a build can fail with; `main` prints the top-level error's
/// `Display` and exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error in '{0}': {1}")]
    Config(PathBuf, String),

    #[error("configuration '{0}' not found, available: {1}")]
    ConfigNotFound(String, String),

    #[error("no project file given and none found in '{0}'")]
    NoProjectFound(PathBuf),

    #[error("more than one project file found in '{0}': {1}")]
    AmbiguousProject(PathBuf, String),

    #[error("cannot read '{0}': {1}")]
    Filesystem(PathBuf, std::io::Error),

    #[error("cannot create '{0}': {1}")]
    CannotCreate(PathBuf, std::io::Error),

    #[error("error while listing files under '{0}': {1}")]
    FileListing(PathBuf, walkdir::Error),

    #[error("failed to spawn '{0}': {1}")]
    ProcessCreation(PathBuf, std::io::Error),

    #[error("error executing process: {0}")]
    ProcessExec(std::io::Error),

    #[error("task '{0}' failed:\n{1}")]
    TaskFailed(String, String),

    #[error("dependency loop detected while loading project '{0}'")]
    DependencyLoop(String),

    #[error("missing artifact: expected build output at '{0}'")]
    MissingArtifact(PathBuf),

    #[error("no compiler found on this system")]
    NoCompilerFound,

    #[error("invalid version string '{0}', expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("'{0}' is not a recognised project descriptor")]
    NotAProject(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
