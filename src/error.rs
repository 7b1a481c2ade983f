use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by graph loading, resolution, and notice indexing.
///
/// Every variant carries the offending path or name so drivers can print a
/// single actionable line and exit non-zero.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no license metadata to analyze")]
    EmptyInput,

    #[error("error opening {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error reading {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing license metadata {}:{line}: {message}", path.display())]
    ParseFailed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("unknown dependency {dependency:?} referenced from {}", path.display())]
    UnknownDependency { path: PathBuf, dependency: String },

    #[error("unknown license condition {name:?} in {}", path.display())]
    UnknownCondition { path: PathBuf, name: String },

    #[error("dependency without a file name in {}", path.display())]
    MissingDependencyName { path: PathBuf },

    #[error("graph already has {limit} resolution slots in use")]
    TooManyResolutionSlots { limit: usize },
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    pub fn open_failed<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::OpenFailed { path: path.into(), source }
    }

    pub fn read_failed<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::ReadFailed { path: path.into(), source }
    }

    pub fn parse_failed<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, message: S) -> Self {
        Self::ParseFailed { path: path.into(), line, message: message.into() }
    }

    pub fn unknown_dependency<P: Into<PathBuf>, S: Into<String>>(path: P, dependency: S) -> Self {
        Self::UnknownDependency { path: path.into(), dependency: dependency.into() }
    }

    pub fn unknown_condition<P: Into<PathBuf>, S: Into<String>>(path: P, name: S) -> Self {
        Self::UnknownCondition { path: path.into(), name: name.into() }
    }

    pub fn missing_dependency_name<P: Into<PathBuf>>(path: P) -> Self {
        Self::MissingDependencyName { path: path.into() }
    }

    /// Returns true when the error came from the filesystem rather than the
    /// content of a metadata file.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::OpenFailed { .. } | Self::ReadFailed { .. })
    }
}
