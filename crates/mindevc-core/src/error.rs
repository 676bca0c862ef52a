//! Error types for mindevc-core.

use std::fmt;

use miette::Diagnostic;
use mindevc_config::error::ConfigError;
use mindevc_dl::error::DownloadError;
use mindevc_package::PackageError;
use mindevc_utils::error::{FileSystemError, HashError, PathError, UtilsError};
use thiserror::Error;

/// Pipeline stage a tool failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Extract,
    Link,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Extract => write!(f, "extract"),
            Self::Link => write!(f, "link"),
        }
    }
}

/// Core error type for mindevc operations.
#[derive(Error, Diagnostic, Debug)]
pub enum MindevcError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Utils(#[from] UtilsError),

    #[error("Failed to {stage} tool `{tool}`")]
    #[diagnostic(
        code(mindevc::tool_failed),
        help("Fix the cause below and run the pipeline again; nothing was retried")
    )]
    ToolFailed {
        tool: String,
        stage: Stage,
        #[source]
        source: Box<MindevcError>,
    },

    #[error("Invalid architecture `{arch}`")]
    #[diagnostic(
        code(mindevc::invalid_arch),
        help("Architectures are plain names such as x86_64 or aarch64")
    )]
    InvalidArchitecture { arch: String },

    #[error("Error while {action}")]
    #[diagnostic(code(mindevc::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(mindevc::custom))]
    Custom(String),
}

impl MindevcError {
    pub(crate) fn tool_failed(tool: &str, stage: Stage, source: impl Into<MindevcError>) -> Self {
        Self::ToolFailed {
            tool: tool.to_string(),
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Stage of the failing tool, if this error came out of the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::ToolFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<FileSystemError> for MindevcError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

impl From<HashError> for MindevcError {
    fn from(err: HashError) -> Self {
        Self::Utils(UtilsError::Hash(err))
    }
}

impl From<PathError> for MindevcError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, MindevcError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, MindevcError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            MindevcError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Download.to_string(), "download");
        assert_eq!(Stage::Extract.to_string(), "extract");
        assert_eq!(Stage::Link.to_string(), "link");
    }

    #[test]
    fn test_tool_failed_message() {
        let err = MindevcError::tool_failed(
            "fd",
            Stage::Download,
            DownloadError::EmptyBody {
                url: "https://example.com/fd.tar.gz".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Failed to download tool `fd`");
        assert_eq!(err.stage(), Some(Stage::Download));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("empty body"));
    }

    #[test]
    fn test_with_context() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result
            .with_context(|| "reading /cache/tools".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "Error while reading /cache/tools");
        assert_eq!(err.stage(), None);
    }
}
