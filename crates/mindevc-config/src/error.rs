use std::path::PathBuf;

use miette::Diagnostic;
use mindevc_utils::error::{FileSystemError, PathError, UtilsError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(mindevc_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(mindevc_config::toml_deserialize),
        help("Check your mindevc.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Failed to read config file `{}`: {source}", .path.display())]
    #[diagnostic(
        code(mindevc_config::read),
        help("Check that the file exists and is readable")
    )]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid hash `{digest}` for tool `{tool}` ({arch})")]
    #[diagnostic(
        code(mindevc_config::invalid_digest),
        help("Hashes must be SHA-256 digests: 64 hexadecimal characters")
    )]
    InvalidDigest {
        tool: String,
        arch: String,
        digest: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Utils(#[from] UtilsError),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
