//! Error types for the package crate.

use std::path::PathBuf;

use miette::Diagnostic;
use mindevc_utils::error::FileSystemError;
use thiserror::Error;

/// Errors that can occur while extracting archives or publishing links.
#[derive(Error, Diagnostic, Debug)]
pub enum PackageError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(mindevc_package::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("Unsupported archive encoding `{encoding}`")]
    #[diagnostic(
        code(mindevc_package::unsupported_encoding),
        help("Use one of: tar.gz, tar.bz2, tar.xz, zip, bin, bin.gz, bin.bz2, bin.xz")
    )]
    UnsupportedEncoding { encoding: String },

    #[error("Failed to read archive `{}`: {source}", .path.display())]
    #[diagnostic(
        code(mindevc_package::archive),
        help("The archive may be truncated or not match its declared type")
    )]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read zip archive `{}`: {source}", .path.display())]
    #[diagnostic(code(mindevc_package::zip))]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("Failed to decompress `{}`: {source}", .path.display())]
    #[diagnostic(code(mindevc_package::decompress))]
    Decompress {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive `{}` contains unsafe entry `{entry}`", .archive.display())]
    #[diagnostic(
        code(mindevc_package::unsafe_entry),
        help("Entries must be relative paths without `..` components")
    )]
    UnsafeEntry { archive: PathBuf, entry: String },

    #[error("Invalid tool name `{name}`")]
    #[diagnostic(code(mindevc_package::invalid_tool_name))]
    InvalidToolName { name: String },

    #[error("Link target `{}` escapes the extraction directory", .target.display())]
    #[diagnostic(
        code(mindevc_package::invalid_link_target),
        help("Use a path relative to the archive root, or `$bin` for single-binary archives")
    )]
    InvalidLinkTarget { target: PathBuf },

    #[error("Link path `{}` is not absolute", .link.display())]
    #[diagnostic(code(mindevc_package::relative_link))]
    RelativeLinkPath { link: PathBuf },

    #[error("Link path `{}` is a non-empty directory", .link.display())]
    #[diagnostic(
        code(mindevc_package::link_path_occupied),
        help("Link paths name the symlink itself, not the directory it goes into")
    )]
    LinkPathOccupied { link: PathBuf },

    #[error("Failed to link `{}` -> `{}`: {source}", .link.display(), .target.display())]
    #[diagnostic(
        code(mindevc_package::link),
        help("Check that the link directory is writable")
    )]
    Link {
        link: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

/// A specialized Result type for package operations.
pub type Result<T> = std::result::Result<T, PackageError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            PackageError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
