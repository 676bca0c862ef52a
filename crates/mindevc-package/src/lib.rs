//! Archive handling for the mindevc toolchain bootstrapper.
//!
//! This crate turns a verified download into files on disk and exposes them through
//! symlinks.
//!
//! # Supported Encodings
//!
//! - **tar.gz / tar.bz2 / tar.xz**: compressed tar streams, extracted as a tree
//! - **zip**: zip archives, extracted as a tree
//! - **bin**: the download is the tool binary
//! - **bin.gz / bin.bz2 / bin.xz**: a compressed tool binary
//!
//! # Example
//!
//! ```no_run
//! use std::{collections::BTreeMap, path::{Path, PathBuf}};
//! use mindevc_package::{extract_archive, publish_links, ArchiveEncoding, LinkTarget, PackageError};
//!
//! fn install(archive: &Path) -> Result<(), PackageError> {
//!     let extraction = extract_archive(
//!         archive,
//!         ArchiveEncoding::TarGz,
//!         "fd",
//!         Path::new("/tmp/mindevc/tools/x86_64/fd"),
//!     )?;
//!     let links = BTreeMap::from([(
//!         PathBuf::from("/opt/mindevc/bin/fd"),
//!         LinkTarget::from("fd-v10.2.0-x86_64-unknown-linux-musl/fd"),
//!     )]);
//!     publish_links(&extraction, &links)?;
//!     Ok(())
//! }
//! ```

pub mod encoding;
pub mod error;
pub mod extract;
pub mod link;

pub use encoding::{ArchiveEncoding, Compression};
pub use error::{ErrorContext, PackageError, Result};
pub use extract::{extract_archive, Extraction};
pub use link::{publish_links, LinkTarget, PublishedLink, ARTIFACT_MARKER};
