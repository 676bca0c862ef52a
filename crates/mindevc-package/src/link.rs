//! Symlink publication of extracted files.

use std::{
    collections::BTreeMap,
    fmt, fs, io,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};

use mindevc_utils::fs::{ensure_dir_exists, make_executable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{PackageError, Result},
    extract::{confined_path, Extraction},
};

/// Config spelling of [`LinkTarget::Artifact`].
pub const ARTIFACT_MARKER: &str = "$bin";

/// What a published link points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkTarget {
    /// A path relative to the extraction root.
    Relative(PathBuf),
    /// The extracted artifact itself; for `bin` archives, the tool binary.
    Artifact,
}

impl LinkTarget {
    /// Resolves the target against an extraction.
    ///
    /// # Errors
    ///
    /// [`PackageError::InvalidLinkTarget`] if a relative target is empty, absolute or
    /// climbs out of the extraction root.
    pub fn resolve(&self, extraction: &Extraction) -> Result<PathBuf> {
        match self {
            Self::Artifact => Ok(extraction.artifact.clone()),
            Self::Relative(path) => {
                confined_path(path)
                    .filter(|relative| !relative.as_os_str().is_empty())
                    .map(|relative| extraction.root.join(relative))
                    .ok_or_else(|| {
                        PackageError::InvalidLinkTarget {
                            target: path.clone(),
                        }
                    })
            }
        }
    }
}

impl From<String> for LinkTarget {
    fn from(value: String) -> Self {
        if value == ARTIFACT_MARKER {
            Self::Artifact
        } else {
            Self::Relative(PathBuf::from(value))
        }
    }
}

impl From<&str> for LinkTarget {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<LinkTarget> for String {
    fn from(target: LinkTarget) -> Self {
        match target {
            LinkTarget::Artifact => ARTIFACT_MARKER.to_string(),
            LinkTarget::Relative(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact => f.write_str(ARTIFACT_MARKER),
            Self::Relative(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A symlink created by [`publish_links`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedLink {
    pub link: PathBuf,
    pub target: PathBuf,
}

/// Projects an extraction onto the declared link paths.
///
/// Every link is replaced destructively: whatever exists at the link path is removed before
/// the new symlink is created. [`LinkTarget::Artifact`] targets are made executable.
///
/// # Errors
///
/// * [`PackageError::RelativeLinkPath`] if a link path is not absolute.
/// * [`PackageError::InvalidLinkTarget`] if a target escapes the extraction root.
/// * [`PackageError::Link`] / [`PackageError::FileSystem`] if the old entry cannot be removed
///   or the new link cannot be created.
pub fn publish_links(
    extraction: &Extraction,
    links: &BTreeMap<PathBuf, LinkTarget>,
) -> Result<Vec<PublishedLink>> {
    let mut published = Vec::with_capacity(links.len());

    for (link, target) in links {
        if !link.is_absolute() {
            return Err(PackageError::RelativeLinkPath {
                link: link.clone(),
            });
        }

        let resolved = target.resolve(extraction)?;
        if matches!(target, LinkTarget::Artifact) {
            make_executable(&resolved)?;
        } else if !resolved.exists() {
            warn!(
                "{} points at missing {}",
                link.display(),
                resolved.display()
            );
        }

        publish(link, &resolved)?;
        published.push(PublishedLink {
            link: link.clone(),
            target: resolved,
        });
    }

    Ok(published)
}

fn publish(link: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        ensure_dir_exists(parent)?;
    }
    remove_stale(link, target)?;

    symlink(target, link).map_err(|source| {
        PackageError::Link {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            source,
        }
    })?;

    debug!("linked {} -> {}", link.display(), target.display());
    Ok(())
}

/// Removes a file, symlink or empty directory at `link`. Non-empty directories are kept.
fn remove_stale(link: &Path, target: &Path) -> Result<()> {
    let link_failed = |source| {
        PackageError::Link {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            source,
        }
    };

    let metadata = match fs::symlink_metadata(link) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(link_failed(err)),
    };

    if metadata.is_dir() {
        let mut entries = fs::read_dir(link).map_err(link_failed)?;
        if entries.next().is_some() {
            return Err(PackageError::LinkPathOccupied {
                link: link.to_path_buf(),
            });
        }
        fs::remove_dir(link).map_err(link_failed)
    } else {
        fs::remove_file(link).map_err(link_failed)
    }
}
