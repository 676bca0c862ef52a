//! Archive extraction for the eight supported encodings.

use std::{
    fs::{self, File, OpenOptions, Permissions},
    io::{self, BufReader, Read},
    os::unix::fs::{OpenOptionsExt, PermissionsExt},
    path::{Component, Path, PathBuf},
};

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use mindevc_utils::fs::{ensure_dir_exists, safe_remove};
use tracing::{debug, trace};
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::{
    encoding::{ArchiveEncoding, Compression},
    error::{ErrorContext, PackageError, Result},
};

/// Mode given to raw binaries.
pub const BINARY_MODE: u32 = 0o755;

/// Suffix of the decompressed sibling of a `bin.*` archive.
pub const DECOMPRESSED_SUFFIX: &str = ".unc";

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Result of extracting an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Directory the archive was extracted into.
    pub root: PathBuf,
    /// The single published binary for `bin` encodings, otherwise `root`.
    pub artifact: PathBuf,
}

/// Extracts `archive` into `destination`.
///
/// Tree encodings (`tar.*`, `zip`) are unpacked below `destination` with the permission bits
/// stored in the archive. Binary encodings (`bin`, `bin.*`) are written to
/// `destination/<tool>` with mode `0755`. Entries already present are replaced, so running
/// the same extraction twice ends in the same state.
///
/// # Errors
///
/// * [`PackageError::InvalidToolName`] if `tool` is not a plain file name.
/// * [`PackageError::UnsafeEntry`] if an entry is absolute or contains `..`.
/// * [`PackageError::Archive`] / [`PackageError::Zip`] / [`PackageError::Decompress`] for
///   unreadable, truncated or corrupt input.
/// * [`PackageError::IoError`] / [`PackageError::FileSystem`] for write failures.
pub fn extract_archive(
    archive: &Path,
    encoding: ArchiveEncoding,
    tool: &str,
    destination: &Path,
) -> Result<Extraction> {
    if !is_plain_name(tool) {
        return Err(PackageError::InvalidToolName {
            name: tool.to_string(),
        });
    }

    debug!(
        "extracting {} ({}) into {}",
        archive.display(),
        encoding,
        destination.display()
    );
    ensure_dir_exists(destination)?;

    let artifact = match encoding {
        ArchiveEncoding::Zip => {
            unpack_zip(archive, destination)?;
            destination.to_path_buf()
        }
        ArchiveEncoding::TarGz | ArchiveEncoding::TarBz2 | ArchiveEncoding::TarXz => {
            let file = open_archive(archive)?;
            let reader = decoder(encoding.compression(), BufReader::new(file));
            unpack_tar(reader, archive, destination)?;
            destination.to_path_buf()
        }
        ArchiveEncoding::Bin => install_binary(archive, &destination.join(tool))?,
        ArchiveEncoding::BinGz | ArchiveEncoding::BinBz2 | ArchiveEncoding::BinXz => {
            let payload = decompressed_payload(archive, encoding.compression())?;
            install_binary(&payload, &destination.join(tool))?
        }
    };

    Ok(Extraction {
        root: destination.to_path_buf(),
        artifact,
    })
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Returns `path` stripped of `.` components, or `None` if it is absolute or has `..`.
pub(crate) fn confined_path(path: &Path) -> Option<PathBuf> {
    let mut confined = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => confined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(confined)
}

fn open_archive(archive: &Path) -> Result<File> {
    File::open(archive).with_context(|| format!("opening archive `{}`", archive.display()))
}

fn decoder<'a, R: Read + 'a>(compression: Option<Compression>, reader: R) -> Box<dyn Read + 'a> {
    match compression {
        Some(Compression::Gzip) => Box::new(MultiGzDecoder::new(reader)),
        Some(Compression::Bzip2) => Box::new(BzDecoder::new(reader)),
        Some(Compression::Xz) => Box::new(XzDecoder::new_multi_decoder(reader)),
        None => Box::new(reader),
    }
}

fn unpack_tar<R: Read>(reader: R, archive_path: &Path, destination: &Path) -> Result<()> {
    let read_failed = |source| {
        PackageError::Archive {
            path: archive_path.to_path_buf(),
            source,
        }
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(read_failed)? {
        let mut entry = entry.map_err(read_failed)?;
        let entry_path = entry.path().map_err(read_failed)?.into_owned();

        let relative = confined_path(&entry_path).ok_or_else(|| {
            PackageError::UnsafeEntry {
                archive: archive_path.to_path_buf(),
                entry: entry_path.display().to_string(),
            }
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let header = entry.header();
        let entry_type = header.entry_type();
        let mode = header.mode().unwrap_or(0o644) & 0o7777;
        let output = destination.join(&relative);

        if entry_type.is_dir() {
            create_dir(&output, mode)?;
        } else if entry_type.is_file() {
            write_file(&mut entry, &output, mode)?;
        } else {
            debug!(
                "skipping {:?} entry `{}` in {}",
                entry_type,
                relative.display(),
                archive_path.display()
            );
        }
    }

    Ok(())
}

fn unpack_zip(archive_path: &Path, destination: &Path) -> Result<()> {
    let zip_failed = |source| {
        PackageError::Zip {
            path: archive_path.to_path_buf(),
            source,
        }
    };

    let file = open_archive(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(zip_failed)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_failed)?;
        let name = entry.name().to_string();

        let relative = confined_path(Path::new(&name)).ok_or_else(|| {
            PackageError::UnsafeEntry {
                archive: archive_path.to_path_buf(),
                entry: name.clone(),
            }
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let output = destination.join(&relative);
        if entry.is_dir() {
            let mode = entry.unix_mode().map(|m| m & 0o7777).unwrap_or(0o755);
            create_dir(&output, mode)?;
        } else if entry
            .unix_mode()
            .is_some_and(|m| m & S_IFMT == S_IFLNK)
        {
            debug!(
                "skipping symlink `{}` in {}",
                name,
                archive_path.display()
            );
        } else {
            let mode = entry.unix_mode().map(|m| m & 0o7777).unwrap_or(0o644);
            write_file(&mut entry, &output, mode)?;
        }
    }

    Ok(())
}

fn create_dir(path: &Path, mode: u32) -> Result<()> {
    if fs::symlink_metadata(path).is_ok_and(|m| !m.is_dir()) {
        safe_remove(path)?;
    }
    fs::create_dir_all(path).with_context(|| format!("creating directory `{}`", path.display()))?;
    // Owner keeps rwx so later entries can still be written below it.
    fs::set_permissions(path, Permissions::from_mode(mode | 0o700))
        .with_context(|| format!("setting permissions on `{}`", path.display()))
}

fn write_file<R: Read>(reader: &mut R, path: &Path, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory `{}`", parent.display()))?;
    }
    // Unlink first: a running binary cannot be truncated (ETXTBSY) and a read-only
    // file cannot be reopened for writing.
    safe_remove(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
        .with_context(|| format!("creating file `{}`", path.display()))?;
    let written =
        io::copy(reader, &mut file).with_context(|| format!("writing `{}`", path.display()))?;
    fs::set_permissions(path, Permissions::from_mode(mode))
        .with_context(|| format!("setting permissions on `{}`", path.display()))?;

    trace!("wrote {} ({} bytes, mode {:o})", path.display(), written, mode);
    Ok(())
}

/// Path of the cached, decompressed copy of a `bin.*` archive.
pub fn decompressed_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(DECOMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Decompresses a single-stream archive once and reuses the result afterwards.
fn decompressed_payload(archive: &Path, compression: Option<Compression>) -> Result<PathBuf> {
    let target = decompressed_path(archive);
    if is_fresh(&target, archive) {
        debug!("reusing decompressed {}", target.display());
        return Ok(target);
    }

    let dir = archive.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".unc")
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary file in `{}`", dir.display()))?;

    let file = open_archive(archive)?;
    let mut reader = decoder(compression, BufReader::new(file));
    io::copy(&mut reader, &mut temp).map_err(|source| {
        PackageError::Decompress {
            path: archive.to_path_buf(),
            source,
        }
    })?;

    temp.persist(&target)
        .map_err(|err| err.error)
        .with_context(|| format!("saving `{}`", target.display()))?;
    Ok(target)
}

/// A decompressed copy is reused while it is a regular file no older than its archive.
/// A re-downloaded archive is newer than the copy made from its predecessor.
fn is_fresh(decompressed: &Path, archive: &Path) -> bool {
    let modified = |path: &Path| {
        fs::symlink_metadata(path)
            .ok()
            .filter(|metadata| metadata.is_file())
            .and_then(|metadata| metadata.modified().ok())
    };
    matches!(
        (modified(decompressed), modified(archive)),
        (Some(copy), Some(source)) if copy >= source
    )
}

fn install_binary(source: &Path, target: &Path) -> Result<PathBuf> {
    let mut input = open_archive(source)?;
    write_file(&mut input, target, BINARY_MODE)?;
    Ok(target.to_path_buf())
}
