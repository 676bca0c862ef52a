use std::{
    fs::{self, Permissions},
    os::unix::fs::PermissionsExt,
    path::Path,
};

use crate::error::{FileSystemError, FileSystemResult};

pub trait FileSystemProvider {
    /// Removes the specified filesystem entry safely.
    ///
    /// The entry is inspected with `lstat`, so a symlink is removed itself (never its
    /// target) and a dangling symlink is still removed. Directories are removed
    /// recursively. If nothing exists at `path`, this returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns a [`FileSystemError::File`] if the removal fails for any reason other than
    /// the path not existing (e.g., permission denied).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mindevc_utils::error::FileSystemResult;
    /// use mindevc_utils::fs::{FileSystemProvider, StandardFileSystemProvider};
    ///
    /// fn main() -> FileSystemResult<()> {
    ///     let fs = StandardFileSystemProvider;
    ///     fs.safe_remove("/opt/mindevc/bin/fd")?;
    ///     Ok(())
    /// }
    /// ```
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Creates a directory structure if it doesn't exist.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Adds the execute bits (`0o111`) to the mode of an existing file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileSystemError::File`] if the file metadata cannot be read or the
    /// permissions cannot be changed.
    fn make_executable<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;
}

#[derive(Default, Clone)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn safe_remove<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();

        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(FileSystemError::File {
                    path: path.to_path_buf(),
                    action: "inspect",
                    source: err,
                })
            }
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        result.map_err(|err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "remove",
                source: err,
            }
        })
    }

    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|err| {
                FileSystemError::Directory {
                    path: path.to_path_buf(),
                    action: "create",
                    source: err,
                }
            })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn make_executable<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        let file_error = |action, source| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action,
                source,
            }
        };

        let mode = fs::metadata(path)
            .map_err(|err| file_error("inspect", err))?
            .permissions()
            .mode();
        fs::set_permissions(path, Permissions::from_mode(mode | 0o111))
            .map_err(|err| file_error("chmod", err))
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Removes the specified filesystem entry safely.
///
/// See [`FileSystemProvider::safe_remove`] for detailed documentation.
pub fn safe_remove<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.safe_remove(path)
}

/// Adds the execute bits to a file.
///
/// See [`FileSystemProvider::make_executable`] for detailed documentation.
pub fn make_executable<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.make_executable(path)
}
