//! Locations inside the cache directory.

use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

use mindevc_config::arch::Architecture;

use crate::{error::MindevcError, MindevcResult};

const TOOLS_DIR: &str = "tools";
const DOWNLOAD_DIR: &str = "_download";

/// Directory holding content-addressed downloads: `<cache>/tools/_download`.
pub fn download_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(TOOLS_DIR).join(DOWNLOAD_DIR)
}

/// Extraction root of one tool: `<cache>/tools/<arch>/<tool>`.
pub fn extract_dir(cache_dir: &Path, arch: &Architecture, tool: &str) -> PathBuf {
    cache_dir.join(TOOLS_DIR).join(arch.as_str()).join(tool)
}

/// Checks that `arch` names exactly one directory below `<cache>/tools` and does not
/// collide with the download directory.
pub fn check_arch(arch: &Architecture) -> MindevcResult<()> {
    let name = arch.as_str();
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == OsStr::new(name)
    );

    if plain && name != DOWNLOAD_DIR {
        Ok(())
    } else {
        Err(MindevcError::InvalidArchitecture {
            arch: name.to_string(),
        })
    }
}
