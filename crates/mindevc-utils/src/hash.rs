use std::{fs::File, io, path::Path};

use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Calculates the SHA-256 checksum of a file.
///
/// The file is streamed through the hasher, so arbitrarily large artifacts can be
/// hashed without loading them into memory. The digest is returned as a lowercase
/// hex string without any prefix.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be opened or read (this includes
///   passing a directory).
///
/// # Example
///
/// ```no_run
/// use mindevc_utils::error::HashResult;
/// use mindevc_utils::hash::calculate_checksum;
///
/// fn main() -> HashResult<()> {
///     let checksum = calculate_checksum("/path/to/file")?;
///     println!("Checksum is {}", checksum);
///     Ok(())
/// }
/// ```
pub fn calculate_checksum<P: AsRef<Path>>(file_path: P) -> HashResult<String> {
    let file_path = file_path.as_ref();
    let read_failed = |source| {
        HashError::ReadFailed {
            path: file_path.to_path_buf(),
            source,
        }
    };

    let mut file = File::open(file_path).map_err(read_failed)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(read_failed)?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verifies the checksum of a file against an expected value.
///
/// The comparison is case-insensitive, so digests copied from upstream release pages
/// in uppercase still match.
///
/// # Errors
///
/// * [`HashError::ReadFailed`] if the file cannot be read.
/// * [`HashError::Mismatch`] if the file hashes to something else; it carries the actual
///   digest.
pub fn verify_checksum<P: AsRef<Path>>(file_path: P, expected: &str) -> HashResult<()> {
    let file_path = file_path.as_ref();
    let actual = calculate_checksum(file_path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(HashError::Mismatch {
            path: file_path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Returns `true` if `digest` looks like a hex-encoded SHA-256 digest.
pub fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == SHA256_HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit())
}
