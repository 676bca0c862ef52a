use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// Container/compression format of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveEncoding {
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "bin")]
    Bin,
    #[serde(rename = "bin.gz")]
    BinGz,
    #[serde(rename = "bin.bz2")]
    BinBz2,
    #[serde(rename = "bin.xz")]
    BinXz,
}

/// Single-stream compression applied before the tar or bin stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Xz,
}

impl ArchiveEncoding {
    pub const ALL: [ArchiveEncoding; 8] = [
        Self::TarGz,
        Self::TarBz2,
        Self::TarXz,
        Self::Zip,
        Self::Bin,
        Self::BinGz,
        Self::BinBz2,
        Self::BinXz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::Zip => "zip",
            Self::Bin => "bin",
            Self::BinGz => "bin.gz",
            Self::BinBz2 => "bin.bz2",
            Self::BinXz => "bin.xz",
        }
    }

    /// Whether the payload is a tar stream extracted as a directory tree.
    pub fn is_tar(&self) -> bool {
        matches!(self, Self::TarGz | Self::TarBz2 | Self::TarXz)
    }

    /// Whether the payload is the tool binary itself.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Bin | Self::BinGz | Self::BinBz2 | Self::BinXz)
    }

    /// Whether a gzip/bzip2/xz stage runs before the tar or bin stage.
    pub fn is_compressed(&self) -> bool {
        self.compression().is_some()
    }

    pub fn compression(&self) -> Option<Compression> {
        match self {
            Self::TarGz | Self::BinGz => Some(Compression::Gzip),
            Self::TarBz2 | Self::BinBz2 => Some(Compression::Bzip2),
            Self::TarXz | Self::BinXz => Some(Compression::Xz),
            Self::Zip | Self::Bin => None,
        }
    }
}

impl fmt::Display for ArchiveEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveEncoding {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.as_str() == s)
            .ok_or_else(|| {
                PackageError::UnsupportedEncoding {
                    encoding: s.to_string(),
                }
            })
    }
}
