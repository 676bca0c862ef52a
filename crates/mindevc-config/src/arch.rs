use std::fmt;

use mindevc_utils::system::machine;
use serde::{Deserialize, Serialize};

/// CPU architecture an archive is built for.
///
/// Parsed from the `uname -m` spelling. `amd64` and `arm64` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Architecture {
    X86_64,
    Aarch64,
    Other(String),
}

impl Architecture {
    /// Architecture of the running host.
    pub fn host() -> Self {
        Self::from(machine())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Architecture {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Architecture {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Architecture> for String {
    fn from(arch: Architecture) -> Self {
        match arch {
            Architecture::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
