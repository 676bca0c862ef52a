use std::{fmt, path::PathBuf};

/// All event types emitted while acquiring tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MindevcEvent {
    /// A requested tool was not installed because of a registry gap.
    ToolSkipped { tool: String, reason: SkipReason },
    /// The cached artifact was present and verified; no download happened.
    CacheHit { tool: String, path: PathBuf },
    /// Download is starting. `total` is 0 when the server sends no length.
    DownloadStarting { tool: String, url: String, total: u64 },
    /// Download progress update.
    DownloadProgress {
        tool: String,
        current: u64,
        total: u64,
    },
    /// Download completed and the artifact was verified.
    DownloadComplete { tool: String, total: u64 },
    /// Archive extraction is starting.
    Extracting {
        tool: String,
        archive: PathBuf,
        destination: PathBuf,
    },
    /// A symlink was published.
    Linked {
        tool: String,
        link: PathBuf,
        target: PathBuf,
    },
    /// All stages finished for a tool.
    ToolInstalled { tool: String },
}

impl MindevcEvent {
    /// Name of the tool this event refers to.
    pub fn tool(&self) -> &str {
        match self {
            Self::ToolSkipped { tool, .. }
            | Self::CacheHit { tool, .. }
            | Self::DownloadStarting { tool, .. }
            | Self::DownloadProgress { tool, .. }
            | Self::DownloadComplete { tool, .. }
            | Self::Extracting { tool, .. }
            | Self::Linked { tool, .. }
            | Self::ToolInstalled { tool } => tool,
        }
    }
}

/// Why a requested tool was skipped instead of installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The tool name is not in the registry.
    UnknownTool,
    /// The registry entry uses a source kind with no implementation.
    UnsupportedSource { source: String },
    /// No archive is declared for the requested architecture.
    NoArchiveForArch { arch: String },
    /// The archive URL could not be parsed.
    InvalidUrl { url: String, reason: String },
    /// The archive URL uses a scheme other than http or https.
    UnsupportedScheme { url: String, scheme: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool => write!(f, "not found in the tool registry"),
            Self::UnsupportedSource { source } => {
                write!(f, "source kind `{source}` is not implemented")
            }
            Self::NoArchiveForArch { arch } => write!(f, "no archive available for {arch}"),
            Self::InvalidUrl { url, reason } => write!(f, "invalid url `{url}`: {reason}"),
            Self::UnsupportedScheme { url, scheme } => {
                write!(f, "unsupported url scheme `{scheme}` in `{url}`")
            }
        }
    }
}
