use std::path::PathBuf;

/// Download progress events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Starting { total: u64 },
    Chunk { current: u64, total: u64 },
    Complete { total: u64 },
}

/// A verified artifact in the download cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// `<cache dir>/<lowercase sha256>`
    pub path: PathBuf,
    /// `true` when the existing cache entry was reused without network I/O.
    pub cache_hit: bool,
}
