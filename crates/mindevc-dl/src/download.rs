use std::{
    fs,
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
};

use mindevc_utils::{
    error::HashError,
    fs::{ensure_dir_exists, safe_remove},
    hash::{is_sha256_hex, verify_checksum},
};
use tracing::{debug, trace, warn};
use ureq::{
    http::{header::CONTENT_LENGTH, Response},
    Body,
};
use url::Url;

use crate::{
    error::DownloadError,
    http::Http,
    types::{CachedArtifact, Progress},
};

/// A download into a content-addressed cache directory.
///
/// The artifact is stored as `<cache_dir>/<sha256>`. An existing entry is re-hashed on every
/// use and only served when it still matches; fresh downloads are streamed into a temporary
/// file in the same directory and renamed into place once verified.
pub struct Download {
    pub url: String,
    pub cache_dir: PathBuf,
    pub checksum: String,
    pub on_progress: Option<Box<dyn Fn(Progress) + Send + Sync>>,
}

impl Download {
    /// Creates a new `Download` for the given URL.
    ///
    /// The cache directory defaults to the current directory and the checksum is empty, so
    /// callers are expected to set both before calling [`Download::execute`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mindevc_dl::download::Download;
    ///
    /// let artifact = Download::new("https://example.com/fd.tar.gz")
    ///     .cache_dir("/tmp/mindevc/tools/_download")
    ///     .checksum("d9bfa25ec28624545c222992e1b00673b7c9ca5eb15393c40369f10b28f9c932")
    ///     .execute()
    ///     .expect("download failed");
    /// println!("{}", artifact.path.display());
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_dir: PathBuf::from("."),
            checksum: String::new(),
            on_progress: None,
        }
    }

    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Sets the expected SHA-256 digest (hex, any case).
    pub fn checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = checksum.into();
        self
    }

    /// Registers a progress callback invoked with `Progress` events during a network download.
    ///
    /// No events are emitted for a cache hit.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mindevc_dl::download::Download;
    /// use mindevc_dl::types::Progress;
    ///
    /// let _dl = Download::new("https://example.com/file")
    ///     .progress(|event: Progress| match event {
    ///         Progress::Starting { total } => eprintln!("starting, total={}", total),
    ///         Progress::Chunk { current, total } => eprintln!("{}/{}", current, total),
    ///         Progress::Complete { total } => eprintln!("complete, total={}", total),
    ///     });
    /// ```
    pub fn progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// Returns a verified cache entry for the configured URL and checksum.
    ///
    /// # Errors
    ///
    /// * [`DownloadError::InvalidDigest`] if the checksum is not a SHA-256 hex digest; this is
    ///   checked before any I/O.
    /// * [`DownloadError::InvalidUrl`] if the URL does not parse.
    /// * [`DownloadError::HttpError`] / [`DownloadError::Network`] on transport failures.
    /// * [`DownloadError::EmptyBody`] if the server sent zero bytes.
    /// * [`DownloadError::ChecksumMismatch`] if the downloaded content does not hash to the
    ///   checksum. Nothing is left behind in the cache directory in that case.
    pub fn execute(self) -> Result<CachedArtifact, DownloadError> {
        if !is_sha256_hex(&self.checksum) {
            return Err(DownloadError::InvalidDigest {
                digest: self.checksum,
            });
        }
        let digest = self.checksum.to_ascii_lowercase();

        Url::parse(&self.url).map_err(|err| {
            DownloadError::InvalidUrl {
                url: self.url.clone(),
                source: err,
            }
        })?;

        ensure_dir_exists(&self.cache_dir)?;
        let path = self.cache_dir.join(&digest);

        if self.verify_existing(&path, &digest)? {
            debug!("cache hit for {} at {}", self.url, path.display());
            return Ok(CachedArtifact {
                path,
                cache_hit: true,
            });
        }

        self.download_to_cache(&path, &digest)?;

        Ok(CachedArtifact {
            path,
            cache_hit: false,
        })
    }

    /// Checks an existing cache entry. Stale or foreign entries are removed.
    fn verify_existing(&self, path: &Path, digest: &str) -> Result<bool, DownloadError> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        if metadata.is_file() {
            match verify_checksum(path, digest) {
                Ok(()) => return Ok(true),
                Err(HashError::Mismatch { actual, .. }) => {
                    warn!(
                        "cached file {} hashes to {}, discarding it",
                        path.display(),
                        actual
                    );
                }
                Err(err) => return Err(err.into()),
            }
        } else {
            warn!("{} is not a regular file, discarding it", path.display());
        }

        safe_remove(path)?;
        Ok(false)
    }

    fn download_to_cache(&self, path: &Path, digest: &str) -> Result<(), DownloadError> {
        debug!("downloading {} into {}", self.url, path.display());
        let resp = Http::fetch(&self.url)?;
        let total = parse_content_length(&resp);

        self.emit(Progress::Starting {
            total,
        });

        // Dropping the temp file on any early return unlinks it.
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{digest}."))
            .suffix(".part")
            .tempfile_in(&self.cache_dir)?;

        let mut reader = resp.into_body().into_reader();
        let mut buffer = [0u8; 8192];
        let mut downloaded = 0u64;

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }

            temp.write_all(&buffer[..n])?;
            downloaded += n as u64;

            self.emit(Progress::Chunk {
                current: downloaded,
                total,
            });
        }
        temp.as_file_mut().flush()?;

        if downloaded == 0 {
            return Err(DownloadError::EmptyBody {
                url: self.url.clone(),
            });
        }
        trace!("received {} bytes from {}", downloaded, self.url);

        verify_checksum(temp.path(), digest).map_err(|err| {
            match err {
                HashError::Mismatch {
                    expected, actual, ..
                } => {
                    DownloadError::ChecksumMismatch {
                        url: self.url.clone(),
                        expected,
                        actual,
                    }
                }
                err => err.into(),
            }
        })?;

        temp.persist(path).map_err(|err| err.error)?;

        self.emit(Progress::Complete {
            total: downloaded,
        });

        Ok(())
    }

    fn emit(&self, progress: Progress) {
        if let Some(ref cb) = self.on_progress {
            cb(progress);
        }
    }
}

/// Fetches `url` into `cache_dir`, keyed by `checksum`.
///
/// Shorthand for [`Download`] without a progress callback.
pub fn fetch<P: AsRef<Path>>(
    cache_dir: P,
    url: &str,
    checksum: &str,
) -> Result<PathBuf, DownloadError> {
    Download::new(url)
        .cache_dir(cache_dir.as_ref())
        .checksum(checksum)
        .execute()
        .map(|artifact| artifact.path)
}

/// Size of the response body from `Content-Length`, or 0 when absent.
fn parse_content_length(resp: &Response<Body>) -> u64 {
    resp.headers()
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|len| len.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        thread,
    };

    use mindevc_utils::hash::calculate_checksum;
    use tempfile::tempdir;

    use super::*;

    const CONTENT: &[u8] = b"test content";
    const CONTENT_SHA256: &str = "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72";
    const OTHER_SHA256: &str = "6292c8b17c54333d0449794f91ca2287c29e0adc1bcf06795c54bc6aa1a003e6";

    struct TestServer {
        url: String,
        hits: Arc<AtomicUsize>,
    }

    impl TestServer {
        fn serve(status: u16, body: &'static [u8]) -> Self {
            let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
            let addr = server.server_addr().to_ip().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();

            thread::spawn(move || {
                for request in server.incoming_requests() {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let response = tiny_http::Response::from_data(body).with_status_code(status);
                    let _ = request.respond(response);
                }
            });

            Self {
                url: format!("http://{addr}/artifact"),
                hits,
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_fetch_downloads_once_then_hits_cache() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        let first = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap();
        let second = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap();

        assert_eq!(first, dir.path().join(CONTENT_SHA256));
        assert_eq!(first, second);
        assert_eq!(server.hits(), 1);
        assert_eq!(calculate_checksum(&second).unwrap(), CONTENT_SHA256);
        assert_eq!(dir_entries(dir.path()), vec![CONTENT_SHA256.to_string()]);
    }

    #[test]
    fn test_execute_reports_cache_hit() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        let fresh = Download::new(&server.url)
            .cache_dir(dir.path())
            .checksum(CONTENT_SHA256)
            .execute()
            .unwrap();
        assert!(!fresh.cache_hit);

        let cached = Download::new(&server.url)
            .cache_dir(dir.path())
            .checksum(CONTENT_SHA256)
            .execute()
            .unwrap();
        assert!(cached.cache_hit);
    }

    #[test]
    fn test_corrupted_cache_entry_is_replaced() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        let path = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap();
        fs::write(&path, b"corrupted").unwrap();

        let path = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap();

        assert_eq!(server.hits(), 2);
        assert_eq!(fs::read(&path).unwrap(), CONTENT);
    }

    #[test]
    fn test_uppercase_checksum_uses_lowercase_name() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        let path = fetch(dir.path(), &server.url, &CONTENT_SHA256.to_uppercase()).unwrap();
        assert_eq!(path, dir.path().join(CONTENT_SHA256));
    }

    #[test]
    fn test_checksum_mismatch_leaves_nothing_behind() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        let err = fetch(dir.path(), &server.url, OTHER_SHA256).unwrap_err();

        match err {
            DownloadError::ChecksumMismatch {
                expected,
                actual,
                ..
            } => {
                assert_eq!(expected, OTHER_SHA256);
                assert_eq!(actual, CONTENT_SHA256);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_http_error_status() {
        let server = TestServer::serve(404, b"not found");
        let dir = tempdir().unwrap();

        let err = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap_err();

        assert!(matches!(err, DownloadError::HttpError { status: 404, .. }));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_empty_body_is_an_error() {
        let server = TestServer::serve(200, b"");
        let dir = tempdir().unwrap();

        let err = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap_err();

        assert!(matches!(err, DownloadError::EmptyBody { .. }));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_invalid_digest_is_rejected_before_network() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();

        for digest in ["", "abc123", "not-a-digest"] {
            let err = fetch(dir.path(), &server.url, digest).unwrap_err();
            assert!(matches!(err, DownloadError::InvalidDigest { .. }));
        }
        assert_eq!(server.hits(), 0);
    }

    #[test]
    fn test_invalid_url() {
        let dir = tempdir().unwrap();
        let err = fetch(dir.path(), "not a url", CONTENT_SHA256).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    }

    #[test]
    fn test_cache_dir_is_a_file() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();

        let err = fetch(&file, &server.url, CONTENT_SHA256).unwrap_err();
        assert!(matches!(err, DownloadError::FileSystem(_)));
        assert_eq!(server.hits(), 0);
    }

    #[test]
    fn test_directory_at_cache_path_is_replaced() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(CONTENT_SHA256)).unwrap();

        let path = fetch(dir.path(), &server.url, CONTENT_SHA256).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_progress_events() {
        let server = TestServer::serve(200, CONTENT);
        let dir = tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        Download::new(&server.url)
            .cache_dir(dir.path())
            .checksum(CONTENT_SHA256)
            .progress(move |progress| sink.lock().unwrap().push(progress))
            .execute()
            .unwrap();

        let events = events.lock().unwrap();
        let len = CONTENT.len() as u64;
        assert_eq!(
            events.first(),
            Some(&Progress::Starting {
                total: len
            })
        );
        assert_eq!(
            events.last(),
            Some(&Progress::Complete {
                total: len
            })
        );
        assert!(events.contains(&Progress::Chunk {
            current: len,
            total: len
        }));
    }
}
