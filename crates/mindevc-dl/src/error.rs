use miette::Diagnostic;
use mindevc_utils::error::{FileSystemError, HashError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {url}")]
    #[diagnostic(code(mindevc_dl::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(
        code(mindevc_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(mindevc_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error("Server returned an empty body for {url}")]
    #[diagnostic(code(mindevc_dl::empty_body))]
    EmptyBody { url: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(mindevc_dl::checksum_mismatch),
        help("The upstream artifact changed or the declared hash is wrong")
    )]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid SHA-256 digest `{digest}`")]
    #[diagnostic(
        code(mindevc_dl::invalid_digest),
        help("Digests must be 64 hexadecimal characters without a prefix")
    )]
    InvalidDigest { digest: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(mindevc_dl::io))]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}
