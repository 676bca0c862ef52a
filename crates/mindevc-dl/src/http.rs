use ureq::{http::Response, Body};

use crate::{error::DownloadError, http_client::SHARED_AGENT};

pub struct Http;

impl Http {
    /// Issues a GET request with the shared agent.
    ///
    /// Redirects are followed by the transport. Any final status outside 2xx is returned as
    /// [`DownloadError::HttpError`].
    pub fn fetch(url: &str) -> Result<Response<Body>, DownloadError> {
        SHARED_AGENT.get(url).call().map_err(|err| {
            match err {
                ureq::Error::StatusCode(status) => {
                    DownloadError::HttpError {
                        status,
                        url: url.to_string(),
                    }
                }
                other => DownloadError::from(other),
            }
        })
    }
}
