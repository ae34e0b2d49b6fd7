//! Fetch error type.

use std::io;

use super::classify::{classify_curl_error, classify_io_error, ErrorKind};

/// Failure of one fetch attempt (connect, read or decode).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// libcurl failed before the response was established (DNS, connect, TLS, timeout).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Reading or decoding the body failed.
    #[error("{0}")]
    Io(#[from] io::Error),
    /// Hostname does not form a valid request target.
    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
    /// A resource that must load cleanly answered with a non-2xx status.
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u32 },
    /// The transfer thread went away without reporting a result.
    #[error("transfer ended without a response")]
    TransferLost,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Curl(e) => classify_curl_error(e),
            FetchError::Io(e) => classify_io_error(e),
            FetchError::InvalidTarget { .. } | FetchError::Status { .. } | FetchError::TransferLost => {
                ErrorKind::Other
            }
        }
    }

    /// Message used as an outcome diagnostic; None when the error carries no text.
    pub fn message(&self) -> Option<String> {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            None
        } else {
            Some(msg)
        }
    }
}
