//! Classify curl and IO errors into coarse kinds for logging.

use std::fmt;
use std::io;

/// High-level classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer timed out.
    Timeout,
    /// Network-level failure (DNS, refused, reset).
    Connection,
    /// TLS handshake or certificate failure.
    Tls,
    /// Body could not be decompressed.
    Decode,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Tls => "tls",
            ErrorKind::Decode => "decode",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_ssl_connect_error()
        || e.is_peer_failed_verification()
        || e.is_ssl_certproblem()
        || e.is_ssl_cacert()
    {
        return ErrorKind::Tls;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify an IO error from reading a body. Curl failures that happened
/// mid-body arrive wrapped in an `io::Error` and are unwrapped here.
pub fn classify_io_error(e: &io::Error) -> ErrorKind {
    if let Some(ce) = e.get_ref().and_then(|inner| inner.downcast_ref::<curl::Error>()) {
        return classify_curl_error(ce);
    }
    match e.kind() {
        io::ErrorKind::TimedOut => ErrorKind::Timeout,
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => ErrorKind::Decode,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::BrokenPipe => ErrorKind::Connection,
        _ => ErrorKind::Other,
    }
}
