//! HTTP fetching for one hostname.
//!
//! `Connector`/`Connection` are the seam between the fallback policy and the
//! network: the production implementation is libcurl (`CurlConnector`), tests
//! substitute fakes. Every attempt is owned by a `Disposer` from the moment it
//! is opened, so it is disconnected exactly once however it ends, including
//! when it never gets established.

mod classify;
mod error;
mod headers;
mod transfer;

pub use self::classify::{classify_curl_error, classify_io_error, ErrorKind};
pub use self::error::FetchError;
pub use self::headers::{ResponseHead, ResponseHeaders};
pub use self::transfer::CurlConnector;

use std::fmt;
use std::io::{self, BufRead, Read};
use std::time::Duration;

use crate::decode::decode;

/// Value sent in `Accept-Encoding`.
pub const ACCEPT_ENCODINGS: &str = "gzip, deflate";

/// Request scheme tried for a hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request options.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below 1 byte/s for this long.
    pub stall_timeout: Option<Duration>,
    pub max_redirects: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            stall_timeout: None,
            max_redirects: 10,
        }
    }
}

/// Builds `scheme://hostname` and checks it is a usable URL.
pub fn target_url(scheme: Scheme, hostname: &str) -> Result<String, FetchError> {
    let target = format!("{}://{}", scheme, hostname);
    match url::Url::parse(&target) {
        Ok(u) if u.host_str().is_some() => Ok(target),
        Ok(_) => Err(FetchError::InvalidTarget {
            target,
            reason: "no host".to_string(),
        }),
        Err(e) => Err(FetchError::InvalidTarget {
            target,
            reason: e.to_string(),
        }),
    }
}

/// Opens connections. Implementations must be shareable across worker threads.
pub trait Connector: Send + Sync {
    /// Returns a handle for one attempt at `url`. Nothing touches the network
    /// until `Connection::establish`.
    fn open(&self, url: &str) -> Box<dyn Connection>;
}

/// One fetch attempt. Disconnected exactly once by its `Disposer`, whether or
/// not it was ever established.
pub trait Connection: Send {
    /// Connects and waits for the response headers.
    fn establish(&mut self) -> Result<(), FetchError>;

    /// Status code of the final response; None for schemes without one (`file://`).
    fn status(&self) -> Option<u32>;

    /// Declared `Content-Encoding` of the response, if any.
    fn content_encoding(&self) -> Option<&str>;

    /// Raw (still encoded) body.
    fn body(&mut self) -> &mut dyn Read;

    /// Releases the underlying connection. Called exactly once, by `Disposer`.
    fn disconnect(&mut self);
}

/// Owns a connection and disconnects it when dropped.
pub struct Disposer {
    conn: Box<dyn Connection>,
}

impl Disposer {
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self { conn }
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.conn.disconnect();
    }
}

/// Connects to `url`, decodes the body per its `Content-Encoding` and hands
/// the line reader to `read`. The status code is not checked: error pages are
/// read like any other page. The connection is released before returning, on
/// success and on every error path.
pub fn read_page<T, F>(connector: &dyn Connector, url: &str, read: F) -> Result<T, FetchError>
where
    F: FnOnce(&mut dyn BufRead) -> io::Result<T>,
{
    read_with(connector, url, false, read)
}

/// Like `read_page`, but a response whose status is not 2xx is an error and
/// its body is never read.
pub fn read_resource<T, F>(connector: &dyn Connector, url: &str, read: F) -> Result<T, FetchError>
where
    F: FnOnce(&mut dyn BufRead) -> io::Result<T>,
{
    read_with(connector, url, true, read)
}

fn read_with<T, F>(connector: &dyn Connector, url: &str, require_success: bool, read: F) -> Result<T, FetchError>
where
    F: FnOnce(&mut dyn BufRead) -> io::Result<T>,
{
    let mut page = Disposer::new(connector.open(url));
    let conn = page.connection();
    conn.establish()?;
    if require_success {
        if let Some(status) = conn.status().filter(|s| !(200..300).contains(s)) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
    }
    let encoding = conn.content_encoding().map(str::to_owned);
    let mut reader = decode(encoding.as_deref(), conn.body());
    let out = read(&mut *reader)?;
    Ok(out)
}
