//! HTTPS-first, HTTP-fallback resolution of one hostname.
//!
//! HTTP is tried only when the HTTPS attempt fails (connect, read or decode);
//! an HTTPS page that loads but has no matching line is final (`NoMatch`).

use crate::aggregate::Outcome;
use crate::fetch::{read_page, target_url, Connector, FetchError, Scheme};
use crate::matcher::matches;
use crate::pattern::LinePredicate;

/// Diagnostic used when no attempt produced an error message.
pub const UNKNOWN_DIAGNOSTIC: &str = "UNKNOWN";

/// Fetches hostnames and evaluates the predicate against their homepages.
#[derive(Clone, Copy)]
pub struct Checker<'a> {
    connector: &'a dyn Connector,
    predicate: &'a dyn LinePredicate,
}

impl<'a> Checker<'a> {
    pub fn new(connector: &'a dyn Connector, predicate: &'a dyn LinePredicate) -> Self {
        Self {
            connector,
            predicate,
        }
    }

    /// One attempt: fetch `scheme://hostname` and test its lines.
    /// The connection is released before this returns.
    pub fn match_url(&self, scheme: Scheme, hostname: &str) -> Result<bool, FetchError> {
        let url = target_url(scheme, hostname)?;
        read_page(self.connector, &url, |reader| matches(reader, self.predicate))
    }

    /// Classifies `hostname`. Never fails: errors become a `Failed` outcome.
    pub fn resolve(&self, hostname: &str) -> Outcome {
        tracing::info!("processing {}", hostname);
        let https_err = match self.match_url(Scheme::Https, hostname) {
            Ok(true) => return Outcome::matched(hostname),
            Ok(false) => return Outcome::not_matched(hostname),
            Err(e) => e,
        };
        tracing::debug!(hostname, kind = %https_err.kind(), error = %https_err, "https failed, retrying over http");

        match self.match_url(Scheme::Http, hostname) {
            Ok(true) => Outcome::matched(hostname),
            Ok(false) => Outcome::not_matched(hostname),
            Err(http_err) => {
                let diagnostic = failure_diagnostic(Some(&http_err), Some(&https_err));
                tracing::warn!(hostname, kind = %http_err.kind(), "exception searching {}: {}", hostname, diagnostic);
                Outcome::failed(hostname, diagnostic)
            }
        }
    }
}

/// HTTP-attempt message, else HTTPS-attempt message, else `UNKNOWN`.
pub fn failure_diagnostic(http: Option<&FetchError>, https: Option<&FetchError>) -> String {
    http.and_then(FetchError::message)
        .or_else(|| https.and_then(FetchError::message))
        .unwrap_or_else(|| UNKNOWN_DIAGNOSTIC.to_string())
}
