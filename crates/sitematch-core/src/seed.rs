//! Seed hostname list: fetching and parsing.
//!
//! Expected format (header row, then CSV rows, hostname in the second column):
//!
//! ```text
//! "Rank","URL","Linking Root Domains","External Links","mozRank","mozTrust"
//! 1,"facebook.com/",9616487,1688316928,9.54,9.34
//! 2,"twitter.com/",6454936,2147483647,9.40,9.25
//! ```

use anyhow::{Context, Result};
use std::io::BufRead;

use crate::fetch::{read_resource, Connector};
use crate::matcher::TextLines;

const SEP: char = ',';

/// Parses hostnames from the seed list. The first line is skipped; rows with
/// fewer than two columns are skipped.
pub fn parse_hostnames<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut hostnames = Vec::new();
    for line in TextLines::new(reader).skip(1) {
        let line = line?;
        let mut columns = line.split(SEP);
        let (Some(_), Some(column)) = (columns.next(), columns.next()) else {
            continue;
        };
        match hostname_from_column(column) {
            Some(hostname) => hostnames.push(hostname.to_string()),
            None => tracing::debug!("skipping seed row with empty hostname: {:?}", line),
        }
    }
    Ok(hostnames)
}

/// `"facebook.com/"` -> `facebook.com`: trims, strips the surrounding quotes
/// and at most one trailing slash.
fn hostname_from_column(column: &str) -> Option<&str> {
    let column = column.trim();
    let unquoted = column
        .strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(column);
    let hostname = unquoted.strip_suffix('/').unwrap_or(unquoted).trim();
    if hostname.is_empty() {
        None
    } else {
        Some(hostname)
    }
}

/// Fetches and parses the seed list at `input_url`. An HTTP error status is a
/// failure: the body of an error page is never parsed as hostnames.
pub fn fetch_hostnames(connector: &dyn Connector, input_url: &str) -> Result<Vec<String>> {
    let hostnames = read_resource(connector, input_url, |reader| parse_hostnames(reader))
        .with_context(|| format!("reading urls from {}", input_url))?;
    tracing::info!(count = hostnames.len(), "loaded seed list from {}", input_url);
    Ok(hostnames)
}
