//! Response body decoding by declared `Content-Encoding`.

use flate2::read::{DeflateDecoder, MultiGzDecoder};
use std::io::{BufRead, BufReader, Read};

/// Encoding recognized from a `Content-Encoding` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    /// Raw deflate stream (no zlib header).
    Deflate,
    Identity,
}

impl ContentEncoding {
    /// Maps a header value to an encoding; anything unrecognized passes through.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("gzip") => ContentEncoding::Gzip,
            Some(v) if v.eq_ignore_ascii_case("deflate") => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Wraps a raw body in the decoder selected by `encoding`.
///
/// Decompression happens lazily as the returned reader is consumed; corrupt
/// compressed data surfaces as an `io::Error` from the read that hits it.
pub fn decode<'a, R>(encoding: Option<&str>, raw: R) -> Box<dyn BufRead + 'a>
where
    R: Read + 'a,
{
    match ContentEncoding::from_header(encoding) {
        ContentEncoding::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(raw))),
        ContentEncoding::Deflate => Box::new(BufReader::new(DeflateDecoder::new(raw))),
        ContentEncoding::Identity => Box::new(BufReader::new(raw)),
    }
}
