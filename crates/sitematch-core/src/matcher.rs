//! Lazy line-by-line evaluation of a decoded body.

use std::io::{self, BufRead};

use crate::pattern::LinePredicate;

/// Incremental line reader: splits on `\n`, strips a trailing `\r`, replaces
/// invalid UTF-8. Only one line is buffered at a time.
pub struct TextLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> TextLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Returns true as soon as one line satisfies `predicate`; false once the
/// stream is exhausted. Read errors are returned, never mapped to false.
pub fn matches<R, P>(reader: R, predicate: &P) -> io::Result<bool>
where
    R: BufRead,
    P: LinePredicate + ?Sized,
{
    for line in TextLines::new(reader) {
        if predicate.test(&line?) {
            return Ok(true);
        }
    }
    Ok(false)
}
