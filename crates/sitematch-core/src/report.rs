//! Result file: header line plus one line per outcome.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::aggregate::Outcome;

pub const HEADER: &str = "url, match_result, error_message";

/// `<hostname>, <CLASSIFICATION>, <diagnostic-or-empty>\n`
pub fn format_line(outcome: &Outcome) -> String {
    format!(
        "{}, {}, {}\n",
        outcome.hostname,
        outcome.classification.as_str(),
        outcome.diagnostic.as_deref().unwrap_or("")
    )
}

/// Writes outcomes in arrival order. Owned by a single writer task.
pub struct ResultWriter<W: Write> {
    out: W,
    written: usize,
}

impl ResultWriter<BufWriter<File>> {
    /// Creates (truncates) the file at `path` and writes the header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("opening output file {}", path.display()))?;
        let writer = Self::new(BufWriter::new(file))
            .with_context(|| format!("writing header to {}", path.display()))?;
        Ok(writer)
    }
}

impl<W: Write> ResultWriter<W> {
    /// Wraps `out` and writes the header line.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", HEADER)?;
        Ok(Self { out, written: 0 })
    }

    pub fn write_outcome(&mut self, outcome: &Outcome) -> io::Result<()> {
        self.out.write_all(format_line(outcome).as_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Outcome lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
