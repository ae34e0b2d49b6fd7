//! Line predicates: the test applied to each decoded body line.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// Test applied to each line of a page body.
pub trait LinePredicate: Send + Sync {
    fn test(&self, line: &str) -> bool;
}

impl<F> LinePredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn test(&self, line: &str) -> bool {
        self(line)
    }
}

/// Case-insensitive pattern that must match an entire line.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&format!("^(?:{})$", source))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid pattern {:?}", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern as given by the user (without anchors).
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl LinePredicate for Pattern {
    fn test(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}
