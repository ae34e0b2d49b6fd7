//! CLI for sitematch.

mod commands;

use anyhow::Result;
use clap::Parser;
use sitematch_core::config::{self, SiteMatchConfig};
use sitematch_core::scheduler::Strategy;
use std::path::PathBuf;

use commands::run_search;

/// Checks every hostname of a seed list for a homepage line matching PATTERN.
#[derive(Debug, Parser)]
#[command(name = "sitematch")]
#[command(about = "sitematch: concurrent homepage fetch-and-match", long_about = None)]
pub struct Cli {
    /// Line pattern (case-insensitive, must match a whole line). Defaults to the configured pattern.
    pub pattern: Option<String>,

    /// Resolve up to N hostnames at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Process hostnames in batches of N (0 processes nothing).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Seed list location (http, https or file URL).
    #[arg(long, value_name = "URL")]
    pub input: Option<String>,

    /// Result file to write.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Concurrency strategy.
    #[arg(long, value_name = "pool|admission")]
    pub strategy: Option<Strategy>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        cli.apply(&mut cfg);
        tracing::debug!("effective config: {:?}", cfg);
        run_search(cfg).await
    }

    /// Command-line values take precedence over the config file.
    pub fn apply(&self, cfg: &mut SiteMatchConfig) {
        if let Some(pattern) = &self.pattern {
            cfg.pattern = pattern.clone();
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(n) = self.batch_size {
            cfg.batch_size = Some(n);
        }
        if let Some(url) = &self.input {
            cfg.input_url = url.clone();
        }
        if let Some(path) = &self.output {
            cfg.output_path = path.clone();
        }
        if let Some(strategy) = self.strategy {
            cfg.strategy = strategy;
        }
    }
}
