use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FetchOptions;
use crate::scheduler::Strategy;

/// Global configuration loaded from `~/.config/sitematch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMatchConfig {
    /// Location of the seed hostname list (http, https or file URL).
    pub input_url: String,
    /// Result file written for each run.
    pub output_path: PathBuf,
    /// Maximum number of hostnames resolved at once.
    pub concurrency: usize,
    /// Optional batch size; hostnames are processed batch after batch. None = one batch.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Default line pattern (case-insensitive, must match the whole line).
    pub pattern: String,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a transfer that stays below 1 byte/s for this many seconds. None = no stall limit.
    #[serde(default)]
    pub stall_timeout_secs: Option<u64>,
    /// Maximum redirects followed per request.
    pub max_redirects: u32,
    /// Concurrency strategy: "pool" (default) or "admission".
    #[serde(default)]
    pub strategy: Strategy,
}

impl Default for SiteMatchConfig {
    fn default() -> Self {
        Self {
            input_url: "https://s3.amazonaws.com/fieldlens-public/urls.txt".to_string(),
            output_path: PathBuf::from("results.txt"),
            concurrency: 20,
            batch_size: None,
            pattern: ".*about.*".to_string(),
            connect_timeout_secs: 10,
            stall_timeout_secs: None,
            max_redirects: 10,
            strategy: Strategy::Pool,
        }
    }
}

impl SiteMatchConfig {
    /// Concurrency budget, never below 1.
    pub fn budget(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Per-request options for the fetcher.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            stall_timeout: self.stall_timeout_secs.map(Duration::from_secs),
            max_redirects: self.max_redirects,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sitematch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SiteMatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SiteMatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SiteMatchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SiteMatchConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
