/// Configuration module.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::extract::ExtractionLimits;
use crate::extract::locator::DEFAULT_SELECTORS;
use crate::page::ContentWatcher;

/// Path used when no config file is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Upper bound on reviews drawn per analysis.
pub const MAX_SAMPLE_SIZE: usize = 5;

// ── Default value functions ──────────────────────────────────────────

fn default_selectors() -> Vec<String> {
    DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect()
}

fn default_max_candidates() -> usize {
    10
}

fn default_sample_size() -> usize {
    5
}

fn default_min_review_chars() -> usize {
    20
}

fn default_entry_settle_ms() -> u64 {
    1000
}

fn default_retry_settle_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_target_host() -> String {
    "zomato.com".to_string()
}

fn default_detail_path() -> String {
    "/restaurants/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    concat!("review-sentiment/", env!("CARGO_PKG_VERSION")).to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Structural selectors tried in order before the keyword scans.
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub settle: SettleConfig,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default = "default_min_review_chars")]
    pub min_review_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SettleConfig {
    /// Longest wait for the page to settle before the first extraction pass.
    #[serde(default = "default_entry_settle_ms")]
    pub entry_settle_ms: u64,

    /// Longest wait before the relaxed keyword pass.
    #[serde(default = "default_retry_settle_ms")]
    pub retry_settle_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_target_host")]
    pub target_host: String,

    #[serde(default = "default_detail_path")]
    pub detail_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            selectors: default_selectors(),
            extraction: ExtractionConfig::default(),
            settle: SettleConfig::default(),
            site: SiteConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            sample_size: default_sample_size(),
            min_review_chars: default_min_review_chars(),
        }
    }
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            entry_settle_ms: default_entry_settle_ms(),
            retry_settle_ms: default_retry_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            target_host: default_target_host(),
            detail_path: default_detail_path(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and generates a
    /// template file for the default path only.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let mut cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");

        // An empty list would leave only the keyword scans.
        if cfg.selectors.is_empty() {
            cfg.selectors = default_selectors();
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.extraction.sample_size > 0,
            "extraction.sample_size must be positive"
        );
        anyhow::ensure!(
            self.extraction.sample_size <= MAX_SAMPLE_SIZE,
            "extraction.sample_size must be at most {MAX_SAMPLE_SIZE}"
        );
        anyhow::ensure!(
            self.extraction.max_candidates >= self.extraction.sample_size,
            "extraction.max_candidates must be at least extraction.sample_size"
        );
        anyhow::ensure!(
            self.settle.poll_interval_ms > 0,
            "settle.poll_interval_ms must be positive"
        );
        anyhow::ensure!(self.fetch.timeout_secs > 0, "fetch.timeout_secs must be positive");
        anyhow::ensure!(
            !self.site.target_host.is_empty(),
            "site.target_host must not be empty"
        );
        Ok(())
    }

    #[must_use]
    pub fn limits(&self) -> ExtractionLimits {
        ExtractionLimits {
            max_candidates: self.extraction.max_candidates,
            sample_size: self.extraction.sample_size,
            min_review_chars: self.extraction.min_review_chars,
        }
    }

    /// Watcher bounded by the entry settle time.
    #[must_use]
    pub fn watcher(&self) -> ContentWatcher {
        ContentWatcher::new(
            Duration::from_millis(self.settle.poll_interval_ms),
            Duration::from_millis(self.settle.entry_settle_ms),
        )
    }

    #[must_use]
    pub fn retry_settle(&self) -> Duration {
        Duration::from_millis(self.settle.retry_settle_ms)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
