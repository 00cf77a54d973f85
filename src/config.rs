// src/config.rs
//! Immutable configuration for the harvest pipeline, deduplicator, scorer,
//! and matchers. All knobs have documented defaults; a TOML file can
//! override any subset. Resolution order:
//! 1) `$SHELF_CONFIG_PATH`
//! 2) `config/shelf.toml`
//! 3) built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const ENV_CONFIG_PATH: &str = "SHELF_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/shelf.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShelfConfig {
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl ShelfConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing shelf config TOML")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading shelf config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallback path; defaults when neither exists.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            return Self::load_from(&PathBuf::from(p));
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }
}

/// Timing and retry policy for one harvest run.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Upper bound for one adapter attempt, in seconds.
    #[serde(default = "default_adapter_timeout_secs")]
    pub per_adapter_timeout_secs: u64,
    /// Attempts per adapter before it is marked failed for the run.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between attempts, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Whole-run deadline, in seconds.
    #[serde(default = "default_global_deadline_secs")]
    pub global_deadline_secs: u64,
    /// Discovery cache TTL, in seconds (default 60 minutes).
    #[serde(default = "default_cache_ttl_secs")]
    pub discovery_cache_ttl_secs: u64,
}

fn default_adapter_timeout_secs() -> u64 {
    20
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    250
}
fn default_global_deadline_secs() -> u64 {
    120
}
fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            per_adapter_timeout_secs: default_adapter_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            global_deadline_secs: default_global_deadline_secs(),
            discovery_cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Titles within one origin category at or above this similarity are
    /// duplicates. Normalized Levenshtein ratio in [0,1].
    #[serde(default = "default_title_similarity_threshold")]
    pub title_similarity_threshold: f64,
}

fn default_title_similarity_threshold() -> f64 {
    0.85
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: default_title_similarity_threshold(),
        }
    }
}

/// Weights and cut points for the quality scorer. Dimension maxima sum
/// to 100; difficulty cut points follow the documented defaults
/// (< 40 Beginner, 40..=70 Intermediate, > 70 Advanced).
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_description_max")]
    pub description_max: u8,
    #[serde(default = "default_tech_depth_max")]
    pub tech_depth_max: u8,
    #[serde(default = "default_engagement_max")]
    pub engagement_max: u8,
    #[serde(default = "default_reproducibility_max")]
    pub reproducibility_max: u8,
    /// Engagement sub-score used when an origin exposes no signals.
    #[serde(default = "default_engagement_neutral")]
    pub engagement_neutral: u8,
    /// Scores strictly below this are Beginner.
    #[serde(default = "default_beginner_below")]
    pub beginner_below: u8,
    /// Scores strictly above this are Advanced.
    #[serde(default = "default_advanced_above")]
    pub advanced_above: u8,
}

fn default_description_max() -> u8 {
    30
}
fn default_tech_depth_max() -> u8 {
    25
}
fn default_engagement_max() -> u8 {
    25
}
fn default_reproducibility_max() -> u8 {
    20
}
fn default_engagement_neutral() -> u8 {
    8
}
fn default_beginner_below() -> u8 {
    40
}
fn default_advanced_above() -> u8 {
    70
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            description_max: default_description_max(),
            tech_depth_max: default_tech_depth_max(),
            engagement_max: default_engagement_max(),
            reproducibility_max: default_reproducibility_max(),
            engagement_neutral: default_engagement_neutral(),
            beginner_below: default_beginner_below(),
            advanced_above: default_advanced_above(),
        }
    }
}

impl ScoringConfig {
    pub fn total_max(&self) -> u16 {
        self.description_max as u16
            + self.tech_depth_max as u16
            + self.engagement_max as u16
            + self.reproducibility_max as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sum_to_hundred() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.total_max(), 100);
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let cfg = ShelfConfig::from_toml_str(
            r#"
[dedup]
title_similarity_threshold = 0.9

[harvest]
retry_attempts = 5
"#,
        )
        .unwrap();
        assert!((cfg.dedup.title_similarity_threshold - 0.9).abs() < 1e-9);
        assert_eq!(cfg.harvest.retry_attempts, 5);
        assert_eq!(cfg.harvest.per_adapter_timeout_secs, 20);
        assert_eq!(cfg.scoring.beginner_below, 40);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = ShelfConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.harvest.discovery_cache_ttl_secs, 3600);
        assert!((cfg.dedup.title_similarity_threshold - 0.85).abs() < 1e-9);
    }
}
