// src/config.rs
//! Analysis configuration: feed name, post limit, fuzzy threshold, GDP year.
//! Loaded from TOML with env overrides; every knob is clamped to its
//! documented range so a bad value degrades to the nearest legal one instead
//! of failing the request.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "ANALYSIS_CONFIG_PATH";
pub const ENV_POST_LIMIT: &str = "ANALYSIS_POST_LIMIT";
pub const ENV_FUZZY_THRESHOLD: &str = "ANALYSIS_FUZZY_THRESHOLD";
pub const ENV_GDP_YEAR: &str = "ANALYSIS_GDP_YEAR";

pub const DEFAULT_CONFIG_PATH: &str = "config/analysis.toml";

pub const DEFAULT_FEED: &str = "IWantOut";
pub const DEFAULT_POST_LIMIT: u32 = 500;
pub const DEFAULT_FUZZY_THRESHOLD: u8 = 80;
pub const DEFAULT_GDP_YEAR: i32 = 2022;

pub const POST_LIMIT_RANGE: (u32, u32) = (100, 1_000);
pub const FUZZY_THRESHOLD_RANGE: (u8, u8) = (60, 100);
pub const GDP_YEAR_RANGE: (i32, i32) = (2016, 2022);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub feed: String,
    pub post_limit: u32,
    pub fuzzy_threshold: u8,
    pub gdp_year: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            feed: DEFAULT_FEED.to_string(),
            post_limit: DEFAULT_POST_LIMIT,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            gdp_year: DEFAULT_GDP_YEAR,
        }
    }
}

impl AnalysisConfig {
    /// Clamp every knob into its legal range.
    pub fn clamped(mut self) -> Self {
        self.post_limit = self.post_limit.clamp(POST_LIMIT_RANGE.0, POST_LIMIT_RANGE.1);
        self.fuzzy_threshold = self
            .fuzzy_threshold
            .clamp(FUZZY_THRESHOLD_RANGE.0, FUZZY_THRESHOLD_RANGE.1);
        self.gdp_year = self.gdp_year.clamp(GDP_YEAR_RANGE.0, GDP_YEAR_RANGE.1);
        self
    }

    /// Return a copy with per-request overrides applied, then clamped.
    pub fn with_overrides(
        &self,
        limit: Option<u32>,
        threshold: Option<u8>,
        year: Option<i32>,
    ) -> Self {
        let mut cfg = self.clone();
        if let Some(l) = limit {
            cfg.post_limit = l;
        }
        if let Some(t) = threshold {
            cfg.fuzzy_threshold = t;
        }
        if let Some(y) = year {
            cfg.gdp_year = y;
        }
        cfg.clamped()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading analysis config from {}", path.display()))?;
        let cfg: AnalysisConfig = toml::from_str(&content).context("parsing analysis config")?;
        Ok(cfg.clamped())
    }

    /// Load order: $ANALYSIS_CONFIG_PATH, then config/analysis.toml, then
    /// built-in defaults; individual env vars override whatever loaded.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            Self::from_toml_file(&PathBuf::from(p))?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::from_toml_file(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Some(v) = parse_env::<u32>(ENV_POST_LIMIT) {
            cfg.post_limit = v;
        }
        if let Some(v) = parse_env::<u8>(ENV_FUZZY_THRESHOLD) {
            cfg.fuzzy_threshold = v;
        }
        if let Some(v) = parse_env::<i32>(ENV_GDP_YEAR) {
            cfg.gdp_year = v;
        }

        Ok(cfg.clamped())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
