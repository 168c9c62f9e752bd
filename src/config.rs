// src/config.rs
//! Service configuration: fetch limits and cache policy from the
//! environment, plus optional per-source overrides from a TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::fetch::FetchLimits;

pub const DEFAULT_CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_TARGET_ITEMS: usize = 30;
pub const DEFAULT_MAX_PAGES: usize = 5;

pub const ENV_CACHE_TTL_MS: &str = "NEWSDECK_CACHE_TTL_MS";
pub const ENV_TARGET_ITEMS: &str = "NEWSDECK_TARGET_ITEMS";
pub const ENV_MAX_PAGES: &str = "NEWSDECK_MAX_PAGES";
pub const ENV_REFRESH_TOKEN: &str = "NEWSDECK_REFRESH_TOKEN";
pub const ENV_SOURCES_PATH: &str = "NEWSDECK_SOURCES_PATH";

const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Outer TTL beyond which stale cache is no longer served directly.
    pub cache_ttl_ms: i64,
    pub limits: FetchLimits,
    /// When set, only requests presenting this token in `x-refresh-token`
    /// may force a refresh with `latest`. Unset means open mode.
    pub refresh_token: Option<String>,
    /// Submit cache writes to the runtime instead of awaiting them inline.
    pub defer_cache_writes: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            limits: FetchLimits::default(),
            refresh_token: None,
            defer_cache_writes: true,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(ttl) = parse_env::<i64>(ENV_CACHE_TTL_MS) {
            if ttl > 0 {
                cfg.cache_ttl_ms = ttl;
            }
        }
        if let Some(n) = parse_env::<usize>(ENV_TARGET_ITEMS) {
            if n > 0 {
                cfg.limits.target_items = n;
            }
        }
        if let Some(n) = parse_env::<usize>(ENV_MAX_PAGES) {
            if n > 0 {
                cfg.limits.max_pages = n;
            }
        }
        cfg.refresh_token = std::env::var(ENV_REFRESH_TOKEN)
            .ok()
            .filter(|t| !t.trim().is_empty());
        cfg
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Per-source overrides declared in `config/sources.toml`:
///
/// ```toml
/// [sources.hackernews]
/// interval_ms = 600000
///
/// [aliases]
/// hn = "hackernews"
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub intervals: HashMap<String, i64>,
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: HashMap<String, SourceSection>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SourceSection {
    interval_ms: i64,
}

pub fn load_source_overrides_from(path: &Path) -> Result<SourceOverrides> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources config from {}", path.display()))?;
    parse_source_overrides(&content)
}

/// Load overrides using env var + fallback:
/// 1) $NEWSDECK_SOURCES_PATH
/// 2) config/sources.toml
/// Missing file means no overrides.
pub fn load_source_overrides_default() -> Result<SourceOverrides> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        return load_source_overrides_from(&PathBuf::from(p));
    }
    let default = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default.exists() {
        return load_source_overrides_from(&default);
    }
    Ok(SourceOverrides::default())
}

fn parse_source_overrides(s: &str) -> Result<SourceOverrides> {
    let file: SourcesFile = toml::from_str(s).context("parsing sources config")?;
    Ok(SourceOverrides {
        intervals: file
            .sources
            .into_iter()
            .map(|(id, sec)| (id, sec.interval_ms))
            .collect(),
        aliases: file.aliases,
    })
}
