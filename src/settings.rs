use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Runtime settings. Defaults below, overridable with `AKC_*` environment
/// variables (e.g. `AKC_CONCURRENCY=8`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub cache_path: PathBuf,
    pub cache_ttl_days: i64,
    pub concurrency: usize,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("base_url", "https://www.apps.akc.org")?
            .set_default("cache_path", ".cache/pages.sqlite")?
            .set_default("cache_ttl_days", 30_i64)?
            .set_default("concurrency", 4_i64)?
            .set_default("max_retries", 3_i64)?
            .set_default("backoff_ms", 1000_i64)?
            .add_source(Environment::with_prefix("AKC"))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let s = Settings::load().unwrap();
        assert!(s.base_url.starts_with("https://"));
        assert!(s.concurrency >= 1);
    }
}
