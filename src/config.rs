//! Engine start-up configuration, loaded from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::search::threads::{MAX_THREADS, MIN_THREADS};
use crate::search::time::{DEFAULT_MOVE_OVERHEAD, MAX_MOVE_OVERHEAD_MS};
use crate::search::Tt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hash_mb: usize,
    pub threads: usize,
    pub move_overhead_ms: u64,
    /// Evaluator weights; the built-in network is used when absent.
    pub eval_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            hash_mb: Tt::DEFAULT_MB,
            threads: 1,
            move_overhead_ms: DEFAULT_MOVE_OVERHEAD.as_millis() as u64,
            eval_file: None,
        }
    }
}

impl EngineConfig {
    /// Read a JSON file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config: EngineConfig =
            serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config.clamped())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("failed to write config {}", path.display()))
    }

    /// Bring sizes into the supported ranges.
    pub fn clamped(mut self) -> Self {
        self.hash_mb = self.hash_mb.clamp(Tt::MIN_MB, Tt::MAX_MB);
        self.threads = self.threads.clamp(MIN_THREADS, MAX_THREADS);
        self.move_overhead_ms = self.move_overhead_ms.min(MAX_MOVE_OVERHEAD_MS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "threads": 4 }"#).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.hash_mb, Tt::DEFAULT_MB);
        assert_eq!(config.move_overhead_ms, 100);
        assert!(config.eval_file.is_none());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let config = EngineConfig { hash_mb: 0, threads: 1000, move_overhead_ms: 60_000, ..Default::default() }.clamped();
        assert_eq!(config.hash_mb, Tt::MIN_MB);
        assert_eq!(config.threads, MAX_THREADS);
        assert_eq!(config.move_overhead_ms, MAX_MOVE_OVERHEAD_MS);

        let config: EngineConfig = serde_json::from_str(r#"{ "move_overhead_ms": 99999 }"#).unwrap();
        assert_eq!(config.clamped().move_overhead_ms, MAX_MOVE_OVERHEAD_MS);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("dhouse-config-{}.json", std::process::id()));
        let config = EngineConfig { hash_mb: 64, threads: 2, move_overhead_ms: 30, eval_file: Some("net.bin".into()) };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
