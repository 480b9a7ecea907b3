//! Application configuration loaded from `~/.config/roster-ingest/config.toml`.
//!
//! ```toml
//! [engine]
//! worker = "/usr/local/bin/tesseract"
//! language = "eng+deu"
//! psm = 4
//! timeout_secs = 30
//! workers = 2
//!
//! [noise]
//! min_alphabetic_ratio = 0.4
//! min_confidence = 55.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::NoisePolicy;
use crate::ocr::EngineConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSettings,
    pub noise: NoisePolicy,
}

/// `[engine]` section: the engine invocation plus how the CLI drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub worker: PathBuf,
    pub language: String,
    pub psm: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub extra_args: Vec<String>,
    /// Per-image recognition timeout
    pub timeout_secs: u64,
    /// Concurrent engine workers (1 = serialized)
    pub workers: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            worker: engine.worker,
            language: engine.language,
            psm: engine.psm,
            data_dir: engine.data_dir,
            extra_args: engine.extra_args,
            timeout_secs: 60,
            workers: 1,
        }
    }
}

impl EngineSettings {
    /// The part of the settings handed to the engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            worker: self.worker.clone(),
            language: self.language.clone(),
            psm: self.psm,
            data_dir: self.data_dir.clone(),
            extra_args: self.extra_args.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML, an engine config that cannot run,
    /// or noise thresholds out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid TOML")?;
        config.engine.engine_config().validate()?;
        config.noise.validate()?;
        Ok(config)
    }
}

/// Return the path to the default config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster-ingest")
        .join("config.toml")
}
