//! OCR adapter layer
//!
//! Wraps an external text-recognition engine behind the async [`OcrEngine`]
//! trait. Adapters only report what the engine saw: they construct the
//! invocation from an [`EngineConfig`], await it, and turn the engine's
//! structured output into [`RawOcrLine`]s. Deciding which lines are names
//! happens later, in [`crate::ingest::extract`].
//!
//! Engines:
//! - [`TesseractEngine`]: `tesseract` worker process, TSV output
//! - [`SerializedEngine`]: limits concurrent calls into a wrapped engine

pub mod serialized;
pub mod tesseract;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use serialized::SerializedEngine;
pub use tesseract::TesseractEngine;

/// Highest page segmentation mode tesseract accepts.
pub const MAX_PAGE_SEGMENTATION_MODE: u8 = 13;

/// OCR engine errors
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("failed to start OCR worker {worker}: {source}")]
    Spawn {
        worker: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    #[error("unreadable OCR output: {0}")]
    Output(String),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("OCR worker pool is closed")]
    WorkerClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;

/// One line of text as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOcrLine {
    pub text: String,
    /// Engine confidence, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RawOcrLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// How to reach the recognition engine.
///
/// Passed through to the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker binary (bare name is resolved through `PATH`)
    pub worker: PathBuf,
    /// Recognition language, e.g. `eng` or `eng+deu`
    pub language: String,
    /// Page segmentation mode (tesseract `--psm`)
    pub psm: u8,
    /// Trained-data directory, when not the engine's built-in location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Extra arguments appended to the engine command line
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            // Single uniform block of text: one name per line on a roster sheet.
            psm: 6,
            data_dir: None,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Reject configs no engine could run.
    pub fn validate(&self) -> Result<()> {
        if self.worker.as_os_str().is_empty() {
            return Err(OcrError::InvalidConfig("worker path is empty".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(OcrError::InvalidConfig("language is empty".to_string()));
        }
        if self.psm > MAX_PAGE_SEGMENTATION_MODE {
            return Err(OcrError::InvalidConfig(format!(
                "page segmentation mode {} is out of range 0..={MAX_PAGE_SEGMENTATION_MODE}",
                self.psm
            )));
        }
        Ok(())
    }
}

/// A text-recognition engine.
///
/// One call is one all-or-nothing recognition: either every detected line
/// or an error. Dropping the returned future abandons the call.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine identifier used in logs.
    fn name(&self) -> &str;

    /// Recognize text lines in an encoded raster image.
    async fn recognize(&self, image: &[u8], config: &EngineConfig) -> Result<Vec<RawOcrLine>>;
}

#[async_trait]
impl<E: OcrEngine + ?Sized> OcrEngine for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn recognize(&self, image: &[u8], config: &EngineConfig) -> Result<Vec<RawOcrLine>> {
        (**self).recognize(image, config).await
    }
}
