//! Name ingestion pipeline
//!
//! Two producers of the same output, an ordered `Vec<NameCandidate>`:
//! - Manual text: [`tokenize`] → [`normalize`] (pure, synchronous)
//! - Roster photo: [`OcrEngine`] → [`extract_names`] (async, one engine call)
//!
//! Duplicates are kept. Deduplicating against an existing roster is the
//! caller's job.

pub mod extract;
pub mod fuzzy;
pub mod normalize;
pub mod tokenize;

use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::ocr::{EngineConfig, OcrEngine, OcrError};

pub use extract::{extract_names, extract_with_report, ExtractionReport, NoisePolicy, RejectReason, Rejection};
pub use fuzzy::{fuzzy_matches, missing, recall};
pub use normalize::{normalize, NameCandidate};
pub use tokenize::tokenize;

/// Ingestion errors
///
/// Manual text never fails. "No names found" is `Ok(vec![])`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] OcrError),

    #[error("invalid noise policy: {0}")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Candidates typed by hand, in input order.
pub fn from_manual_text(raw: &str) -> Vec<NameCandidate> {
    tokenize(raw)
}

/// Entry point shared by both ingestion sources.
///
/// Holds the OCR engine and the noise policy; calls share no mutable state
/// and may run concurrently.
pub struct Ingestor<E> {
    engine: E,
    policy: NoisePolicy,
}

impl<E: OcrEngine> Ingestor<E> {
    /// Ingestor with the default (printed roster) noise policy.
    pub fn new(engine: E) -> Self {
        Self::with_policy(engine, NoisePolicy::default())
    }

    pub fn with_policy(engine: E, policy: NoisePolicy) -> Self {
        Self { engine, policy }
    }

    pub fn policy(&self) -> &NoisePolicy {
        &self.policy
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Candidates typed by hand. Never touches the engine.
    pub fn from_manual_text(&self, raw: &str) -> Vec<NameCandidate> {
        from_manual_text(raw)
    }

    /// Candidates read from a roster photo.
    pub async fn from_image(&self, image: &[u8], config: &EngineConfig) -> Result<Vec<NameCandidate>> {
        Ok(self.from_image_with_report(image, config).await?.names)
    }

    /// Like [`Ingestor::from_image`], keeping the rejected lines for diagnostics.
    pub async fn from_image_with_report(
        &self,
        image: &[u8],
        config: &EngineConfig,
    ) -> Result<ExtractionReport> {
        let start = Instant::now();

        let lines = self.engine.recognize(image, config).await.map_err(|e| {
            warn!("{} could not process image: {e}", self.engine.name());
            IngestError::ExtractionFailed(e)
        })?;
        let report = extract_with_report(&lines, &self.policy);

        info!(
            "{}: {} lines → {} names ({} rejected) in {:.0}ms",
            self.engine.name(),
            lines.len(),
            report.names.len(),
            report.rejected.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(report)
    }

    /// Run several image extractions concurrently, one result per image in input order.
    ///
    /// Each image succeeds or fails on its own.
    pub async fn from_images(
        &self,
        images: &[&[u8]],
        config: &EngineConfig,
    ) -> Vec<Result<Vec<NameCandidate>>> {
        let jobs = images.iter().map(|image| self.from_image(image, config));
        futures::future::join_all(jobs).await
    }
}
