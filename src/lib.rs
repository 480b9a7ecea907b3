//! `roster-ingest` - Player name ingestion for roster management
//!
//! # Features
//!
//! - **Manual entry**: comma- or backtick-separated lists, whitespace cleaned up
//! - **Roster photos**: text recognition through an external OCR engine
//! - **Noise filtering**: tunable policy for printed and handwritten rosters
//! - **Fuzzy checks**: containment matching for approximate OCR output
//!
//! # Example
//!
//! ```rust,no_run
//! use roster_ingest::{EngineConfig, Ingestor, TesseractEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ingest = Ingestor::new(TesseractEngine::new());
//!
//!     let typed = ingest.from_manual_text("John Doe, Jane Smith`Mike Johnson");
//!     println!("{} names typed", typed.len());
//!
//!     let photo = std::fs::read("roster.png")?;
//!     let names = ingest.from_image(&photo, &EngineConfig::default()).await?;
//!     for name in names {
//!         println!("{name}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ingest;
pub mod ocr;

pub use config::{AppConfig, EngineSettings};
pub use ingest::{
    extract_names, from_manual_text, fuzzy_matches, missing, normalize, recall, tokenize, IngestError, Ingestor,
    NameCandidate, NoisePolicy,
};
pub use ocr::{EngineConfig, OcrEngine, OcrError, RawOcrLine, SerializedEngine, TesseractEngine};

/// Version of roster-ingest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
