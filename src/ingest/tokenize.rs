//! Multi-delimiter tokenizer for manually typed rosters.
//!
//! Commas and backticks both separate names, and may be mixed within one
//! input. Blank segments left by doubled or trailing separators are dropped.

use super::normalize::{normalize, NameCandidate};

/// Characters that separate names in manual input.
pub const DELIMITERS: [char; 2] = [',', '`'];

/// Split raw manual input into normalized name candidates, in input order.
///
/// Input without any delimiter yields at most one candidate.
pub fn tokenize(raw: &str) -> Vec<NameCandidate> {
    raw.split(DELIMITERS).filter_map(normalize).collect()
}
