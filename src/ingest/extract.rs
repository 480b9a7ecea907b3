//! Roster extraction from raw OCR lines.
//!
//! OCR output carries merged tokens, stray punctuation, list numbering, and
//! single-glyph debris. Every line is normalized and then checked against a
//! [`NoisePolicy`]; lines that fail are dropped, never reordered. What
//! survives is approximate and should be compared with
//! [`fuzzy_matches`](super::fuzzy::fuzzy_matches), not `==`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::{normalize, NameCandidate};
use super::{IngestError, Result as IngestResult};
use crate::ocr::RawOcrLine;

/// Leading run without any letter or combining mark: bullets, `1.`, `3)`, `_`.
static LEADING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\p{L}\p{M}]+").unwrap());

/// Trailing run without any letter or combining mark: `|`, `~`, ` 12`.
static TRAILING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}]+$").unwrap());

/// Thresholds a line must meet to count as a name.
///
/// Handwriting and print produce different noise, so the numbers are
/// tunable rather than fixed; see [`NoisePolicy::printed`] and
/// [`NoisePolicy::handwriting`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoisePolicy {
    /// Minimum non-whitespace characters
    pub min_chars: usize,
    /// Minimum alphabetic characters
    pub min_alphabetic: usize,
    /// Minimum share of alphabetic characters among non-whitespace ones (0.0-1.0)
    pub min_alphabetic_ratio: f32,
    /// Engine confidence floor (0-100); lines without a confidence always pass
    pub min_confidence: Option<f32>,
    /// Trim letterless runs from both ends before checking content
    pub strip_edge_noise: bool,
}

impl Default for NoisePolicy {
    fn default() -> Self {
        Self::printed()
    }
}

impl NoisePolicy {
    /// Conservative thresholds for printed rosters.
    pub fn printed() -> Self {
        Self {
            min_chars: 2,
            min_alphabetic: 2,
            min_alphabetic_ratio: 0.5,
            min_confidence: None,
            strip_edge_noise: true,
        }
    }

    /// Looser letter ratio; handwriting misreads glyphs inside real names.
    pub fn handwriting() -> Self {
        Self {
            min_alphabetic_ratio: 0.35,
            ..Self::printed()
        }
    }

    /// Reject thresholds outside their ranges; a ratio above 1.0 would drop every line.
    pub fn validate(&self) -> IngestResult<()> {
        if !(0.0..=1.0).contains(&self.min_alphabetic_ratio) {
            return Err(IngestError::InvalidPolicy(format!(
                "min_alphabetic_ratio {} is out of range 0.0..=1.0",
                self.min_alphabetic_ratio
            )));
        }
        if let Some(floor) = self.min_confidence {
            if !(0.0..=100.0).contains(&floor) {
                return Err(IngestError::InvalidPolicy(format!(
                    "min_confidence {floor} is out of range 0..=100"
                )));
            }
        }
        Ok(())
    }
}

/// Why a line was not accepted as a name.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Nothing left after normalization or edge stripping
    Empty,
    /// Engine confidence below the policy floor
    LowConfidence(f32),
    /// Fewer non-whitespace characters than `min_chars`
    TooShort(usize),
    /// Fewer letters than `min_alphabetic`
    TooFewLetters(usize),
    /// Letter share below `min_alphabetic_ratio`
    MostlySymbols(f32),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::LowConfidence(c) => write!(f, "confidence {c:.1} below floor"),
            Self::TooShort(n) => write!(f, "only {n} characters"),
            Self::TooFewLetters(n) => write!(f, "only {n} letters"),
            Self::MostlySymbols(r) => write!(f, "letter ratio {r:.2} too low"),
        }
    }
}

/// A dropped OCR line and the reason it was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub text: String,
    pub reason: RejectReason,
}

/// Accepted names plus everything that was filtered out.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub names: Vec<NameCandidate>,
    pub rejected: Vec<Rejection>,
}

/// Keep the lines that look like names, in engine order.
pub fn extract_names(lines: &[RawOcrLine], policy: &NoisePolicy) -> Vec<NameCandidate> {
    extract_with_report(lines, policy).names
}

/// Like [`extract_names`], also returning each rejected line with its reason.
pub fn extract_with_report(lines: &[RawOcrLine], policy: &NoisePolicy) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for line in lines {
        match screen_line(line, policy) {
            Ok(name) => report.names.push(name),
            Err(reason) => {
                debug!("dropping OCR line {:?}: {reason}", line.text);
                report.rejected.push(Rejection {
                    text: line.text.clone(),
                    reason,
                });
            }
        }
    }

    report
}

fn screen_line(line: &RawOcrLine, policy: &NoisePolicy) -> Result<NameCandidate, RejectReason> {
    let name = normalize(&line.text).ok_or(RejectReason::Empty)?;

    if let (Some(floor), Some(confidence)) = (policy.min_confidence, line.confidence) {
        if confidence < floor {
            return Err(RejectReason::LowConfidence(confidence));
        }
    }

    let name = if policy.strip_edge_noise {
        normalize(strip_edge_noise(name.as_str())).ok_or(RejectReason::Empty)?
    } else {
        name
    };

    check_content(name.as_str(), policy)?;
    Ok(name)
}

/// Trim letterless runs from both ends, keeping an abbreviation point (`Jr.`).
fn strip_edge_noise(text: &str) -> &str {
    let text = LEADING_NOISE.find(text).map_or(text, |m| &text[m.end()..]);

    match TRAILING_NOISE.find(text) {
        Some(m) if m.start() > 0 && m.as_str().starts_with('.') => &text[..=m.start()],
        Some(m) => &text[..m.start()],
        None => text,
    }
}

fn check_content(text: &str, policy: &NoisePolicy) -> Result<(), RejectReason> {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    if visible < policy.min_chars {
        return Err(RejectReason::TooShort(visible));
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters < policy.min_alphabetic {
        return Err(RejectReason::TooFewLetters(letters));
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = letters as f32 / visible as f32;
    if ratio < policy.min_alphabetic_ratio {
        return Err(RejectReason::MostlySymbols(ratio));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<RawOcrLine> {
        texts.iter().map(|t| RawOcrLine::new(*t)).collect()
    }

    fn names(texts: &[&str], policy: &NoisePolicy) -> Vec<String> {
        extract_names(&lines(texts), policy)
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn keeps_clean_names_in_engine_order() {
        let got = names(&["Mike Johnson", "Jane Smith", "John Doe"], &NoisePolicy::default());
        assert_eq!(got, ["Mike Johnson", "Jane Smith", "John Doe"]);
    }

    #[test]
    fn drops_blank_punctuation_and_single_glyphs() {
        let got = names(
            &["", "   ", "---", "|", "x", "..,;", "John Doe", "7", "~ ~"],
            &NoisePolicy::default(),
        );
        assert_eq!(got, ["John Doe"]);
    }

    #[test]
    fn strips_list_numbering_and_edge_debris() {
        let got = names(
            &["1. John Doe", "2) Jane Smith |", "• Mike Johnson", "_Ana Lee~"],
            &NoisePolicy::default(),
        );
        assert_eq!(got, ["John Doe", "Jane Smith", "Mike Johnson", "Ana Lee"]);
    }

    #[test]
    fn keeps_inner_punctuation() {
        let got = names(&["Anne-Marie O'Neil", "J. Smith"], &NoisePolicy::default());
        assert_eq!(got, ["Anne-Marie O'Neil", "J. Smith"]);
    }

    #[test]
    fn edge_stripping_can_be_disabled() {
        let policy = NoisePolicy {
            strip_edge_noise: false,
            ..NoisePolicy::default()
        };
        assert_eq!(names(&["1. John Doe"], &policy), ["1. John Doe"]);
    }

    #[test]
    fn collapses_spacing_irregularities() {
        let got = names(&["  Jane    Smith  "], &NoisePolicy::default());
        assert_eq!(got, ["Jane Smith"]);
    }

    #[test]
    fn rejects_lines_dominated_by_symbols() {
        let policy = NoisePolicy {
            strip_edge_noise: false,
            ..NoisePolicy::default()
        };
        let report = extract_with_report(&lines(&["a#$%&*b"]), &policy);
        assert!(report.names.is_empty());
        assert!(matches!(report.rejected[0].reason, RejectReason::MostlySymbols(_)));
    }

    #[test]
    fn handwriting_policy_keeps_what_printed_drops() {
        // 5 letters out of 11 visible characters
        let misread = ["M1k3 J0#n50n"];
        assert!(names(&misread, &NoisePolicy::printed()).is_empty());
        assert_eq!(names(&misread, &NoisePolicy::handwriting()), ["M1k3 J0#n50n"]);
    }

    #[test]
    fn combining_marks_survive_edge_stripping() {
        let got = names(&["सीता", "Jose\u{301}", "1. Rene\u{301} |"], &NoisePolicy::default());
        assert_eq!(got, ["सीता", "Jose\u{301}", "Rene\u{301}"]);
    }

    #[test]
    fn abbreviation_point_is_kept() {
        let got = names(
            &["Martin Luther King Jr.", "3. Sam Jones Sr. |", "Ana Lee 12."],
            &NoisePolicy::default(),
        );
        assert_eq!(got, ["Martin Luther King Jr.", "Sam Jones Sr.", "Ana Lee"]);
    }

    #[test]
    fn validate_checks_ranges() {
        assert!(NoisePolicy::printed().validate().is_ok());
        assert!(NoisePolicy::handwriting().validate().is_ok());

        let ratio = NoisePolicy {
            min_alphabetic_ratio: 1.5,
            ..NoisePolicy::default()
        };
        assert!(matches!(ratio.validate(), Err(IngestError::InvalidPolicy(_))));

        let confidence = NoisePolicy {
            min_confidence: Some(140.0),
            ..NoisePolicy::default()
        };
        let err = confidence.validate().unwrap_err();
        assert!(err.to_string().contains("min_confidence"));
    }

    #[test]
    fn confidence_floor_applies_only_to_scored_lines() {
        let policy = NoisePolicy {
            min_confidence: Some(60.0),
            ..NoisePolicy::default()
        };
        let input = vec![
            RawOcrLine::new("John Doe").with_confidence(92.0),
            RawOcrLine::new("Jqne Smlth").with_confidence(31.0),
            RawOcrLine::new("Mike Johnson"),
        ];
        let report = extract_with_report(&input, &policy);
        let kept: Vec<&str> = report.names.iter().map(NameCandidate::as_str).collect();
        assert_eq!(kept, ["John Doe", "Mike Johnson"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, RejectReason::LowConfidence(31.0));
    }

    #[test]
    fn report_keeps_original_text_of_rejections() {
        let report = extract_with_report(&lines(&["  ", "§"]), &NoisePolicy::default());
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].reason, RejectReason::Empty);
        assert_eq!(report.rejected[1].text, "§");
        assert_eq!(report.rejected[1].reason, RejectReason::Empty);
    }

    #[test]
    fn policy_parses_from_partial_toml() {
        let policy: NoisePolicy = toml::from_str("min_alphabetic = 3\nmin_confidence = 50.0").unwrap();
        assert_eq!(policy.min_alphabetic, 3);
        assert_eq!(policy.min_confidence, Some(50.0));
        assert_eq!(policy.min_chars, 2);
        assert!(policy.strip_edge_noise);
    }

    #[test]
    fn reject_reasons_display() {
        assert_eq!(RejectReason::TooShort(1).to_string(), "only 1 characters");
        assert!(RejectReason::MostlySymbols(0.25).to_string().contains("0.25"));
    }
}
