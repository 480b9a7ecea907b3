//! Name normalization shared by manual entry and OCR extraction.
//!
//! A [`NameCandidate`] can only be produced by [`normalize`], so every
//! candidate in the crate is trimmed, non-empty, and has its internal
//! whitespace collapsed to single spaces.

use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// One putative player name.
///
/// Casing is preserved exactly as typed or recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NameCandidate(String);

impl NameCandidate {
    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the candidate and return the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for NameCandidate {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NameCandidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NameCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for NameCandidate {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NameCandidate {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<NameCandidate> for String {
    fn from(candidate: NameCandidate) -> Self {
        candidate.0
    }
}

/// Normalize one raw segment into a candidate.
///
/// Returns `None` when the segment is empty after trimming; callers drop it.
pub fn normalize(segment: &str) -> Option<NameCandidate> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }

    let collapsed = WHITESPACE_RUN.replace_all(trimmed, " ");
    Some(NameCandidate(collapsed.into_owned()))
}
