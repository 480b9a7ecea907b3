//! Approximate name matching for OCR output.
//!
//! Recognition is never byte-exact, so a found candidate matches an expected
//! name when either contains the other, ignoring case. `"John Doe"` matches
//! `"JOHN DOE 12"` and `"john"`.

/// Case-insensitive containment in either direction. Blank strings never match.
pub fn fuzzy_matches(found: &str, expected: &str) -> bool {
    let found = found.trim().to_lowercase();
    let expected = expected.trim().to_lowercase();

    if found.is_empty() || expected.is_empty() {
        return false;
    }

    found.contains(&expected) || expected.contains(&found)
}

/// Number of `expected` names matched by at least one `found` candidate.
pub fn recall<F, E>(found: &[F], expected: &[E]) -> usize
where
    F: AsRef<str>,
    E: AsRef<str>,
{
    expected
        .iter()
        .filter(|e| found.iter().any(|f| fuzzy_matches(f.as_ref(), e.as_ref())))
        .count()
}

/// Expected names with no fuzzy match among `found`, in input order.
pub fn missing<'a, F, E>(found: &[F], expected: &'a [E]) -> Vec<&'a str>
where
    F: AsRef<str>,
    E: AsRef<str>,
{
    expected
        .iter()
        .map(|e| e.as_ref())
        .filter(|e| !found.iter().any(|f| fuzzy_matches(f.as_ref(), e)))
        .collect()
}
