use std::collections::BTreeSet;

/// Words too common to carry meaning in similarity comparisons.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "for", "to", "of", "in", "on", "with", "is", "are", "was",
    "be", "it", "this", "that", "we", "our", "at", "by", "from", "as", "into", "when", "should",
];

/// Lowercase and split a text into normalized tokens: alphanumeric runs,
/// at least two characters, stopwords removed. Deterministic.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Normalized tokens as an ordered set, for Jaccard comparisons.
pub fn token_set(text: &str) -> BTreeSet<String> {
    normalize_tokens(text).into_iter().collect()
}

/// Tokens from a file path's segments and stem: `src/auth/session.ts`
/// → {src, auth, session, ts}.
pub fn path_tokens(path: &str) -> BTreeSet<String> {
    path.split(['/', '\\', '.', '-', '_'])
        .map(|s| s.to_lowercase())
        .filter(|s| s.len() >= 2)
        .collect()
}

/// Jaccard index of two sets: |a ∩ b| / |a ∪ b|. Two empty sets score 0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Token count estimate for budget accounting: ~4 characters per token,
/// rounded up. Applied to the serialized form of whatever is budgeted.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
