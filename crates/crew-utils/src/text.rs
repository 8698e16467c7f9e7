//! Text tokenization and scoring helpers
//!
//! Used by the knowledge store to rank entries against free-text queries.
//! Scoring is intentionally simple: lowercase alphanumeric tokens and
//! count query-term overlap. Anything smarter belongs in an embedding
//! backend behind the store, not here.

use std::collections::HashSet;

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Score how many distinct query terms appear in the candidate text
///
/// Returns the count of distinct query tokens present in `text`. A score
/// of 0 means no term matched.
pub fn overlap_score(query: &str, text: &str) -> usize {
    let terms: HashSet<String> = tokenize(query).into_iter().collect();
    if terms.is_empty() {
        return 0;
    }
    let corpus: HashSet<String> = tokenize(text).into_iter().collect();
    terms.intersection(&corpus).count()
}
