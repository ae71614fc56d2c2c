//! # Country Normalizer
//! Fuzzy matching of raw country tokens onto canonical names.
//!
//! Scores are on a 0–100 scale and derive from two views of edit similarity:
//! `strsim::normalized_levenshtein` over the whole strings, and a best-window
//! partial ratio that lets a short token ("USA") score against the closest
//! slice of a longer name ("United States"). The final score is the max of
//! the two. Everything here is pure and deterministic for a fixed reference
//! ordering.

use std::collections::HashMap;

use strsim::normalized_levenshtein;

/// Matching-blocks ratio over characters: `2*M / (len_a + len_b)` where `M`
/// is the length of the longest common subsequence. 0.0..=1.0.
fn match_blocks_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // Classic LCS table, rows rolled. Inputs are country-name sized.
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    let m = prev[b.len()];
    (2 * m) as f64 / (a.len() + b.len()) as f64
}

/// Best score of the shorter string against every same-length window of the
/// longer one.
fn partial_ratio(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }
    let mut best = 0.0f64;
    for start in 0..=(long.len() - short.len()) {
        let window = &long[start..start + short.len()];
        best = best.max(match_blocks_ratio(short, window));
    }
    best
}

/// Similarity between a raw token and a reference name, 0–100.
///
/// Case-insensitive; surrounding whitespace ignored; empty input scores 0.
pub fn similarity(raw: &str, reference: &str) -> u8 {
    let a = raw.trim().to_lowercase();
    let b = reference.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let full = normalized_levenshtein(&a, &b);
    let part = partial_ratio(&a.chars().collect::<Vec<_>>(), &b.chars().collect::<Vec<_>>());
    (full.max(part) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Single best reference for `raw`, accepted only at `threshold` or above.
///
/// Ties keep the earliest reference in iteration order; callers must not rely
/// on tie resolution beyond that.
pub fn best_match<'a, I>(raw: &str, universe: I, threshold: u8) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;
    for reference in universe {
        let score = similarity(raw, reference);
        if score >= threshold && best.map_or(true, |(_, s)| score > s) {
            best = Some((reference, score));
        }
    }
    best.map(|(name, _)| name)
}

/// First normalization pass: collapse spelling variants that co-occur in one
/// batch onto a single representative spelling.
///
/// The representative for each distinct token is the token (itself included)
/// scoring at or above `threshold` with the highest occurrence count;
/// count ties keep the earlier first-seen spelling. Tokens are never dropped
/// by this pass — the second pass against the GDP naming decides that.
pub fn merge_batch_variants(tokens: &[String], threshold: u8) -> HashMap<String, String> {
    // Distinct tokens in first-seen order, with counts.
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        let e = counts.entry(t.as_str()).or_insert(0);
        if *e == 0 {
            order.push(t.as_str());
        }
        *e += 1;
    }

    let mut mapping = HashMap::with_capacity(order.len());
    for &token in &order {
        let mut rep = token;
        let mut rep_count = counts[token];
        for &other in &order {
            if other == token {
                continue;
            }
            if similarity(token, other) >= threshold && counts[other] > rep_count {
                rep = other;
                rep_count = counts[other];
            }
        }
        mapping.insert(token.to_string(), rep.to_string());
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_100() {
        assert_eq!(similarity("Germany", "Germany"), 100);
        assert_eq!(similarity("  canada ", "Canada"), 100);
    }

    #[test]
    fn empty_input_scores_0() {
        assert_eq!(similarity("", "Canada"), 0);
        assert_eq!(similarity("   ", "Canada"), 0);
    }

    #[test]
    fn usa_matches_united_states_at_60_but_not_95() {
        let universe = ["United States", "Canada", "Mexico"];
        assert_eq!(
            best_match("USA", universe.iter().copied(), 60),
            Some("United States")
        );
        assert_eq!(best_match("USA", universe.iter().copied(), 95), None);
    }

    #[test]
    fn small_typos_clear_the_default_threshold() {
        assert!(similarity("Germny", "Germany") >= 80);
        assert!(similarity("Netherland", "Netherlands") >= 80);
    }

    #[test]
    fn unrelated_tokens_stay_below_threshold() {
        assert!(similarity("need advice", "Canada") < 60);
    }

    #[test]
    fn ties_keep_the_earliest_reference() {
        // Both references are equidistant from the token.
        let universe = ["abxd", "abyd"];
        assert_eq!(best_match("abcd", universe.iter().copied(), 60), Some("abxd"));
    }

    #[test]
    fn batch_variants_collapse_onto_the_frequent_spelling() {
        let tokens: Vec<String> = ["Germany", "Germny", "Germany", "France"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = merge_batch_variants(&tokens, 80);
        assert_eq!(map["Germny"], "Germany");
        assert_eq!(map["Germany"], "Germany");
        assert_eq!(map["France"], "France");
    }

    #[test]
    fn batch_merge_never_drops_tokens() {
        let tokens: Vec<String> = ["Narnia", "Mordor"].iter().map(|s| s.to_string()).collect();
        let map = merge_batch_variants(&tokens, 80);
        assert_eq!(map.len(), 2);
        assert_eq!(map["Narnia"], "Narnia");
    }
}
