//! # Country-Pair Extractor
//! Pure title parser: finds the "origin -> destination" shape that r/IWantOut
//! titles follow and returns the two raw spans. No I/O, no state.
//!
//! The pattern is deliberately loose. The origin span accepts letters and
//! whitespace only, so digits or punctuation before the arrow truncate it
//! (garbage like "yo Germany" is possible and left for the normalizer to
//! reject). The destination takes the remainder of the title verbatim,
//! trailing words and punctuation included.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Raw route extracted from a single title. Spans are trimmed but otherwise
/// untouched; neither is guaranteed to be a real country name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedPair {
    pub source_raw: String,
    pub destination_raw: String,
}

static ROUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i).*?([a-z\s]+)\s*-+>\s*(.+)").expect("route regex"));

/// Try to extract an "A -> B" route from a title.
///
/// The separator is one or more hyphens followed by `>`. Only the first
/// arrow is considered; later arrows end up inside the destination span.
/// Returns `None` when the shape is absent or either trimmed span is empty.
pub fn extract_route(title: &str) -> Option<ExtractedPair> {
    let caps = ROUTE_RE.captures(title)?;
    let source_raw = caps.get(1)?.as_str().trim().to_string();
    let destination_raw = caps.get(2)?.as_str().trim().to_string();
    if source_raw.is_empty() || destination_raw.is_empty() {
        return None;
    }
    Some(ExtractedPair {
        source_raw,
        destination_raw,
    })
}
