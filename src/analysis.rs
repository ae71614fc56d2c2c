//! # Analysis Pipeline
//! One full batch transformation per request: fetch posts, extract routes,
//! normalize country tokens in two passes (batch variants, then the GDP
//! dataset's naming), count mentions, left-join GDP values.
//!
//! Every external failure degrades: a failed post fetch yields an empty
//! batch, a failed GDP fetch yields the embedded country universe with no
//! values. Both leave a user-visible note for the UI; nothing here can take
//! the process down.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::aggregate::{aggregate, CountryMetricsRow, NormalizedPair};
use crate::config::AnalysisConfig;
use crate::extract::extract_route;
use crate::gdp::{GdpProvider, GdpTable, GDP_PER_CAPITA_LABEL};
use crate::ingest::types::{Post, PostProvider};
use crate::normalize::{best_match, merge_batch_variants};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analysis_requests_total", "Full analysis runs.");
        describe_counter!("pairs_extracted_total", "Titles with a route shape.");
        describe_counter!(
            "tokens_unmatched_total",
            "Country tokens below the fuzzy threshold."
        );
        describe_histogram!("analysis_duration_ms", "Wall time of one analysis run.");
    });
}

/// Result of one analysis run, consumed by the HTTP layer.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub rows: Vec<CountryMetricsRow>,
    pub posts: Vec<Post>,
    /// Titles that produced a route pair.
    pub pair_count: usize,
    /// User-visible degradation messages (failed external calls).
    pub notes: Vec<String>,
}

/// Run the whole pipeline once. Pure given its two providers.
pub async fn run_analysis(
    posts_provider: &dyn PostProvider,
    gdp_provider: &dyn GdpProvider,
    cfg: &AnalysisConfig,
) -> AnalysisOutcome {
    ensure_metrics_described();
    counter!("analysis_requests_total").increment(1);
    let t0 = std::time::Instant::now();

    let mut notes = Vec::new();

    // The two external calls have no data dependency; issue them together.
    let (posts_res, gdp_res) = tokio::join!(
        crate::ingest::run_once(posts_provider, cfg.post_limit),
        gdp_provider.fetch(cfg.gdp_year)
    );

    let posts = match posts_res {
        Ok(v) => v,
        Err(e) => {
            notes.push(format!(
                "Unable to fetch posts from r/{}: {e:#}",
                cfg.feed
            ));
            Vec::new()
        }
    };

    let gdp = match gdp_res {
        Ok(t) => t,
        Err(e) => {
            notes.push(format!(
                "Unable to fetch {GDP_PER_CAPITA_LABEL} for {}: {e:#}",
                cfg.gdp_year
            ));
            GdpTable::fallback()
        }
    };

    let (rows, pair_count) = analyze_posts(&posts, &gdp, cfg.fuzzy_threshold);

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("analysis_duration_ms").record(ms);
    info!(
        posts = posts.len(),
        pairs = pair_count,
        rows = rows.len(),
        notes = notes.len(),
        "analysis run finished"
    );

    AnalysisOutcome {
        rows,
        posts,
        pair_count,
        notes,
    }
}

/// The pure core: titles + GDP snapshot -> (metrics table, extracted-pair
/// count).
pub fn analyze_posts(
    posts: &[Post],
    gdp: &GdpTable,
    threshold: u8,
) -> (Vec<CountryMetricsRow>, usize) {
    let extracted: Vec<_> = posts
        .iter()
        .filter_map(|p| extract_route(&p.title))
        .collect();
    counter!("pairs_extracted_total").increment(extracted.len() as u64);

    // Pass 1: merge spelling variants that co-occur in this batch.
    let tokens: Vec<String> = extracted
        .iter()
        .flat_map(|p| [p.source_raw.clone(), p.destination_raw.clone()])
        .collect();
    let merged = merge_batch_variants(&tokens, threshold);

    // Pass 2: map each merged token onto the GDP dataset's naming.
    let universe: Vec<&str> = gdp.countries.iter().map(String::as_str).collect();
    let canonicalize = |raw: &str| -> Option<String> {
        let merged_token = merged.get(raw).map(String::as_str).unwrap_or(raw);
        match best_match(merged_token, universe.iter().copied(), threshold) {
            Some(name) => Some(name.to_string()),
            None => {
                counter!("tokens_unmatched_total").increment(1);
                dev_log_unmatched(merged_token);
                None
            }
        }
    };

    let pairs: Vec<NormalizedPair> = extracted
        .iter()
        .map(|p| NormalizedPair {
            source: canonicalize(&p.source_raw),
            destination: canonicalize(&p.destination_raw),
        })
        .collect();

    (aggregate(&pairs, gdp), extracted.len())
}

/// Anonymized dev logging of rejected tokens. Raw tokens come from post
/// titles, so only a short hash is logged; enable with MIGRATION_DEV_LOG=1
/// in a dev environment.
fn dev_log_unmatched(token: &str) {
    if !dev_logging_enabled() {
        return;
    }
    info!(target: "normalize", id = %anon_hash(token), "token below threshold");
}

pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("MIGRATION_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
