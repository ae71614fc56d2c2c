// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{Post, PostProvider};
use metrics::{counter, describe_counter, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("posts_fetched_total", "Posts returned by the feed provider.");
        describe_counter!(
            "posts_dropped_total",
            "Posts dropped for an empty title after normalization."
        );
        describe_counter!("provider_errors_total", "External fetch/parse errors.");
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Normalize a post title: decode HTML entities, collapse whitespace, trim.
///
/// Punctuation is deliberately left alone — the route extractor's contract
/// keeps everything after the destination arrow verbatim.
pub fn normalize_title(s: &str) -> String {
    let out = html_escape::decode_html_entities(s).to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Fetch one batch of posts and normalize titles. Empty titles are dropped.
///
/// Provider failure propagates as `Err`; the analysis layer turns it into an
/// empty batch plus a user-visible note, never a crash.
pub async fn run_once(provider: &dyn PostProvider, limit: u32) -> anyhow::Result<Vec<Post>> {
    ensure_metrics_described();

    let t0 = std::time::Instant::now();
    let fetched = match provider.fetch_latest(limit).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, provider = provider.name(), "provider error");
            counter!("provider_errors_total").increment(1);
            return Err(e);
        }
    };
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    metrics::histogram!("ingest_fetch_ms").record(ms);

    let mut kept = Vec::with_capacity(fetched.len());
    let mut dropped = 0usize;
    for mut post in fetched {
        post.title = normalize_title(&post.title);
        if post.title.is_empty() {
            dropped += 1;
            continue;
        }
        kept.push(post);
    }

    counter!("posts_fetched_total").increment(kept.len() as u64);
    counter!("posts_dropped_total").increment(dropped as u64);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    Ok(kept)
}

/// Post feed changes by the hour; cache one batch per requested limit.
/// (The feed itself is fixed per provider instance, so `limit` is the whole
/// call signature.)
pub const POSTS_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3_600);

pub struct CachedPostProvider<P> {
    inner: P,
    cache: crate::cache::TtlCache<u32, Vec<Post>>,
}

impl<P: PostProvider> CachedPostProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, POSTS_CACHE_TTL)
    }

    pub fn with_ttl(inner: P, ttl: std::time::Duration) -> Self {
        Self {
            inner,
            cache: crate::cache::TtlCache::new(ttl),
        }
    }
}

#[async_trait::async_trait]
impl<P: PostProvider> PostProvider for CachedPostProvider<P> {
    async fn fetch_latest(&self, limit: u32) -> anyhow::Result<Vec<Post>> {
        if let Some(hit) = self.cache.get(&limit) {
            counter!("posts_cache_hits_total").increment(1);
            return Ok(hit);
        }
        counter!("posts_cache_misses_total").increment(1);
        let fresh = self.inner.fetch_latest(limit).await?;
        self.cache.insert(limit, fresh.clone());
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
