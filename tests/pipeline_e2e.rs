// tests/pipeline_e2e.rs
//
// Full-pipeline runs against fixture providers: happy path, per-title
// degradation, and both external-failure modes.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use migration_pattern_analyzer::analysis::run_analysis;
use migration_pattern_analyzer::config::AnalysisConfig;
use migration_pattern_analyzer::gdp::{GdpProvider, GdpTable, WorldBankClient};
use migration_pattern_analyzer::ingest::providers::reddit_json::RedditJsonProvider;
use migration_pattern_analyzer::ingest::types::{Post, PostProvider};
use migration_pattern_analyzer::CountryMetricsRow;

const REDDIT_FIXTURE: &str = include_str!("fixtures/reddit_new.json");
const WORLDBANK_FIXTURE: &str = include_str!("fixtures/worldbank_gdp.json");

struct StaticPosts(Vec<Post>);

#[async_trait]
impl PostProvider for StaticPosts {
    async fn fetch_latest(&self, limit: u32) -> Result<Vec<Post>> {
        let mut v = self.0.clone();
        v.truncate(limit as usize);
        Ok(v)
    }
    fn name(&self) -> &'static str {
        "StaticPosts"
    }
}

struct FailingPosts;

#[async_trait]
impl PostProvider for FailingPosts {
    async fn fetch_latest(&self, _limit: u32) -> Result<Vec<Post>> {
        Err(anyhow!("503 from upstream"))
    }
    fn name(&self) -> &'static str {
        "FailingPosts"
    }
}

struct FailingGdp;

#[async_trait]
impl GdpProvider for FailingGdp {
    async fn fetch(&self, _year: i32) -> Result<GdpTable> {
        Err(anyhow!("rate limited"))
    }
    fn name(&self) -> &'static str {
        "FailingGdp"
    }
}

struct StaticGdp(GdpTable);

#[async_trait]
impl GdpProvider for StaticGdp {
    async fn fetch(&self, _year: i32) -> Result<GdpTable> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "StaticGdp"
    }
}

fn posts_of(titles: &[&str]) -> Vec<Post> {
    titles
        .iter()
        .enumerate()
        .map(|(i, t)| Post {
            title: t.to_string(),
            created_at: 1_700_000_000 + i as u64,
            score: 1,
            url: format!("https://reddit.com/r/IWantOut/{i}"),
        })
        .collect()
}

fn gdp_of(entries: &[(&str, f64)]) -> GdpTable {
    GdpTable {
        countries: entries.iter().map(|(n, _)| n.to_string()).collect(),
        by_country: entries
            .iter()
            .map(|(n, v)| (n.to_string(), *v))
            .collect::<HashMap<_, _>>(),
    }
}

fn cfg(threshold: u8) -> AnalysisConfig {
    AnalysisConfig {
        fuzzy_threshold: threshold,
        ..AnalysisConfig::default()
    }
}

fn by_name(rows: &[CountryMetricsRow]) -> HashMap<String, CountryMetricsRow> {
    rows.iter().map(|r| (r.country.clone(), r.clone())).collect()
}

#[tokio::test]
async fn reference_scenario_matches_expected_rows() {
    let posts = StaticPosts(posts_of(&[
        "Germany -> Canada",
        "Germany -> USA",
        "France -> Canada",
    ]));
    let gdp = StaticGdp(gdp_of(&[
        ("Germany", 48_000.0),
        ("Canada", 52_000.0),
        ("France", 44_000.0),
        ("USA", 76_000.0),
    ]));

    let out = run_analysis(&posts, &gdp, &cfg(80)).await;
    assert!(out.notes.is_empty());
    assert_eq!(out.pair_count, 3);
    assert_eq!(out.rows.len(), 4);

    let rows = by_name(&out.rows);
    assert_eq!(rows["Germany"].leaving_mentions, 2);
    assert_eq!(rows["Germany"].moving_to_mentions, 0);
    assert_eq!(rows["Germany"].gdp_per_capita, Some(48_000.0));
    assert_eq!(rows["Canada"].moving_to_mentions, 2);
    assert_eq!(rows["France"].leaving_mentions, 1);
    assert_eq!(rows["USA"].moving_to_mentions, 1);
    assert_eq!(rows["USA"].gdp_per_capita, Some(76_000.0));
}

#[tokio::test]
async fn fixture_feed_against_fixture_dataset() {
    let posts = RedditJsonProvider::from_fixture_str("IWantOut", REDDIT_FIXTURE);
    let gdp = WorldBankClient::from_fixture_str(WORLDBANK_FIXTURE);

    // Threshold 60 lets "USA" reach "United States" under World Bank naming.
    let out = run_analysis(&posts, &gdp, &cfg(60)).await;
    assert!(out.notes.is_empty());
    assert_eq!(out.posts.len(), 5);
    assert_eq!(out.pair_count, 4);

    let rows = by_name(&out.rows);
    assert_eq!(rows["Germany"].leaving_mentions, 2);
    // Three titles point at Canada, including "Canada, need advice".
    assert_eq!(rows["Canada"].moving_to_mentions, 3);
    assert_eq!(rows["United States"].moving_to_mentions, 1);
    assert_eq!(rows["United States"].gdp_per_capita, Some(76_329.58));
    // "US" as a source is below threshold even at 60; no mention is counted
    // for it and no extra row appears.
    assert_eq!(out.rows.len(), 4);
}

#[tokio::test]
async fn stricter_threshold_drops_the_loose_match() {
    let posts = RedditJsonProvider::from_fixture_str("IWantOut", REDDIT_FIXTURE);
    let gdp = WorldBankClient::from_fixture_str(WORLDBANK_FIXTURE);

    let out = run_analysis(&posts, &gdp, &cfg(95)).await;
    let rows = by_name(&out.rows);
    assert!(!rows.contains_key("United States"));
    assert_eq!(rows["Germany"].leaving_mentions, 2);
}

#[tokio::test]
async fn failed_post_fetch_degrades_to_empty_table_with_note() {
    let gdp = StaticGdp(gdp_of(&[("Germany", 48_000.0)]));
    let out = run_analysis(&FailingPosts, &gdp, &cfg(80)).await;

    assert!(out.rows.is_empty());
    assert!(out.posts.is_empty());
    assert_eq!(out.notes.len(), 1);
    assert!(out.notes[0].contains("Unable to fetch posts"));
}

#[tokio::test]
async fn failed_gdp_fetch_keeps_mentions_and_drops_values() {
    let posts = StaticPosts(posts_of(&["Germany -> Canada"]));
    let out = run_analysis(&posts, &FailingGdp, &cfg(80)).await;

    assert_eq!(out.notes.len(), 1);
    assert!(out.notes[0].contains("GDP per capita"));

    // The embedded fallback universe still normalizes both tokens.
    let rows = by_name(&out.rows);
    assert_eq!(rows["Germany"].leaving_mentions, 1);
    assert_eq!(rows["Germany"].gdp_per_capita, None);
    assert_eq!(rows["Canada"].moving_to_mentions, 1);
    assert_eq!(rows["Canada"].gdp_per_capita, None);
}

#[tokio::test]
async fn running_twice_is_deterministic() {
    let posts = RedditJsonProvider::from_fixture_str("IWantOut", REDDIT_FIXTURE);
    let gdp = WorldBankClient::from_fixture_str(WORLDBANK_FIXTURE);

    let a = run_analysis(&posts, &gdp, &cfg(80)).await;
    let b = run_analysis(&posts, &gdp, &cfg(80)).await;
    assert_eq!(a.rows, b.rows);
    assert_eq!(a.pair_count, b.pair_count);
}
