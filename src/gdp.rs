//! # GDP Lookup
//! World Bank v2 API client for GDP per capita by country and year, plus the
//! TTL-cached wrapper the pipeline consumes. A fetch yields both the
//! dataset's country-name universe (the canonical naming the normalizer
//! joins against) and the value mapping for the requested year; countries
//! with no value that year stay in the universe but carry no value, which is
//! what makes the left join in the aggregator meaningful.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::cache::TtlCache;

/// World Bank indicator code for "GDP per capita, current US$".
pub const GDP_PER_CAPITA_INDICATOR: &str = "NY.GDP.PCAP.CD";

/// Human-readable metric label, used in user-facing notes.
pub const GDP_PER_CAPITA_LABEL: &str = "GDP per capita, current US$";

const WORLD_BANK_BASE: &str = "https://api.worldbank.org/v2";
const PER_PAGE: u32 = 500;

/// Upstream dataset changes at most daily.
pub const GDP_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Snapshot of the dataset for one year.
///
/// `countries` is the full naming universe in dataset order (deduplicated);
/// `by_country` holds only the countries with a value for the year.
#[derive(Debug, Clone, Default)]
pub struct GdpTable {
    pub countries: Vec<String>,
    pub by_country: HashMap<String, f64>,
}

impl GdpTable {
    pub fn value_for(&self, country: &str) -> Option<f64> {
        self.by_country.get(country).copied()
    }

    /// Offline substitute used when the World Bank call fails: the embedded
    /// country list keeps normalization and counting alive, values degrade
    /// to absent.
    pub fn fallback() -> Self {
        static NAMES: Lazy<Vec<String>> = Lazy::new(|| {
            let raw = include_str!("country_names.json");
            serde_json::from_str(raw).expect("valid embedded country list")
        });
        Self {
            countries: NAMES.clone(),
            by_country: HashMap::new(),
        }
    }
}

#[async_trait]
pub trait GdpProvider: Send + Sync {
    /// One GDP-per-capita value per country for `year`; missing values are
    /// dropped, never zero-filled.
    async fn fetch(&self, year: i32) -> Result<GdpTable>;
    fn name(&self) -> &'static str;
}

// --- World Bank response shape ---
// A page is a two-element JSON array: [meta, rows]. Meta field types are not
// stable across the API (per_page arrives as a string on some routes), so
// meta is read loosely.

#[derive(Debug, Deserialize)]
struct WbRow {
    country: WbName,
    value: Option<f64>,
    #[allow(dead_code)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WbName {
    value: String,
}

fn parse_page(body: &str) -> Result<(Vec<WbRow>, u64)> {
    let (meta, rows): (serde_json::Value, Vec<WbRow>) =
        serde_json::from_str(body).context("parsing world bank json page")?;
    let pages = meta.get("pages").and_then(|v| v.as_u64()).unwrap_or(1);
    Ok((rows, pages))
}

fn table_from_rows(rows: Vec<WbRow>) -> GdpTable {
    let mut table = GdpTable::default();
    for row in rows {
        let name = row.country.value;
        if name.is_empty() {
            continue;
        }
        if !table.countries.contains(&name) {
            table.countries.push(name.clone());
        }
        if let Some(v) = row.value {
            table.by_country.entry(name).or_insert(v);
        }
    }
    table
}

pub struct WorldBankClient {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { base: String, client: reqwest::Client },
}

impl WorldBankClient {
    pub fn new() -> Self {
        Self::with_base(WORLD_BANK_BASE)
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                base: base.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Parse a single captured response page instead of calling out.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }
}

impl Default for WorldBankClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GdpProvider for WorldBankClient {
    async fn fetch(&self, year: i32) -> Result<GdpTable> {
        match &self.mode {
            Mode::Fixture(s) => {
                let (rows, _) = parse_page(s)?;
                Ok(table_from_rows(rows))
            }
            Mode::Http { base, client } => {
                let mut all_rows = Vec::new();
                let mut page: u64 = 1;
                loop {
                    let url = format!(
                        "{base}/country/all/indicator/{GDP_PER_CAPITA_INDICATOR}?format=json&date={year}&per_page={PER_PAGE}&page={page}"
                    );
                    let body = match client.get(&url).send().await {
                        Ok(resp) => resp.text().await.context("world bank .text()")?,
                        Err(e) => {
                            tracing::warn!(error = ?e, provider = "WorldBank", "provider http error");
                            counter!("provider_errors_total").increment(1);
                            return Err(e).context("world bank get()");
                        }
                    };
                    let (rows, pages) = parse_page(&body)?;
                    all_rows.extend(rows);
                    if page >= pages {
                        break;
                    }
                    page += 1;
                }
                Ok(table_from_rows(all_rows))
            }
        }
    }

    fn name(&self) -> &'static str {
        "WorldBank"
    }
}

/// TTL-cached wrapper; the cache key is `(indicator, year)` so a future
/// second indicator cannot collide.
pub struct CachedGdpProvider<P> {
    inner: P,
    cache: TtlCache<(String, i32), GdpTable>,
}

impl<P: GdpProvider> CachedGdpProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, GDP_CACHE_TTL)
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache.ttl_secs()
    }
}

#[async_trait]
impl<P: GdpProvider> GdpProvider for CachedGdpProvider<P> {
    async fn fetch(&self, year: i32) -> Result<GdpTable> {
        let key = (GDP_PER_CAPITA_INDICATOR.to_string(), year);
        if let Some(hit) = self.cache.get(&key) {
            counter!("gdp_cache_hits_total").increment(1);
            return Ok(hit);
        }
        counter!("gdp_cache_misses_total").increment(1);
        let fresh = self.inner.fetch(year).await?;
        self.cache.insert(key, fresh.clone());
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"[
      {"page": 1, "pages": 1, "per_page": 500, "total": 4},
      [
        {"indicator": {"id": "NY.GDP.PCAP.CD", "value": "GDP per capita (current US$)"},
         "country": {"id": "DE", "value": "Germany"}, "countryiso3code": "DEU",
         "date": "2022", "value": 48717.99, "unit": "", "obs_status": "", "decimal": 1},
        {"indicator": {"id": "NY.GDP.PCAP.CD", "value": "GDP per capita (current US$)"},
         "country": {"id": "KR", "value": "Korea, Rep."}, "countryiso3code": "KOR",
         "date": "2022", "value": 32422.5, "unit": "", "obs_status": "", "decimal": 1},
        {"indicator": {"id": "NY.GDP.PCAP.CD", "value": "GDP per capita (current US$)"},
         "country": {"id": "ER", "value": "Eritrea"}, "countryiso3code": "ERI",
         "date": "2022", "value": null, "unit": "", "obs_status": "", "decimal": 1}
      ]
    ]"#;

    #[tokio::test]
    async fn fixture_page_parses_and_drops_missing_values() {
        let client = WorldBankClient::from_fixture_str(PAGE);
        let table = client.fetch(2022).await.unwrap();
        // Universe keeps all three names; values only where present.
        assert_eq!(table.countries.len(), 3);
        assert!(table.countries.contains(&"Eritrea".to_string()));
        assert_eq!(table.by_country.len(), 2);
        assert_eq!(table.value_for("Germany"), Some(48717.99));
        assert_eq!(table.value_for("Eritrea"), None);
    }

    #[tokio::test]
    async fn malformed_body_is_an_error_not_a_panic() {
        let client = WorldBankClient::from_fixture_str(r#"{"message": "nope"}"#);
        assert!(client.fetch(2022).await.is_err());
    }

    #[test]
    fn fallback_universe_is_nonempty_and_valueless() {
        let table = GdpTable::fallback();
        assert!(table.countries.len() > 150);
        assert!(table.countries.contains(&"United States".to_string()));
        assert!(table.by_country.is_empty());
    }

}
