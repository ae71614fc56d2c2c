// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod export;
pub mod extract;
pub mod gdp;
pub mod ingest;
pub mod metrics;
pub mod normalize;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, CountryMetricsRow, NormalizedPair};
pub use crate::analysis::{run_analysis, AnalysisOutcome};
pub use crate::api::{create_router, AppState};
pub use crate::config::AnalysisConfig;
pub use crate::extract::{extract_route, ExtractedPair};
pub use crate::gdp::{GdpProvider, GdpTable};
pub use crate::ingest::types::{Post, PostProvider};
pub use crate::normalize::{best_match, similarity};
