use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::CountryMetricsRow;
use crate::analysis::{run_analysis, AnalysisOutcome};
use crate::config::AnalysisConfig;
use crate::export::{export_filename, rows_to_csv};
use crate::gdp::GdpProvider;
use crate::ingest::types::{Post, PostProvider};

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostProvider>,
    pub gdp: Arc<dyn GdpProvider>,
    pub cfg: AnalysisConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", get(analyze))
        .route("/export.csv", get(export_csv))
        .route("/posts", get(posts))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Per-request overrides for the configured analysis settings; all clamped
/// to the documented ranges.
#[derive(serde::Deserialize)]
struct AnalyzeParams {
    limit: Option<u32>,
    threshold: Option<u8>,
    year: Option<i32>,
}

#[derive(serde::Serialize)]
struct AnalyzeResp {
    rows: Vec<CountryMetricsRow>,
    post_count: usize,
    pair_count: usize,
    gdp_year: i32,
    fuzzy_threshold: u8,
    notes: Vec<String>,
}

async fn run_with_params(
    state: &AppState,
    params: &AnalyzeParams,
) -> (AnalysisConfig, AnalysisOutcome) {
    let cfg = state
        .cfg
        .with_overrides(params.limit, params.threshold, params.year);
    let outcome = run_analysis(state.posts.as_ref(), state.gdp.as_ref(), &cfg).await;
    (cfg, outcome)
}

async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Json<AnalyzeResp> {
    let (cfg, outcome) = run_with_params(&state, &params).await;
    Json(AnalyzeResp {
        post_count: outcome.posts.len(),
        pair_count: outcome.pair_count,
        gdp_year: cfg.gdp_year,
        fuzzy_threshold: cfg.fuzzy_threshold,
        rows: outcome.rows,
        notes: outcome.notes,
    })
}

async fn export_csv(State(state): State<AppState>, Query(params): Query<AnalyzeParams>) -> Response {
    let (_, outcome) = run_with_params(&state, &params).await;
    match rows_to_csv(&outcome.rows) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export_filename()),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("csv export failed: {e:#}"),
        )
            .into_response(),
    }
}

#[derive(serde::Serialize)]
struct PostsResp {
    posts: Vec<Post>,
    notes: Vec<String>,
}

/// Raw batch for the UI's raw-data tab.
async fn posts(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Json<PostsResp> {
    let cfg = state
        .cfg
        .with_overrides(params.limit, params.threshold, params.year);
    match crate::ingest::run_once(state.posts.as_ref(), cfg.post_limit).await {
        Ok(posts) => Json(PostsResp {
            posts,
            notes: Vec::new(),
        }),
        Err(e) => Json(PostsResp {
            posts: Vec::new(),
            notes: vec![format!("Unable to fetch posts from r/{}: {e:#}", cfg.feed)],
        }),
    }
}
