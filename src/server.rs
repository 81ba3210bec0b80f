use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as AxumPath, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::cli::ServeArgs;
use crate::error::{ApiError, ValidationError, ValidationIssue};
use crate::scenario::{ScenarioRequest, run_scenario};
use crate::seed::{builtin_records, read_meta};
use crate::storage::{StoragePaths, file_present_nonempty};
use crate::store::{CodeRepository, DuckDbCodeRepository, InMemoryCodeRepository, SearchQuery};
use crate::validation::INVALID_REQUEST;

#[derive(Clone)]
pub struct AppState {
    codes: Arc<dyn CodeRepository>,
    meta: Option<serde_json::Value>,
}

impl AppState {
    pub fn new(codes: Arc<dyn CodeRepository>) -> Self {
        Self { codes, meta: None }
    }

    pub fn with_meta(mut self, meta: Option<serde_json::Value>) -> Self {
        self.meta = meta;
        self
    }
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let paths = StoragePaths::new(&opts.data_dir);

    let state = if opts.in_memory {
        let records = builtin_records().context("parse built-in seed")?;
        let repo = InMemoryCodeRepository::new(records).context("load built-in seed")?;
        tracing::info!("Serving {} built-in codes from memory", repo.len());
        AppState::new(Arc::new(repo))
    } else {
        if !file_present_nonempty(&paths.duckdb_path) {
            return Err(anyhow!(
                "DuckDB not found at {}. Run: reimbursement-backend seed",
                paths.duckdb_path.display()
            ));
        }
        let repo = DuckDbCodeRepository::open(&paths.duckdb_path)
            .with_context(|| format!("open duckdb at {}", paths.duckdb_path.display()))?;
        tracing::info!(
            "Serving {} codes from {}",
            repo.count()?,
            paths.duckdb_path.display()
        );
        AppState::new(Arc::new(repo)).with_meta(read_meta(&paths.meta_path))
    };

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/stats", get(api_stats))
        .route("/api/codes", get(api_list_codes))
        .route("/api/codes/search", get(api_search_codes))
        .route("/api/codes/:code", get(api_code_detail))
        .route("/api/reimbursement/scenario", post(api_scenario))
        .layer(cors)
        .with_state(state)
}

async fn api_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    meta: Option<serde_json::Value>,
}

async fn api_stats(State(st): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse { meta: st.meta })
}

async fn api_list_codes(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let codes = st
        .codes
        .list()
        .map_err(ApiError::internal("Failed to fetch codes"))?;
    Ok(Json(codes))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn api_search_codes(
    State(st): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SearchQuery::parse(p.q.as_deref().unwrap_or(""))?;
    let codes = st
        .codes
        .search(&query)
        .map_err(ApiError::internal("Failed to search codes"))?;
    Ok(Json(codes))
}

async fn api_code_detail(
    State(st): State<AppState>,
    AxumPath(code): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = st
        .codes
        .get_by_code(&code)
        .map_err(ApiError::internal("Failed to fetch code detail"))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(record))
}

async fn api_scenario(
    State(st): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        ValidationError::with_details(
            INVALID_REQUEST,
            vec![ValidationIssue::new("", rejection.body_text())],
        )
    })?;
    let request = ScenarioRequest::from_json(&body)?;
    let result = run_scenario(st.codes.as_ref(), &request)
        .map_err(|e| ApiError::from_lookup(e, "Failed to calculate reimbursement scenario"))?;
    Ok(Json(result))
}
