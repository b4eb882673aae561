use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::error::AppError;
use crate::fetcher::{GoogleSheetSource, SheetSource};
use crate::query;
use crate::snapshot::Snapshot;

pub struct AppState {
    pub config: Config,
    pub cache: SnapshotCache,
    pub source: Arc<dyn SheetSource>,
}

type SharedState = Arc<AppState>;

// Integer parameters arrive as raw strings so a malformed value becomes a
// 400 instead of the framework's default rejection.
#[derive(Deserialize)]
struct ChunkParams {
    start: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
struct AgentParams {
    row: Option<String>,
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(GoogleSheetSource::new(&config)?);
    let port = config.port;
    let state = Arc::new(AppState {
        cache: SnapshotCache::new(config.cache_ttl),
        source,
        config,
    });

    let app = router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("listening on http://0.0.0.0:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/agents/meta", get(agents_meta))
        .route("/api/agents/chunk", get(agents_chunk))
        .route("/api/agents", get(agents_list))
        .route("/api/agent", get(agent_row))
        .route("/api/metricas-pic/data", get(metricas_data))
        .route("/api/matriz-noviembre/data", get(matriz_data))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn agents_meta(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let snap = agents_snapshot(&state).await?;
    Ok(Json(json!({
        "headers": snap.headers,
        "total": snap.rows.len(),
        "version": snap.version,
    })))
}

async fn agents_chunk(
    State(state): State<SharedState>,
    Query(params): Query<ChunkParams>,
) -> Result<Json<Value>, AppError> {
    let start = parse_index("start", params.start.as_deref(), 0)?;
    let size = parse_index("size", params.size.as_deref(), 200)?;

    let snap = agents_snapshot(&state).await?;
    let page = query::page(&snap, start, size);
    Ok(Json(json!({
        "rows": page.rows,
        "start": page.start,
        "end": page.end,
        "total": page.total,
        "version": snap.version,
    })))
}

// Agent names live in column C when the sheet has one, otherwise in the
// first column. Row numbers are 1-based sheet rows (header is row 1).
async fn agents_list(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let snap = agents_snapshot(&state).await?;
    let name_idx = if snap.headers.len() > 2 { 2 } else { 0 };

    let agents: Vec<Value> = snap
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let name = row.get(name_idx).map(|v| v.trim()).unwrap_or("");
            if name.is_empty() {
                None
            } else {
                Some(json!({ "name": name, "row": i + 2 }))
            }
        })
        .collect();

    Ok(Json(json!({ "ok": true, "agents": agents })))
}

async fn agent_row(
    State(state): State<SharedState>,
    Query(params): Query<AgentParams>,
) -> Result<Json<Value>, AppError> {
    let row = parse_index("row", params.row.as_deref(), 0)?;

    let snap = agents_snapshot(&state).await?;
    // Row 1 is the header, data starts at row 2; anything outside comes
    // back as an empty row rather than an error.
    let values = row
        .checked_sub(2)
        .and_then(|i| snap.rows.get(i))
        .cloned()
        .unwrap_or_default();

    Ok(Json(json!({
        "ok": true,
        "headers": snap.headers,
        "row": values,
    })))
}

async fn metricas_data(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    colored_payload(&state, &state.config.metricas_sheet).await
}

async fn matriz_data(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    colored_payload(&state, &state.config.matriz_sheet).await
}

async fn colored_payload(state: &AppState, sheet: &str) -> Result<Json<Value>, AppError> {
    let snap = state
        .cache
        .get_or_refresh(state.source.as_ref(), sheet)
        .await?;
    Ok(Json(json!({
        "headers": snap.headers,
        "rows": snap.rows_with_colors,
    })))
}

async fn agents_snapshot(state: &AppState) -> Result<Arc<Snapshot>, AppError> {
    state
        .cache
        .get_or_refresh(state.source.as_ref(), &state.config.agents_sheet)
        .await
}

fn parse_index(name: &str, raw: Option<&str>, default: usize) -> Result<usize, AppError> {
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse().map_err(|_| {
            AppError::Validation(format!(
                "parameter {name:?} must be a non-negative integer, got {s:?}"
            ))
        }),
    }
}
