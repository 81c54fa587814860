use crate::layout_pool::LayoutPool;
use crate::web;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{GlobalStats, ServerError, WorkAssignment, WorkRequest, WorkResult, PROTOCOL_VERSION};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub layout_pool: LayoutPool,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/work/request", post(handle_work_request))
        .route("/api/work/submit", post(handle_work_submit))
        .route("/api/stats", get(handle_stats))
        .route("/health", get(web::health))
        .route("/healthz", get(web::health))
        .route("/", get(web::index))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let state = AppState {
        layout_pool: LayoutPool::new(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Hand out a work assignment. Mismatched protocol versions are rejected so
/// stale clients stop retrying instead of reporting garbage scores.
#[axum::debug_handler]
async fn handle_work_request(
    State(state): State<AppState>,
    Json(request): Json<WorkRequest>,
) -> Result<Json<WorkAssignment>, (StatusCode, Json<ServerError>)> {
    if request.protocol_version != PROTOCOL_VERSION {
        tracing::warn!(
            "rejected client {} on protocol {} (server is on {})",
            request.client_id,
            request.protocol_version,
            PROTOCOL_VERSION
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ServerError::VersionMismatch {
                server_version: PROTOCOL_VERSION,
                client_version: request.protocol_version,
            }),
        ));
    }

    state.layout_pool.register_client(request.client_id).await;
    let assignment = state.layout_pool.get_assignment().await;
    tracing::info!(
        "assigned work {} to client {} ({} shelves)",
        assignment.work_id,
        request.client_id,
        assignment.layout.len()
    );
    Ok(Json(assignment))
}

/// Ingest an evaluated layout from a client.
async fn handle_work_submit(
    State(state): State<AppState>,
    Json(result): Json<WorkResult>,
) -> StatusCode {
    tracing::info!(
        "work result from client {} ({} ticks, score {:.4})",
        result.client_id,
        result.stats.ticks_completed,
        result.stats.score
    );
    state.layout_pool.submit_result(result).await;
    StatusCode::OK
}

/// Get global statistics
async fn handle_stats(State(state): State<AppState>) -> Json<GlobalStats> {
    let stats = state.layout_pool.get_stats().await;
    Json(stats)
}
