use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServerConfig;
use crate::snapshot::SnapshotWriter;
use crate::state::StateStore;

pub mod handlers;
pub mod responses;

pub use handlers::{current_status, health_check, state_dump};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub state: Arc<StateStore>,
    pub snapshot: SnapshotWriter,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(state: Arc<StateStore>, snapshot: SnapshotWriter) -> Self {
        Self {
            state,
            snapshot,
            started_at: Utc::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(current_status))
        .route("/api/state", get(state_dump))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server starting on {}:{}", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckRecord, IdentifierKind, StockStatus, Store, WatchItem};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn create_test_app_state() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state.sqlite3")).await.unwrap();
        let snapshot = SnapshotWriter::new(dir.path().join("status.json"));
        (dir, AppState::new(Arc::new(store), snapshot))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, state) = create_test_app_state().await;
        let (status, body) = get_json(create_router(state), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"][0]["name"], "database");
    }

    #[tokio::test]
    async fn test_health_check_reports_closed_store() {
        let (_dir, state) = create_test_app_state().await;
        state.state.close().await;
        let (status, body) = get_json(create_router(state), "/health").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_status_before_first_run_is_empty() {
        let (_dir, state) = create_test_app_state().await;
        let (status, body) = get_json(create_router(state), "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
        assert_eq!(body["meta"]["count"], 0);
    }

    #[tokio::test]
    async fn test_status_serves_snapshot() {
        let (_dir, state) = create_test_app_state().await;
        let item = WatchItem::new("target", "ETB", IdentifierKind::Url, "https://t/etb");
        let store = Store::local_context("target", 41.0, -87.0, 20.0, None);
        state
            .snapshot
            .write(&[CheckRecord::new(&item, &store, StockStatus::InStock)])
            .await
            .unwrap();

        let (status, body) = get_json(create_router(state), "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["label"], "ETB");
        assert_eq!(body["data"][0]["status"], "in_stock");
    }

    #[tokio::test]
    async fn test_state_dump() {
        let (_dir, state) = create_test_app_state().await;
        state.state.update("walmart", "url:b", "w1", StockStatus::OutOfStock).await.unwrap();
        state.state.update("target", "url:a", "t1", StockStatus::InStock).await.unwrap();

        let (status, body) = get_json(create_router(state), "/api/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["count"], 2);
        assert_eq!(body["data"][0]["retailer"], "target");
        assert_eq!(body["data"][1]["status"], "out_of_stock");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (_dir, state) = create_test_app_state().await;
        let response = create_router(state)
            .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
