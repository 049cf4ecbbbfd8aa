//! Dashboard: Axum web server for live session monitoring.
//!
//! Serves a REST API and a self-contained HTML dashboard, and accepts
//! strategy changes while the session is running.
//! CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::Html,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use routes::AppState;

/// The embedded dashboard HTML (compiled into the binary).
const DASHBOARD_HTML: &str = include_str!("templates/index.html");

/// Bind the dashboard port and serve in a background task.
///
/// Binding happens before returning, so a taken port is reported to the
/// caller instead of being lost inside the task.
pub async fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard server starting on http://localhost:{port}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/status", get(routes::get_status))
        .route("/api/history", get(routes::get_history))
        .route("/api/stats", get(routes::get_stats))
        .route("/api/ledger", get(routes::get_ledger))
        .route("/api/prediction", get(routes::get_prediction))
        .route(
            "/api/strategy",
            get(routes::get_strategy).post(routes::post_strategy),
        )
        .route("/health", get(routes::health))
        // Dashboard HTML
        .route("/", get(serve_dashboard))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML dashboard.
async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::Countdown;
    use crate::engine::session::{Session, SessionSettings};
    use crate::types::{Direction, LineCount, Parity, RoundResult};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use routes::DashboardState;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let session = Session::new(SessionSettings::default()).unwrap();
        Arc::new(DashboardState::new(
            Arc::new(Mutex::new(session)),
            Countdown::default(),
        ))
    }

    async fn started_state() -> AppState {
        let state = test_state();
        state
            .session
            .lock()
            .await
            .observe(RoundResult::new(100, Direction::Right, LineCount::Four, Parity::Even));
        state
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_strategy(app: Router, body: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/strategy")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = build_router(started_state().await);
        let (status, json) = get_json(app, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["current_round"], 100);
        assert_eq!(json["next_round"], 101);
        assert!(json["balance"].as_f64().unwrap() < 500000.0);
        assert_eq!(json["phase"]["phase"], "steady");
        assert!(json["last_update"].is_string());
        assert!(json["countdown_label"].as_str().unwrap().contains(':'));
    }

    #[tokio::test]
    async fn test_history_endpoint() {
        let app = build_router(started_state().await);
        let (status, json) = get_json(app, "/api/history").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["result"]["round_id"], 100);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = build_router(started_state().await);
        let (status, json) = get_json(app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 1);
        assert_eq!(json["right"], 1);
    }

    #[tokio::test]
    async fn test_ledger_and_prediction_endpoints() {
        let state = started_state().await;

        let (status, json) = get_json(build_router(state.clone()), "/api/ledger").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, json) = get_json(build_router(state), "/api/prediction").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["round_id"], 101);
        assert_eq!(json["status"]["state"], "pending");
    }

    #[tokio::test]
    async fn test_strategy_switch_endpoint() {
        let state = started_state().await;
        let body = r#"{"mode":"custom","custom_picks":["ODD","NONE","NONE"]}"#;

        let (status, bytes) = post_strategy(build_router(state.clone()), body).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["refunded"].as_f64(), Some(75000.0));
        assert_eq!(json["committed"]["total_stake"].as_f64(), Some(35000.0));

        let (_, json) = get_json(build_router(state), "/api/strategy").await;
        assert_eq!(json["mode"], "custom");
    }

    #[tokio::test]
    async fn test_strategy_switch_rejects_invalid_config() {
        let state = started_state().await;
        let body = r#"{"mode":"rotation","rotation":[]}"#;

        let (status, bytes) = post_strategy(build_router(state.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().contains("rotation"));

        // Pending wager untouched
        let (_, json) = get_json(build_router(state), "/api/prediction").await;
        assert_eq!(json["total_stake"].as_f64(), Some(75000.0));
    }

    #[tokio::test]
    async fn test_dashboard_html() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("LADDER"));
        assert!(html.contains("/api/status"));
    }
}
