//! Dashboard API route handlers.
//!
//! All endpoints return JSON. Every handler locks the session for the
//! duration of the request, the same lock the poll loop takes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::countdown::Countdown;
use crate::engine::history::HistoryRow;
use crate::engine::ledger::RoundLedgerEntry;
use crate::engine::session::{FeedPhase, Replacement, Session};
use crate::strategy::StrategyConfig;
use crate::types::{RoundId, StakeState};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub session: Arc<Mutex<Session>>,
    pub countdown: Countdown,
}

impl DashboardState {
    pub fn new(session: Arc<Mutex<Session>>, countdown: Countdown) -> Self {
        Self { session, countdown }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub session_id: String,
    pub phase: FeedPhase,
    pub current_round: Option<RoundId>,
    pub next_round: Option<RoundId>,
    pub initial_balance: Decimal,
    pub balance: Decimal,
    pub total_profit: Decimal,
    pub wins: u64,
    pub losses: u64,
    pub voided: u64,
    pub win_rate: f64,
    pub total_staked: Decimal,
    pub total_won: Decimal,
    pub stake: StakeState,
    pub strategy_mode: String,
    pub scheme: String,
    pub pending_label: Option<String>,
    pub pending_stake: Option<Decimal>,
    pub countdown_secs: u32,
    /// `m:ss` until the next draw.
    pub countdown_label: String,
    /// When the current round was first observed.
    pub last_update: Option<DateTime<Utc>>,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total: usize,
    pub left: usize,
    pub right: usize,
    pub three: usize,
    pub four: usize,
    pub odd: usize,
    pub even: usize,
    pub left_pct: f64,
    pub right_pct: f64,
    pub three_pct: f64,
    pub four_pct: f64,
    pub odd_pct: f64,
    pub even_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.session.lock().await;
    let account = session.account();
    let pending = session.pending_prediction();
    let now = Utc::now();
    let (minutes, seconds) = state.countdown.remaining_parts_at(Local::now());

    Json(StatusResponse {
        session_id: session.id().to_string(),
        phase: session.phase(),
        current_round: session.current_round(),
        next_round: session.next_round(),
        initial_balance: account.initial_balance,
        balance: account.balance,
        total_profit: account.total_profit(),
        wins: account.wins,
        losses: account.losses,
        voided: account.voided,
        win_rate: account.win_rate(),
        total_staked: account.total_staked,
        total_won: account.total_won,
        stake: account.stake.clone(),
        strategy_mode: session.strategy().mode.to_string(),
        scheme: session.strategy().stake.name().to_string(),
        pending_label: pending.map(|e| e.label.clone()),
        pending_stake: pending.map(|e| e.total_stake),
        countdown_secs: minutes * 60 + seconds,
        countdown_label: format!("{minutes}:{seconds:02}"),
        last_update: session.last_update(),
        uptime_secs: (now - account.start_time).num_seconds(),
    })
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryRow>> {
    let session = state.session.lock().await;
    Json(session.history().rows().cloned().collect())
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.session.lock().await.history().stats();
    Json(StatsResponse {
        left_pct: stats.pct(stats.left),
        right_pct: stats.pct(stats.right),
        three_pct: stats.pct(stats.three),
        four_pct: stats.pct(stats.four),
        odd_pct: stats.pct(stats.odd),
        even_pct: stats.pct(stats.even),
        total: stats.total,
        left: stats.left,
        right: stats.right,
        three: stats.three,
        four: stats.four,
        odd: stats.odd,
        even: stats.even,
    })
}

/// GET /api/ledger
pub async fn get_ledger(State(state): State<AppState>) -> Json<Vec<RoundLedgerEntry>> {
    let session = state.session.lock().await;
    Json(session.ledger().recent().cloned().collect())
}

/// GET /api/prediction
pub async fn get_prediction(State(state): State<AppState>) -> Json<Option<RoundLedgerEntry>> {
    let session = state.session.lock().await;
    Json(session.pending_prediction().cloned())
}

/// GET /api/strategy
pub async fn get_strategy(State(state): State<AppState>) -> Json<StrategyConfig> {
    let session = state.session.lock().await;
    Json(session.strategy().clone())
}

/// POST /api/strategy
pub async fn post_strategy(
    State(state): State<AppState>,
    Json(config): Json<StrategyConfig>,
) -> Result<Json<Replacement>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = state.session.lock().await;
    match session.reconfigure(config) {
        Ok(replacement) => Ok(Json(replacement)),
        Err(e) => {
            warn!(error = %e, "Rejected strategy update");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
