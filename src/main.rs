//! LADDER: power-ladder round tracker and betting strategy simulator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! starts the optional dashboard, and runs the poll → settle → predict
//! loop with graceful shutdown.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use ladder::config::{AppConfig, LoggingConfig};
use ladder::countdown::Countdown;
use ladder::dashboard::{self, routes::DashboardState};
use ladder::engine::poller::{poll_once, PollOutcome};
use ladder::engine::session::{Session, TickOutcome};
use ladder::feed::ntry::NtryFeed;

const BANNER: &str = r#"
 _        _    ____  ____  _____ ____
| |      / \  |  _ \|  _ \| ____|  _ \
| |     / _ \ | | | | | | |  _| | |_) |
| |___ / ___ \| |_| | |_| | |___|  _ <
|_____/_/   \_\____/|____/|_____|_| \_\

  Power-ladder round tracker and strategy simulator
  v0.1.0 (virtual balance only)
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration from TOML
    let cfg = AppConfig::load(&config_path)?;

    // Initialise structured logging
    init_logging(&cfg.logging)?;

    // Print startup banner
    println!("{BANNER}");

    let session = Session::new(cfg.session_settings())?;
    info!(
        session_id = %session.id(),
        initial_balance = %cfg.session.initial_balance,
        mode = %cfg.strategy.mode,
        scheme = cfg.strategy.stake.name(),
        feed = %cfg.feed.url,
        poll_interval_secs = cfg.feed.poll_interval_secs,
        "LADDER starting up"
    );
    let session = Arc::new(Mutex::new(session));
    let countdown = Countdown::for_game(cfg.countdown.game);

    // -- Dashboard -------------------------------------------------------

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(session.clone(), countdown));
        if let Err(e) = dashboard::spawn_dashboard(state, cfg.dashboard.port).await {
            error!(error = %e, "Dashboard unavailable, continuing without it");
        }
    }

    // -- Main loop -------------------------------------------------------

    let feed = NtryFeed::new(cfg.feed.url.clone(), cfg.feed.timeout(), &cfg.feed.user_agent)?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        game = %cfg.countdown.game,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        // Cancelling a poll is safe: it only awaits before touching the session.
        tokio::select! {
            polled = poll_once(&feed, &session) => match polled {
                Ok(outcome) => log_tick(&outcome),
                Err(e) => error!(error = %e, "Tick failed, continuing to next"),
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }

        debug!(
            next_draw_secs = countdown.remaining_at(chrono::Local::now()),
            "Waiting for next tick"
        );

        tokio::select! {
            _ = tokio::time::sleep(cfg.feed.poll_interval()) => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    let session = session.lock().await;
    let account = session.account();
    info!(
        balance = %account.balance,
        profit = %account.total_profit(),
        wins = account.wins,
        losses = account.losses,
        voided = account.voided,
        win_rate = format!("{:.1}%", account.win_rate()),
        "LADDER shut down cleanly."
    );

    Ok(())
}

/// Log a one-line summary of a tick.
fn log_tick(outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Empty => {}
        PollOutcome::Applied(TickOutcome::Unchanged { round }) => {
            debug!(round, "No new round");
        }
        PollOutcome::Applied(TickOutcome::Stale { .. } | TickOutcome::Rejected { .. }) => {}
        PollOutcome::Applied(TickOutcome::Started { round, committed }) => {
            info!(
                round,
                committed = committed.is_some(),
                "Tracking started"
            );
        }
        PollOutcome::Applied(TickOutcome::Advanced {
            round,
            settlement,
            voided,
            committed,
        }) => {
            info!(
                round,
                settled = settlement.is_some(),
                voided = voided.len(),
                balance = ?settlement.as_ref().map(|r| r.balance_after),
                next_stake = ?committed.as_ref().map(|c| c.total_stake),
                "Tick complete"
            );
        }
    }
}

/// Initialise the `tracing` subscriber: console output plus an
/// append-only, ANSI-free activity log file.
fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ladder=info"));

    let file_layer = if cfg.file.is_empty() {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.file)
            .with_context(|| format!("Failed to open log file: {}", cfg.file))?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if cfg.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }

    Ok(())
}
