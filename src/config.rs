//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and field has a default, so an empty file is a valid
//! configuration.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::countdown::GamePreset;
use crate::engine::history::{DEFAULT_HISTORY_LEN, MAX_HISTORY_LEN};
use crate::engine::ledger::{DEFAULT_RETAIN, MAX_RETAIN};
use crate::engine::session::SessionSettings;
use crate::engine::settlement::Odds;
use crate::feed::ntry::{DEFAULT_URL, DEFAULT_USER_AGENT};
use crate::strategy::{Predictor, StrategyConfig};
use crate::types::LadderError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub odds: Odds,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    /// Rows of result history kept.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Settled or voided ledger entries kept.
    #[serde(default = "default_retain")]
    pub retain: usize,
}

fn default_initial_balance() -> Decimal {
    dec!(500000)
}

fn default_history_len() -> usize {
    DEFAULT_HISTORY_LEN
}

fn default_retain() -> usize {
    DEFAULT_RETAIN
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            history_len: default_history_len(),
            retain: default_retain(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Delay after each completed tick.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_feed_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CountdownConfig {
    #[serde(default)]
    pub game: GamePreset,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_enabled")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

fn default_dashboard_enabled() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    8080
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_dashboard_enabled(),
            port: default_dashboard_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Append-only activity log. Empty disables the file layer.
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_file() -> String {
    "ladder_game.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session can't run with.
    pub fn validate(&self) -> Result<(), LadderError> {
        if self.session.initial_balance <= Decimal::ZERO {
            return Err(LadderError::Config(format!(
                "session.initial_balance must be positive, got {}",
                self.session.initial_balance
            )));
        }
        if self.session.history_len == 0 || self.session.history_len > MAX_HISTORY_LEN {
            return Err(LadderError::Config(format!(
                "session.history_len must be between 1 and {MAX_HISTORY_LEN}, got {}",
                self.session.history_len
            )));
        }
        if self.session.retain > MAX_RETAIN {
            return Err(LadderError::Config(format!(
                "session.retain must be at most {MAX_RETAIN}, got {}",
                self.session.retain
            )));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(LadderError::Config("feed.poll_interval_secs must be at least 1".into()));
        }
        if self.feed.timeout_secs == 0 {
            return Err(LadderError::Config("feed.timeout_secs must be at least 1".into()));
        }
        if self.odds.single <= Decimal::ONE || self.odds.combination <= Decimal::ONE {
            return Err(LadderError::Config(format!(
                "odds must exceed 1, got single={} combination={}",
                self.odds.single, self.odds.combination
            )));
        }
        Predictor::from_config(&self.strategy)
            .map_err(|e| LadderError::Config(format!("strategy: {e}")))?;
        Ok(())
    }

    /// Settings for a fresh session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            initial_balance: self.session.initial_balance,
            history_len: self.session.history_len,
            retain: self.session.retain,
            odds: self.odds,
            strategy: self.strategy.clone(),
        }
    }
}
