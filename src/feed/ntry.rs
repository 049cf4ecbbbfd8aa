//! Power-ladder result feed over HTTP.
//!
//! Endpoint: https://ntry.com/data/json/games/power_ladder/result.json
//! Returns the latest published round as a flat JSON object:
//! `{ "r": 1234, "s": "LEFT", "l": 3, "o": "ODD" }`.
//! `r` and `l` are sometimes sent as strings. An empty body, `null` or
//! `{}` means nothing has been published yet.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::ResultFeed;
use crate::types::{Direction, LadderError, LineCount, Parity, RoundResult};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_URL: &str = "https://ntry.com/data/json/games/power_ladder/result.json";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Raw feed object. Every field is optional so that a missing key can be
/// reported by name instead of as a generic serde error.
#[derive(Debug, Deserialize)]
struct NtryPayload {
    #[serde(default)]
    r: Option<Value>,
    #[serde(default)]
    s: Option<String>,
    #[serde(default)]
    l: Option<Value>,
    #[serde(default)]
    o: Option<String>,
}

/// A number, or a string holding one.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode one feed payload.
///
/// `Ok(None)` for an empty payload. Parsing completes before anything is
/// returned, so a bad payload never produces a partial result.
pub fn parse_payload(value: &Value) -> Result<Option<RoundResult>, LadderError> {
    match value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(_) => {}
        other => {
            return Err(LadderError::MalformedPayload(format!(
                "expected an object, got {other}"
            )))
        }
    }

    let payload: NtryPayload = serde_json::from_value(value.clone())
        .map_err(|e| LadderError::MalformedPayload(e.to_string()))?;

    let raw_round = payload.r.ok_or(LadderError::MissingField("r"))?;
    let side = payload.s.ok_or(LadderError::MissingField("s"))?;
    let raw_lines = payload.l.ok_or(LadderError::MissingField("l"))?;
    let odd_even = payload.o.ok_or(LadderError::MissingField("o"))?;

    let round_id = as_u64(&raw_round).ok_or_else(|| {
        LadderError::MalformedPayload(format!("round id is not numeric: {raw_round}"))
    })?;
    // A round must have a successor to wager on.
    if round_id.checked_add(1).is_none() {
        return Err(LadderError::MalformedPayload(format!(
            "round id out of range: {round_id}"
        )));
    }
    let lines = as_u64(&raw_lines)
        .and_then(LineCount::from_u64)
        .ok_or_else(|| LadderError::MalformedPayload(format!("line count must be 3 or 4: {raw_lines}")))?;

    // Anything other than LEFT/ODD reads as RIGHT/EVEN.
    let direction = if side == "LEFT" {
        Direction::Left
    } else {
        Direction::Right
    };
    let parity = if odd_even == "ODD" {
        Parity::Odd
    } else {
        Parity::Even
    };

    Ok(Some(RoundResult::new(round_id, direction, lines, parity)))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the published result endpoint.
pub struct NtryFeed {
    http: Client,
    url: String,
}

impl NtryFeed {
    pub fn new(url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for result feed")?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ResultFeed for NtryFeed {
    async fn latest(&self) -> Result<Option<RoundResult>> {
        debug!(url = %self.url, "Fetching latest result");

        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LadderError::Transport(e.to_string()))
            .context("Result feed request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(LadderError::Transport(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .context("Failed to read result feed body")?;
        debug!(body = %body, "Feed response");

        if body.trim().is_empty() {
            warn!("Result feed returned an empty body");
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| LadderError::MalformedPayload(e.to_string()))
            .context("Failed to decode result feed JSON")?;

        let result = parse_payload(&value)?;
        if result.is_none() {
            warn!("No result published yet");
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
