//! One poll tick: fetch the latest result, then apply it to the session.
//!
//! The fetch runs without holding the session lock. The apply step holds
//! it from start to finish.

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::warn;

use super::session::{Session, TickOutcome};
use crate::feed::ResultFeed;

/// What one poll produced.
#[derive(Debug)]
pub enum PollOutcome {
    /// The feed answered with nothing published.
    Empty,
    Applied(TickOutcome),
}

/// Poll the feed once and apply whatever it returned.
///
/// Errors come only from the feed; the session is untouched in that case.
pub async fn poll_once(feed: &dyn ResultFeed, session: &Mutex<Session>) -> Result<PollOutcome> {
    let Some(result) = feed.latest().await? else {
        warn!("Feed has no result yet, skipping tick");
        return Ok(PollOutcome::Empty);
    };

    let mut session = session.lock().await;
    Ok(PollOutcome::Applied(session.observe(result)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
