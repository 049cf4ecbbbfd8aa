//! Result feed integrations.
//!
//! Defines the `ResultFeed` trait and the HTTP implementation that polls
//! the public power-ladder result endpoint.

pub mod ntry;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::RoundResult;

/// Source of the most recently published round result.
///
/// `Ok(None)` means the source answered but has nothing published yet.
/// Any `Err` is recoverable: the caller logs it and polls again later.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultFeed: Send + Sync {
    /// Fetch the latest published result.
    async fn latest(&self) -> Result<Option<RoundResult>>;
}
