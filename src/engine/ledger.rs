//! Round ledger: wagers committed per round and their settlement.
//!
//! Entries are keyed by round id. An entry is created pending when a
//! prediction is committed, closed exactly once (settled or voided), and
//! kept around for display until it falls out of the retention window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::settlement::Settlement;
use crate::types::{ComboWager, LadderError, RoundId, WagerEntry};

/// Closed entries kept for display.
pub const DEFAULT_RETAIN: usize = 20;

/// Largest retention window a configuration may ask for.
pub const MAX_RETAIN: usize = 1000;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Settled(Settlement),
    /// The round's result was never observed; stake refunded.
    Voided,
}

/// Wagers placed on one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundLedgerEntry {
    pub round_id: RoundId,
    pub label: String,
    pub scheme: String,
    pub picks: Vec<WagerEntry>,
    pub combos: Vec<ComboWager>,
    pub total_stake: Decimal,
    pub committed_at: DateTime<Utc>,
    pub status: EntryStatus,
}

impl RoundLedgerEntry {
    pub fn new(
        round_id: RoundId,
        label: String,
        scheme: &str,
        picks: Vec<WagerEntry>,
        combos: Vec<ComboWager>,
    ) -> Self {
        let mut entry = Self {
            round_id,
            label,
            scheme: scheme.to_string(),
            picks,
            combos,
            total_stake: Decimal::ZERO,
            committed_at: Utc::now(),
            status: EntryStatus::Pending,
        };
        entry.total_stake = entry.stake_sum();
        entry
    }

    /// Sum of every single and combination stake.
    pub fn stake_sum(&self) -> Decimal {
        self.picks.iter().map(|w| w.stake).sum::<Decimal>()
            + self.combos.iter().map(|c| c.stake).sum::<Decimal>()
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        match &self.status {
            EntryStatus::Settled(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub struct RoundLedger {
    entries: BTreeMap<RoundId, RoundLedgerEntry>,
    retain: usize,
}

impl Default for RoundLedger {
    fn default() -> Self {
        Self::new(DEFAULT_RETAIN)
    }
}

impl RoundLedger {
    pub fn new(retain: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            retain,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, round_id: RoundId) -> Option<&RoundLedgerEntry> {
        self.entries.get(&round_id)
    }

    /// The entry for `round_id`, only while it is still pending.
    pub fn pending(&self, round_id: RoundId) -> Option<&RoundLedgerEntry> {
        self.entries.get(&round_id).filter(|e| e.is_pending())
    }

    /// Add a freshly predicted entry. A round holds at most one entry.
    pub fn commit(&mut self, entry: RoundLedgerEntry) -> Result<(), LadderError> {
        if self.entries.contains_key(&entry.round_id) {
            return Err(LadderError::Strategy(format!(
                "round {} already has a ledger entry",
                entry.round_id
            )));
        }
        debug!(round = entry.round_id, stake = %entry.total_stake, "Ledger entry committed");
        self.entries.insert(entry.round_id, entry);
        Ok(())
    }

    /// Close a pending entry with its settlement.
    pub fn record_settlement(
        &mut self,
        round_id: RoundId,
        settlement: Settlement,
    ) -> Result<(), LadderError> {
        let entry = self
            .entries
            .get_mut(&round_id)
            .ok_or(LadderError::LedgerEntryNotFound(round_id))?;
        if !entry.is_pending() {
            return Err(LadderError::AlreadySettled(round_id));
        }
        entry.status = EntryStatus::Settled(settlement);
        self.evict();
        Ok(())
    }

    /// Void a pending entry. Returns the stake to refund.
    pub fn void(&mut self, round_id: RoundId) -> Option<Decimal> {
        let entry = self.entries.get_mut(&round_id).filter(|e| e.is_pending())?;
        entry.status = EntryStatus::Voided;
        let stake = entry.total_stake;
        self.evict();
        Some(stake)
    }

    /// Remove a pending entry entirely (strategy replacement).
    pub fn take_pending(&mut self, round_id: RoundId) -> Option<RoundLedgerEntry> {
        if self.pending(round_id).is_some() {
            self.entries.remove(&round_id)
        } else {
            None
        }
    }

    /// Pending rounds strictly older than `round_id`.
    pub fn pending_before(&self, round_id: RoundId) -> Vec<RoundId> {
        self.entries
            .range(..round_id)
            .filter(|(_, e)| e.is_pending())
            .map(|(id, _)| *id)
            .collect()
    }

    /// All retained entries, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &RoundLedgerEntry> {
        self.entries.values().rev()
    }

    /// Drop the oldest closed entries beyond the retention window.
    fn evict(&mut self) {
        let closed: Vec<RoundId> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.is_pending())
            .map(|(id, _)| *id)
            .collect();
        if closed.len() > self.retain {
            let excess = closed.len() - self.retain;
            for id in &closed[..excess] {
                self.entries.remove(id);
            }
            debug!(evicted = excess, "Ledger entries evicted");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
