//! Session: the single owned context behind every tick.
//!
//! Holds the account, the round ledger, the result history and the active
//! predictor, and drives the feed state machine:
//! `AwaitingFirstResult` → `Steady { current, next }`.
//!
//! Every mutation happens through `&mut Session`, so whoever holds the
//! session (the poll loop or a dashboard handler) runs to completion
//! before anyone else can observe or change it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::history::{HistoryRow, RoundHistory, DEFAULT_HISTORY_LEN};
use super::ledger::{RoundLedger, RoundLedgerEntry, DEFAULT_RETAIN};
use super::settlement::{Odds, SettlementReport, Settler};
use crate::strategy::{Predictor, StrategyConfig};
use crate::types::{AccountState, LadderError, RoundId, RoundResult};

// ---------------------------------------------------------------------------
// Settings and outcomes
// ---------------------------------------------------------------------------

/// Everything a fresh session needs.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub initial_balance: Decimal,
    pub history_len: usize,
    /// Closed ledger entries kept for display.
    pub retain: usize,
    pub odds: Odds,
    pub strategy: StrategyConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_balance: dec!(500000),
            history_len: DEFAULT_HISTORY_LEN,
            retain: DEFAULT_RETAIN,
            odds: Odds::default(),
            strategy: StrategyConfig::default(),
        }
    }
}

/// Where the session is in the feed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum FeedPhase {
    AwaitingFirstResult,
    Steady { current: RoundId, next: RoundId },
}

/// A wager committed (and escrowed) for a future round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commitment {
    pub round_id: RoundId,
    pub label: String,
    pub total_stake: Decimal,
}

/// What a single observed result did to the session.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// First result ever: nothing settled, first wager committed.
    Started {
        round: RoundId,
        committed: Option<Commitment>,
    },
    /// Same round as last time.
    Unchanged { round: RoundId },
    /// Feed went backwards; ignored.
    Stale { observed: RoundId, current: RoundId },
    /// Round id with no successor; ignored.
    Rejected { observed: RoundId },
    /// New round: settled (if we had a wager), advanced, committed.
    Advanced {
        round: RoundId,
        settlement: Option<SettlementReport>,
        voided: Vec<RoundId>,
        committed: Option<Commitment>,
    },
}

/// Result of swapping the strategy while a wager is pending.
#[derive(Debug, Clone, Serialize)]
pub struct Replacement {
    pub refunded: Option<Decimal>,
    pub committed: Option<Commitment>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    id: Uuid,
    phase: FeedPhase,
    account: AccountState,
    ledger: RoundLedger,
    history: RoundHistory,
    predictor: Predictor,
    settler: Settler,
    strategy: StrategyConfig,
    /// When the current round was first observed.
    last_update: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Result<Self, LadderError> {
        let predictor = Predictor::from_config(&settings.strategy)?;
        let account = AccountState::new(
            settings.initial_balance,
            predictor.scheme().initial_state(),
        );

        Ok(Self {
            id: Uuid::new_v4(),
            phase: FeedPhase::AwaitingFirstResult,
            account,
            ledger: RoundLedger::new(settings.retain),
            history: RoundHistory::new(settings.history_len),
            predictor,
            settler: Settler::new(settings.odds),
            strategy: settings.strategy,
            last_update: None,
        })
    }

    // -- Accessors -------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn ledger(&self) -> &RoundLedger {
        &self.ledger
    }

    pub fn history(&self) -> &RoundHistory {
        &self.history
    }

    pub fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    pub fn odds(&self) -> &Odds {
        self.settler.odds()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn current_round(&self) -> Option<RoundId> {
        match self.phase {
            FeedPhase::Steady { current, .. } => Some(current),
            FeedPhase::AwaitingFirstResult => None,
        }
    }

    pub fn next_round(&self) -> Option<RoundId> {
        match self.phase {
            FeedPhase::Steady { next, .. } => Some(next),
            FeedPhase::AwaitingFirstResult => None,
        }
    }

    /// The escrowed wager waiting on the next round, if any.
    pub fn pending_prediction(&self) -> Option<&RoundLedgerEntry> {
        self.next_round().and_then(|next| self.ledger.pending(next))
    }

    // -- Feed state machine ----------------------------------------------

    /// Apply one observed result.
    pub fn observe(&mut self, result: RoundResult) -> TickOutcome {
        let Some(next) = result.round_id.checked_add(1) else {
            error!(
                observed = result.round_id,
                "Round id has no successor, ignoring"
            );
            return TickOutcome::Rejected {
                observed: result.round_id,
            };
        };

        match self.phase {
            FeedPhase::AwaitingFirstResult => {
                let round = result.round_id;
                info!(round, next, result = %result, "First result observed");

                self.phase = FeedPhase::Steady { current: round, next };
                self.last_update = Some(Utc::now());
                self.history.push(HistoryRow {
                    result,
                    correct_picks: None,
                    won: None,
                });
                let committed = self.commit_next(next);

                TickOutcome::Started { round, committed }
            }
            FeedPhase::Steady { current, .. } if result.round_id == current => {
                TickOutcome::Unchanged { round: current }
            }
            FeedPhase::Steady { current, .. } if result.round_id < current => {
                warn!(observed = result.round_id, current, "Stale round from feed, ignoring");
                TickOutcome::Stale {
                    observed: result.round_id,
                    current,
                }
            }
            FeedPhase::Steady { current, .. } => {
                info!(round = result.round_id, previous = current, result = %result, "New round");
                self.advance(result, next)
            }
        }
    }

    fn advance(&mut self, result: RoundResult, next: RoundId) -> TickOutcome {
        let round = result.round_id;

        let settlement = self.settle(&result);

        let mut voided = Vec::new();
        for stale in self.ledger.pending_before(round) {
            if let Some(stake) = self.ledger.void(stale) {
                self.account.refund(stake);
                self.account.voided += 1;
                warn!(round = stale, refunded = %stake, "Result never observed, wager voided");
                voided.push(stale);
            }
        }

        self.phase = FeedPhase::Steady {
            current: round,
            next,
        };
        self.last_update = Some(Utc::now());
        self.history.push(HistoryRow {
            result,
            correct_picks: settlement.as_ref().map(|r| r.settlement.correct_picks),
            won: settlement.as_ref().map(|r| r.settlement.won),
        });

        let committed = self.commit_next(next);

        TickOutcome::Advanced {
            round,
            settlement,
            voided,
            committed,
        }
    }

    fn settle(&mut self, result: &RoundResult) -> Option<SettlementReport> {
        let round = result.round_id;
        let Some(entry) = self.ledger.pending(round) else {
            error!(
                round,
                error = %LadderError::LedgerEntryNotFound(round),
                "Settlement skipped"
            );
            return None;
        };

        let report = match self.settler.reconcile(
            &mut self.account,
            self.predictor.scheme(),
            entry,
            result,
        ) {
            Ok(report) => report,
            Err(e) => {
                error!(round, error = %e, "Settlement failed");
                return None;
            }
        };

        if let Err(e) = self.ledger.record_settlement(round, report.settlement.clone()) {
            error!(round, error = %e, "Failed to record settlement");
        }
        Some(report)
    }

    /// Predict, commit and escrow the wager for `round`.
    fn commit_next(&mut self, round: RoundId) -> Option<Commitment> {
        let entry = self.predictor.predict(round, &self.account.stake);

        if entry.total_stake > self.account.balance {
            warn!(
                round,
                stake = %entry.total_stake,
                balance = %self.account.balance,
                "Balance cannot cover wager, skipping round"
            );
            return None;
        }

        let commitment = Commitment {
            round_id: round,
            label: entry.label.clone(),
            total_stake: entry.total_stake,
        };
        let wagers = entry
            .picks
            .iter()
            .map(|w| w.to_string())
            .chain(entry.combos.iter().map(|c| c.to_string()))
            .collect::<Vec<_>>()
            .join(", ");

        if let Err(e) = self.ledger.commit(entry) {
            error!(round, error = %e, "Failed to commit wager");
            return None;
        }
        self.account.escrow(commitment.total_stake);

        info!(
            round,
            pattern = %commitment.label,
            wagers = %wagers,
            stake = %commitment.total_stake,
            balance = %self.account.balance,
            "Wager placed"
        );

        Some(commitment)
    }

    // -- Strategy replacement ----------------------------------------------

    /// Swap the active strategy. A pending wager on the next round is
    /// refunded and re-placed under the new configuration.
    ///
    /// The new configuration is validated before anything changes.
    pub fn reconfigure(&mut self, config: StrategyConfig) -> Result<Replacement, LadderError> {
        let predictor = Predictor::from_config(&config)?;
        let scheme_changed = config.stake != self.strategy.stake;

        self.predictor = predictor;
        if scheme_changed {
            self.account.stake = self.predictor.scheme().initial_state();
        }
        info!(
            mode = %config.mode,
            scheme = config.stake.name(),
            scheme_changed,
            "Strategy reconfigured"
        );
        self.strategy = config;

        let mut replacement = Replacement {
            refunded: None,
            committed: None,
        };

        if let FeedPhase::Steady { next, .. } = self.phase {
            if let Some(old) = self.ledger.take_pending(next) {
                self.account.refund(old.total_stake);
                info!(round = next, refunded = %old.total_stake, "Pending wager cancelled");
                replacement.refunded = Some(old.total_stake);
            }
            replacement.committed = self.commit_next(next);
        }

        Ok(replacement)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
