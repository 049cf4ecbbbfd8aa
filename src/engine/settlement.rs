//! Settlement: payouts, win classification, and stake-state updates.
//!
//! Compares a committed ledger entry against the observed round result,
//! credits winnings to the account (the stake was escrowed at commit
//! time), and moves the stake scheme's state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ledger::RoundLedgerEntry;
use crate::strategy::stake::StakeScheme;
use crate::types::{AccountState, LadderError, RoundResult};

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

fn default_single_odds() -> Decimal {
    dec!(1.93)
}

fn default_combination_odds() -> Decimal {
    dec!(3.6)
}

/// Fixed payout multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    #[serde(default = "default_single_odds")]
    pub single: Decimal,
    #[serde(default = "default_combination_odds")]
    pub combination: Decimal,
}

impl Default for Odds {
    fn default() -> Self {
        Self {
            single: default_single_odds(),
            combination: default_combination_odds(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement record
// ---------------------------------------------------------------------------

/// Outcome of one settled round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub result: RoundResult,
    pub correct_picks: usize,
    pub hedge_hit: bool,
    pub win_amount: Decimal,
    pub total_stake: Decimal,
    pub net_profit: Decimal,
    pub won: bool,
    pub settled_at: DateTime<Utc>,
}

/// Balance movement caused by one settlement.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub settlement: Settlement,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
}

// ---------------------------------------------------------------------------
// Settler
// ---------------------------------------------------------------------------

pub struct Settler {
    odds: Odds,
}

impl Settler {
    pub fn new(odds: Odds) -> Self {
        Self { odds }
    }

    pub fn odds(&self) -> &Odds {
        &self.odds
    }

    /// Score an entry against a result. Pure: touches no state.
    ///
    /// Payouts are truncated to whole currency units.
    pub fn evaluate(
        &self,
        entry: &RoundLedgerEntry,
        result: &RoundResult,
        scheme: &StakeScheme,
    ) -> Result<Settlement, LadderError> {
        if !entry.is_pending() {
            return Err(LadderError::AlreadySettled(entry.round_id));
        }

        let mut correct_picks = 0;
        let mut win_amount = Decimal::ZERO;

        for wager in &entry.picks {
            if wager.pick.matches(result) {
                correct_picks += 1;
                win_amount += (wager.stake * self.odds.single).trunc();
            }
        }

        let mut hedge_hit = false;
        for combo in &entry.combos {
            if combo.matches(result) {
                hedge_hit = true;
                win_amount += (combo.stake * self.odds.combination).trunc();
            }
        }

        let won = scheme.policy().is_win(correct_picks, hedge_hit);

        Ok(Settlement {
            result: *result,
            correct_picks,
            hedge_hit,
            win_amount,
            total_stake: entry.total_stake,
            net_profit: win_amount - entry.total_stake,
            won,
            settled_at: Utc::now(),
        })
    }

    /// Settle an entry: credit the payout, count the round, and adjust the
    /// stake scheme.
    pub fn reconcile(
        &self,
        account: &mut AccountState,
        scheme: &StakeScheme,
        entry: &RoundLedgerEntry,
        result: &RoundResult,
    ) -> Result<SettlementReport, LadderError> {
        let settlement = self.evaluate(entry, result, scheme)?;
        let balance_before = account.balance;

        account.record_settlement(settlement.win_amount, settlement.won);
        scheme.adjust(&mut account.stake, settlement.won, account.balance);

        info!(
            round = result.round_id,
            result = %result,
            pattern = %entry.label,
            correct = settlement.correct_picks,
            hedge_hit = settlement.hedge_hit,
            stake = %settlement.total_stake,
            win = %settlement.win_amount,
            profit = %settlement.net_profit,
            outcome = if settlement.won { "WIN" } else { "LOSS" },
            balance = %account.balance,
            "Round settled"
        );

        Ok(SettlementReport {
            settlement,
            balance_before,
            balance_after: account.balance,
        })
    }
}

impl Default for Settler {
    fn default() -> Self {
        Self::new(Odds::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
