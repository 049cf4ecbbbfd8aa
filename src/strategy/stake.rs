//! Stake schemes.
//!
//! Decides how much goes on each pick and hedge, which predicate counts a
//! settled round as a win, and how the scheme's internal state moves after
//! each settlement.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{LadderError, StakeState};

/// Correct single picks needed for a majority win.
pub const MAJORITY_PICKS: usize = 2;

// ---------------------------------------------------------------------------
// Win policy
// ---------------------------------------------------------------------------

/// How a settled round is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPolicy {
    /// At least two single picks correct. Hedges only pay out.
    Majority,
    /// At least two single picks correct, or any hedge hit.
    MajorityOrHedge,
}

impl WinPolicy {
    pub fn is_win(&self, correct_picks: usize, hedge_hit: bool) -> bool {
        let majority = correct_picks >= MAJORITY_PICKS;
        match self {
            WinPolicy::Majority => majority,
            WinPolicy::MajorityOrHedge => majority || hedge_hit,
        }
    }
}

// ---------------------------------------------------------------------------
// Schemes
// ---------------------------------------------------------------------------

fn default_single() -> Decimal {
    dec!(20000)
}

fn default_hedge() -> Decimal {
    dec!(15000)
}

fn default_primary() -> Decimal {
    dec!(30000)
}

fn default_secondary() -> Decimal {
    dec!(15000)
}

fn default_base() -> Decimal {
    dec!(30000)
}

fn default_loss_multiplier() -> Decimal {
    dec!(1.5)
}

fn default_balance_cap() -> Decimal {
    dec!(0.05)
}

/// Ten-step ladder; the step index stays in `[0, 9]`.
pub fn default_ladder() -> Vec<Decimal> {
    vec![
        dec!(10000),
        dec!(15000),
        dec!(20000),
        dec!(30000),
        dec!(40000),
        dec!(50000),
        dec!(70000),
        dec!(90000),
        dec!(120000),
        dec!(150000),
    ]
}

/// Stake scheme configuration. Tagged by `scheme` in TOML/JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum StakeScheme {
    /// Same stake on every pick.
    Flat {
        #[serde(default = "default_single")]
        single: Decimal,
        #[serde(default = "default_hedge")]
        hedge: Decimal,
    },
    /// First pick of the pattern gets `primary`, the rest `secondary`.
    Weighted {
        #[serde(default = "default_primary")]
        primary: Decimal,
        #[serde(default = "default_secondary")]
        secondary: Decimal,
        #[serde(default = "default_hedge")]
        hedge: Decimal,
    },
    /// Base stake, boosted once after a single loss and capped by balance.
    Progressive {
        #[serde(default = "default_base")]
        base: Decimal,
        #[serde(default = "default_loss_multiplier")]
        loss_multiplier: Decimal,
        #[serde(default = "default_balance_cap")]
        balance_cap: Decimal,
        #[serde(default = "default_hedge")]
        hedge: Decimal,
    },
    /// Stake looked up on a bounded ladder; step moves down on a win and up on a loss.
    Martingale {
        #[serde(default = "default_ladder")]
        ladder: Vec<Decimal>,
        #[serde(default = "default_hedge")]
        hedge: Decimal,
    },
}

impl Default for StakeScheme {
    fn default() -> Self {
        StakeScheme::Flat {
            single: default_single(),
            hedge: default_hedge(),
        }
    }
}

impl StakeScheme {
    pub fn name(&self) -> &'static str {
        match self {
            StakeScheme::Flat { .. } => "flat",
            StakeScheme::Weighted { .. } => "weighted",
            StakeScheme::Progressive { .. } => "progressive",
            StakeScheme::Martingale { .. } => "martingale",
        }
    }

    /// The single authoritative win rule for this scheme.
    pub fn policy(&self) -> WinPolicy {
        match self {
            StakeScheme::Flat { .. } | StakeScheme::Weighted { .. } => WinPolicy::MajorityOrHedge,
            StakeScheme::Progressive { .. } | StakeScheme::Martingale { .. } => WinPolicy::Majority,
        }
    }

    /// Reject configurations that can't produce a sane stake.
    pub fn validate(&self) -> Result<(), LadderError> {
        let positive = |name: &str, v: Decimal| {
            if v > Decimal::ZERO {
                Ok(())
            } else {
                Err(LadderError::Strategy(format!("{name} stake must be positive, got {v}")))
            }
        };

        match self {
            StakeScheme::Flat { single, hedge } => {
                positive("single", *single)?;
                positive("hedge", *hedge)
            }
            StakeScheme::Weighted { primary, secondary, hedge } => {
                positive("primary", *primary)?;
                positive("secondary", *secondary)?;
                positive("hedge", *hedge)
            }
            StakeScheme::Progressive { base, loss_multiplier, balance_cap, hedge } => {
                positive("base", *base)?;
                positive("hedge", *hedge)?;
                if *loss_multiplier < Decimal::ONE {
                    return Err(LadderError::Strategy(format!(
                        "loss_multiplier must be >= 1, got {loss_multiplier}"
                    )));
                }
                if *balance_cap <= Decimal::ZERO || *balance_cap > Decimal::ONE {
                    return Err(LadderError::Strategy(format!(
                        "balance_cap must be in (0, 1], got {balance_cap}"
                    )));
                }
                Ok(())
            }
            StakeScheme::Martingale { ladder, hedge } => {
                if ladder.is_empty() {
                    return Err(LadderError::Strategy("martingale ladder is empty".into()));
                }
                for step in ladder {
                    positive("ladder", *step)?;
                }
                positive("hedge", *hedge)
            }
        }
    }

    /// Fresh state for this scheme.
    pub fn initial_state(&self) -> StakeState {
        let current = match self {
            StakeScheme::Flat { single, .. } => *single,
            StakeScheme::Weighted { primary, .. } => *primary,
            StakeScheme::Progressive { base, .. } => *base,
            StakeScheme::Martingale { ladder, .. } => ladder.first().copied().unwrap_or(Decimal::ZERO),
        };
        StakeState {
            step: 0,
            current,
            losing_streak: 0,
        }
    }

    /// Stakes for `count` picks, in pattern order.
    pub fn pick_stakes(&self, count: usize, state: &StakeState) -> Vec<Decimal> {
        match self {
            StakeScheme::Flat { single, .. } => vec![*single; count],
            StakeScheme::Weighted { primary, secondary, .. } => (0..count)
                .map(|i| if i == 0 { *primary } else { *secondary })
                .collect(),
            StakeScheme::Progressive { .. } => vec![state.current; count],
            StakeScheme::Martingale { ladder, .. } => {
                let step = state.step.min(ladder.len().saturating_sub(1));
                let stake = ladder.get(step).copied().unwrap_or(Decimal::ZERO);
                vec![stake; count]
            }
        }
    }

    /// Stake placed on every hedge combination.
    pub fn hedge_stake(&self) -> Decimal {
        match self {
            StakeScheme::Flat { hedge, .. }
            | StakeScheme::Weighted { hedge, .. }
            | StakeScheme::Progressive { hedge, .. }
            | StakeScheme::Martingale { hedge, .. } => *hedge,
        }
    }

    /// Move the scheme state after a settled round.
    ///
    /// `balance` is the balance after the payout was credited.
    pub fn adjust(&self, state: &mut StakeState, won: bool, balance: Decimal) {
        if won {
            state.losing_streak = 0;
        } else {
            state.losing_streak += 1;
        }

        match self {
            StakeScheme::Flat { single, .. } => state.current = *single,
            StakeScheme::Weighted { primary, .. } => state.current = *primary,
            StakeScheme::Progressive { base, loss_multiplier, balance_cap, .. } => {
                let next = if won || state.losing_streak >= 2 {
                    *base
                } else {
                    (*base * *loss_multiplier).trunc()
                };
                let ceiling = (balance * *balance_cap).trunc().max(*base);
                state.current = next.min(ceiling);
            }
            StakeScheme::Martingale { ladder, .. } => {
                let last = ladder.len().saturating_sub(1);
                state.step = if won {
                    state.step.saturating_sub(1)
                } else {
                    (state.step + 1).min(last)
                };
                state.current = ladder.get(state.step).copied().unwrap_or(Decimal::ZERO);
            }
        }

        debug!(
            scheme = self.name(),
            won,
            step = state.step,
            stake = %state.current,
            losing_streak = state.losing_streak,
            "Stake state adjusted"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
