//! Strategy engine: pick selection and stake sizing.
//!
//! A `Predictor` pairs a `PickStrategy` (which attributes to bet on) with a
//! `StakeScheme` (how much to put on each) and a fixed set of hedge
//! combinations, and turns them into a ledger entry for the next round.

pub mod custom;
pub mod rotation;
pub mod stake;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

use crate::engine::ledger::RoundLedgerEntry;
use crate::types::{
    ComboWager, Direction, LadderError, LineCount, Pick, RoundId, StakeState, WagerEntry,
};
use custom::{default_custom_picks, CustomStrategy};
use rotation::{default_rotation, RotationStrategy};
use stake::StakeScheme;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Picks chosen for one round, without stakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub label: String,
    pub picks: Vec<Pick>,
}

impl Pattern {
    pub fn new(picks: Vec<Pick>) -> Self {
        let label = if picks.is_empty() {
            "hedge-only".to_string()
        } else {
            picks
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("-")
        };
        Self { label, picks }
    }
}

/// At most one pick per attribute kind.
pub fn validate_pattern(picks: &[Pick]) -> Result<(), LadderError> {
    let mut seen = HashSet::new();
    for pick in picks {
        if !seen.insert(pick.kind()) {
            return Err(LadderError::Strategy(format!(
                "pattern {picks:?} has more than one {} pick",
                pick.kind()
            )));
        }
    }
    Ok(())
}

/// Pick selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    #[default]
    Rotation,
    Custom,
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyMode::Rotation => write!(f, "rotation"),
            StrategyMode::Custom => write!(f, "custom"),
        }
    }
}

/// Chooses which attributes to bet on for the next round.
pub trait PickStrategy: Send {
    fn mode(&self) -> StrategyMode;

    /// Produce the next pattern, advancing any internal rotation.
    fn next_pattern(&mut self) -> Pattern;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn default_hedges() -> Vec<[Pick; 2]> {
    vec![[
        Pick::Direction(Direction::Right),
        Pick::Lines(LineCount::Four),
    ]]
}

/// Everything needed to build a `Predictor`. Also the body of the
/// dashboard's strategy switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub mode: StrategyMode,
    #[serde(default = "default_rotation")]
    pub rotation: Vec<Vec<Pick>>,
    #[serde(default = "default_custom_picks")]
    pub custom_picks: Vec<String>,
    #[serde(default = "default_hedges")]
    pub hedges: Vec<[Pick; 2]>,
    #[serde(default)]
    pub stake: StakeScheme,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            mode: StrategyMode::default(),
            rotation: default_rotation(),
            custom_picks: default_custom_picks(),
            hedges: default_hedges(),
            stake: StakeScheme::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Pipelines pick selection → stake sizing → ledger entry.
pub struct Predictor {
    picker: Box<dyn PickStrategy>,
    scheme: StakeScheme,
    hedges: Vec<[Pick; 2]>,
}

impl Predictor {
    pub fn new(picker: Box<dyn PickStrategy>, scheme: StakeScheme, hedges: Vec<[Pick; 2]>) -> Self {
        Self {
            picker,
            scheme,
            hedges,
        }
    }

    /// Validate a configuration and build the matching predictor.
    pub fn from_config(config: &StrategyConfig) -> Result<Self, LadderError> {
        config.stake.validate()?;
        for hedge in &config.hedges {
            if hedge[0].kind() == hedge[1].kind() {
                return Err(LadderError::Strategy(format!(
                    "hedge {}+{} combines the same attribute",
                    hedge[0], hedge[1]
                )));
            }
        }

        let picker: Box<dyn PickStrategy> = match config.mode {
            StrategyMode::Rotation => Box::new(RotationStrategy::new(config.rotation.clone())?),
            StrategyMode::Custom => Box::new(CustomStrategy::from_slots(&config.custom_picks)?),
        };

        Ok(Self::new(picker, config.stake.clone(), config.hedges.clone()))
    }

    pub fn mode(&self) -> StrategyMode {
        self.picker.mode()
    }

    pub fn scheme(&self) -> &StakeScheme {
        &self.scheme
    }

    /// Build the wager set for `round_id`. Does not touch the balance.
    pub fn predict(&mut self, round_id: RoundId, state: &StakeState) -> RoundLedgerEntry {
        let pattern = self.picker.next_pattern();
        let stakes = self.scheme.pick_stakes(pattern.picks.len(), state);

        let picks: Vec<WagerEntry> = pattern
            .picks
            .iter()
            .zip(stakes)
            .map(|(pick, stake)| WagerEntry { pick: *pick, stake })
            .collect();

        let hedge_stake = self.scheme.hedge_stake();
        let combos: Vec<ComboWager> = self
            .hedges
            .iter()
            .map(|picks| ComboWager {
                picks: *picks,
                stake: hedge_stake,
            })
            .collect();

        let entry = RoundLedgerEntry::new(
            round_id,
            format!("{}:{}", self.picker.mode(), pattern.label),
            self.scheme.name(),
            picks,
            combos,
        );

        info!(
            round = round_id,
            pattern = %entry.label,
            scheme = self.scheme.name(),
            total_stake = %entry.total_stake,
            "Prediction built"
        );

        entry
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Parity;
    use rust_decimal_macros::dec;

    fn flat_config() -> StrategyConfig {
        StrategyConfig::default()
    }

    #[test]
    fn test_predict_total_stake_is_sum_of_wagers() {
        let mut predictor = Predictor::from_config(&flat_config()).unwrap();
        let state = predictor.scheme().initial_state();
        let entry = predictor.predict(101, &state);

        assert_eq!(entry.round_id, 101);
        assert_eq!(entry.picks.len(), 3);
        assert_eq!(entry.combos.len(), 1);
        assert_eq!(entry.total_stake, dec!(75000));
        assert_eq!(entry.total_stake, entry.stake_sum());
        assert_eq!(entry.label, "rotation:LEFT-3-ODD");
    }

    #[test]
    fn test_predict_rotates() {
        let mut predictor = Predictor::from_config(&flat_config()).unwrap();
        let state = predictor.scheme().initial_state();
        let labels: Vec<String> = (0..4).map(|i| predictor.predict(i, &state).label).collect();
        assert_eq!(labels[0], labels[3]);
        assert_ne!(labels[0], labels[1]);
        // Pair pattern: two picks + hedge
        let third = &labels[2];
        assert_eq!(third, "rotation:LEFT-4");
    }

    #[test]
    fn test_predict_custom_mode() {
        let config = StrategyConfig {
            mode: StrategyMode::Custom,
            custom_picks: vec!["EVEN".into(), "RIGHT".into(), "NONE".into()],
            ..StrategyConfig::default()
        };
        let mut predictor = Predictor::from_config(&config).unwrap();
        assert_eq!(predictor.mode(), StrategyMode::Custom);
        let state = predictor.scheme().initial_state();
        let entry = predictor.predict(5, &state);
        let picks: Vec<Pick> = entry.picks.iter().map(|w| w.pick).collect();
        assert_eq!(
            picks,
            vec![Pick::Direction(Direction::Right), Pick::Parity(Parity::Even)]
        );
        assert_eq!(entry.total_stake, dec!(55000));
    }

    #[test]
    fn test_predict_martingale_uses_step() {
        let config = StrategyConfig {
            stake: StakeScheme::Martingale {
                ladder: stake::default_ladder(),
                hedge: dec!(5000),
            },
            ..StrategyConfig::default()
        };
        let mut predictor = Predictor::from_config(&config).unwrap();
        let mut state = predictor.scheme().initial_state();
        state.step = 3;
        let entry = predictor.predict(1, &state);
        assert!(entry.picks.iter().all(|w| w.stake == dec!(30000)));
        assert_eq!(entry.total_stake, dec!(95000));
    }

    #[test]
    fn test_from_config_rejects_same_kind_hedge() {
        let config = StrategyConfig {
            hedges: vec![[
                Pick::Parity(Parity::Odd),
                Pick::Parity(Parity::Even),
            ]],
            ..StrategyConfig::default()
        };
        assert!(Predictor::from_config(&config).is_err());
    }

    #[test]
    fn test_strategy_config_from_toml() {
        let config: StrategyConfig = toml::from_str(
            r#"
            mode = "custom"
            custom_picks = ["RIGHT", "4", "NONE"]
            hedges = [["LEFT", "ODD"]]

            [stake]
            scheme = "weighted"
            primary = 40000
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, StrategyMode::Custom);
        assert_eq!(config.rotation.len(), 3);
        assert_eq!(config.stake.name(), "weighted");
        assert!(Predictor::from_config(&config).is_ok());
    }

    #[test]
    fn test_pattern_label() {
        assert_eq!(Pattern::new(vec![]).label, "hedge-only");
        assert_eq!(
            Pattern::new(vec![Pick::Lines(LineCount::Three)]).label,
            "3"
        );
    }
}
