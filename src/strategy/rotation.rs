//! Fixed-pattern rotation.
//!
//! Cycles through an ordered list of pair/triple patterns, one step per
//! prediction, wrapping at the end of the list.

use tracing::debug;

use super::{validate_pattern, Pattern, PickStrategy, StrategyMode};
use crate::types::{Direction, LadderError, LineCount, Parity, Pick};

/// Default rotation: period 3.
pub fn default_rotation() -> Vec<Vec<Pick>> {
    vec![
        vec![
            Pick::Direction(Direction::Left),
            Pick::Lines(LineCount::Three),
            Pick::Parity(Parity::Odd),
        ],
        vec![
            Pick::Direction(Direction::Right),
            Pick::Lines(LineCount::Four),
            Pick::Parity(Parity::Even),
        ],
        vec![Pick::Direction(Direction::Left), Pick::Lines(LineCount::Four)],
    ]
}

pub struct RotationStrategy {
    patterns: Vec<Vec<Pick>>,
    index: usize,
}

impl RotationStrategy {
    pub fn new(patterns: Vec<Vec<Pick>>) -> Result<Self, LadderError> {
        if patterns.is_empty() {
            return Err(LadderError::Strategy("rotation list is empty".into()));
        }
        for pattern in &patterns {
            if pattern.is_empty() {
                return Err(LadderError::Strategy("rotation pattern has no picks".into()));
            }
            validate_pattern(pattern)?;
        }
        Ok(Self { patterns, index: 0 })
    }

    /// Number of patterns in one full cycle.
    pub fn period(&self) -> usize {
        self.patterns.len()
    }
}

impl PickStrategy for RotationStrategy {
    fn mode(&self) -> StrategyMode {
        StrategyMode::Rotation
    }

    fn next_pattern(&mut self) -> Pattern {
        let picks = self.patterns[self.index].clone();
        debug!(index = self.index, period = self.period(), "Rotation step");
        self.index = (self.index + 1) % self.patterns.len();
        Pattern::new(picks)
    }
}
