//! Bounded history of observed results and the ratios shown alongside it.

use serde::Serialize;
use std::collections::VecDeque;

use crate::types::{Direction, LineCount, Parity, RoundResult};

/// Results kept for display.
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// Largest history a configuration may ask for.
pub const MAX_HISTORY_LEN: usize = 1000;

/// One observed round, annotated with how our wager on it fared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub result: RoundResult,
    /// Correct single picks, if the round was settled.
    pub correct_picks: Option<usize>,
    pub won: Option<bool>,
}

/// Most recent results, newest first.
pub struct RoundHistory {
    rows: VecDeque<HistoryRow>,
    capacity: usize,
}

impl Default for RoundHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl RoundHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: VecDeque::with_capacity(capacity.min(MAX_HISTORY_LEN) + 1),
            capacity,
        }
    }

    pub fn push(&mut self, row: HistoryRow) {
        self.rows.push_front(row);
        self.rows.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryRow> {
        self.rows.front()
    }

    pub fn rows(&self) -> impl Iterator<Item = &HistoryRow> {
        self.rows.iter()
    }

    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats::default();
        for row in &self.rows {
            let r = &row.result;
            stats.total += 1;
            match r.direction {
                Direction::Left => stats.left += 1,
                Direction::Right => stats.right += 1,
            }
            match r.lines {
                LineCount::Three => stats.three += 1,
                LineCount::Four => stats.four += 1,
            }
            match r.parity {
                Parity::Odd => stats.odd += 1,
                Parity::Even => stats.even += 1,
            }
        }
        stats
    }
}

/// Attribute counts over the history window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub left: usize,
    pub right: usize,
    pub three: usize,
    pub four: usize,
    pub odd: usize,
    pub even: usize,
}

impl HistoryStats {
    /// `count` as a percentage of the window. 0.0 when empty.
    pub fn pct(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}
