//! Time remaining until the next draw.
//!
//! Draws happen on a fixed wall-clock cycle. Each game publishes with its
//! own offset, so the clock is shifted by that offset before the position
//! inside the cycle is taken.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::Deserialize;
use std::fmt;

/// Cycle length shared by every supported game.
pub const DEFAULT_CYCLE_SECS: u32 = 5 * 60;

/// Supported games and their publishing offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePreset {
    Powerball,
    #[default]
    PowerLadder,
    Speedkeno,
    KenoLadder,
}

impl GamePreset {
    pub fn offset_secs(&self) -> i64 {
        match self {
            GamePreset::Powerball => 25,
            GamePreset::PowerLadder => 29,
            GamePreset::Speedkeno | GamePreset::KenoLadder => 175,
        }
    }
}

impl fmt::Display for GamePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePreset::Powerball => write!(f, "powerball"),
            GamePreset::PowerLadder => write!(f, "power_ladder"),
            GamePreset::Speedkeno => write!(f, "speedkeno"),
            GamePreset::KenoLadder => write!(f, "keno_ladder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    offset_secs: i64,
    cycle_secs: u32,
}

impl Countdown {
    pub fn new(offset_secs: i64, cycle_secs: u32) -> Self {
        Self {
            offset_secs,
            cycle_secs: cycle_secs.max(1),
        }
    }

    pub fn for_game(game: GamePreset) -> Self {
        Self::new(game.offset_secs(), DEFAULT_CYCLE_SECS)
    }

    /// Seconds until the next draw, in `1..=cycle`.
    pub fn remaining_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> u32 {
        let adjusted = now + Duration::seconds(self.offset_secs);
        let elapsed = (adjusted.minute() * 60 + adjusted.second()) % self.cycle_secs;
        self.cycle_secs - elapsed
    }

    /// `remaining_at` split into `(minutes, seconds)`.
    pub fn remaining_parts_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> (u32, u32) {
        let remaining = self.remaining_at(now);
        (remaining / 60, remaining % 60)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::for_game(GamePreset::default())
    }
}
