//! Shared types for the LADDER simulator.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round identifier as published by the result feed.
pub type RoundId = u64;

// ---------------------------------------------------------------------------
// Round attributes
// ---------------------------------------------------------------------------

/// Which side the ladder started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
        }
    }
}

/// Number of rungs in the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCount {
    Three,
    Four,
}

impl LineCount {
    pub fn as_u8(&self) -> u8 {
        match self {
            LineCount::Three => 3,
            LineCount::Four => 4,
        }
    }

    pub fn from_u64(n: u64) -> Option<Self> {
        match n {
            3 => Some(LineCount::Three),
            4 => Some(LineCount::Four),
            _ => None,
        }
    }
}

impl fmt::Display for LineCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Parity of the finishing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Odd => write!(f, "ODD"),
            Parity::Even => write!(f, "EVEN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Round result
// ---------------------------------------------------------------------------

/// One observed round outcome. Immutable once produced by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_id: RoundId,
    pub direction: Direction,
    pub lines: LineCount,
    pub parity: Parity,
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}/{}/{}",
            self.round_id, self.direction, self.lines, self.parity
        )
    }
}

impl RoundResult {
    pub fn new(round_id: RoundId, direction: Direction, lines: LineCount, parity: Parity) -> Self {
        Self {
            round_id,
            direction,
            lines,
            parity,
        }
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// The attribute a pick bets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickKind {
    Direction,
    Lines,
    Parity,
}

impl PickKind {
    pub const ALL: &'static [PickKind] = &[PickKind::Direction, PickKind::Lines, PickKind::Parity];
}

impl fmt::Display for PickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickKind::Direction => write!(f, "direction"),
            PickKind::Lines => write!(f, "lines"),
            PickKind::Parity => write!(f, "parity"),
        }
    }
}

/// A single attribute value to bet on.
///
/// Serialized as its display string (`"LEFT"`, `"3"`, `"ODD"`, ...) so that
/// config files and the dashboard API read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Pick {
    Direction(Direction),
    Lines(LineCount),
    Parity(Parity),
}

impl Pick {
    pub fn kind(&self) -> PickKind {
        match self {
            Pick::Direction(_) => PickKind::Direction,
            Pick::Lines(_) => PickKind::Lines,
            Pick::Parity(_) => PickKind::Parity,
        }
    }

    /// Whether this pick agrees with the observed result.
    pub fn matches(&self, result: &RoundResult) -> bool {
        match self {
            Pick::Direction(d) => *d == result.direction,
            Pick::Lines(l) => *l == result.lines,
            Pick::Parity(p) => *p == result.parity,
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pick::Direction(d) => write!(f, "{d}"),
            Pick::Lines(l) => write!(f, "{l}"),
            Pick::Parity(p) => write!(f, "{p}"),
        }
    }
}

/// Parse a pick from its display string (case-insensitive).
impl std::str::FromStr for Pick {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LEFT" | "L" => Ok(Pick::Direction(Direction::Left)),
            "RIGHT" | "R" => Ok(Pick::Direction(Direction::Right)),
            "3" | "THREE" => Ok(Pick::Lines(LineCount::Three)),
            "4" | "FOUR" => Ok(Pick::Lines(LineCount::Four)),
            "ODD" => Ok(Pick::Parity(Parity::Odd)),
            "EVEN" => Ok(Pick::Parity(Parity::Even)),
            _ => Err(LadderError::InvalidPick(s.to_string())),
        }
    }
}

impl TryFrom<String> for Pick {
    type Error = LadderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pick> for String {
    fn from(pick: Pick) -> Self {
        pick.to_string()
    }
}

// ---------------------------------------------------------------------------
// Wagers
// ---------------------------------------------------------------------------

/// A bet on one attribute of the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerEntry {
    pub pick: Pick,
    pub stake: Decimal,
}

impl WagerEntry {
    pub fn kind(&self) -> PickKind {
        self.pick.kind()
    }
}

impl fmt::Display for WagerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})={}", self.kind(), self.pick, self.stake)
    }
}

/// A hedge bet that only pays when both picks match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboWager {
    pub picks: [Pick; 2],
    pub stake: Decimal,
}

impl ComboWager {
    pub fn matches(&self, result: &RoundResult) -> bool {
        self.picks.iter().all(|p| p.matches(result))
    }
}

impl fmt::Display for ComboWager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}={}", self.picks[0], self.picks[1], self.stake)
    }
}

// ---------------------------------------------------------------------------
// Account state
// ---------------------------------------------------------------------------

/// Internal state of the active stake scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeState {
    /// Martingale ladder position.
    pub step: usize,
    /// Current per-pick stake for the progressive scheme.
    pub current: Decimal,
    /// Consecutive losing rounds.
    pub losing_streak: u32,
}

/// Virtual balance and running statistics. Single owner: the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    pub initial_balance: Decimal,
    pub balance: Decimal,
    pub wins: u64,
    pub losses: u64,
    pub voided: u64,
    pub total_staked: Decimal,
    pub total_won: Decimal,
    pub stake: StakeState,
    pub start_time: DateTime<Utc>,
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance={} | profit={} | rounds={} (W{}/L{}) | win_rate={:.1}%",
            self.balance,
            self.total_profit(),
            self.rounds_settled(),
            self.wins,
            self.losses,
            self.win_rate(),
        )
    }
}

impl AccountState {
    pub fn new(initial_balance: Decimal, stake: StakeState) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            wins: 0,
            losses: 0,
            voided: 0,
            total_staked: Decimal::ZERO,
            total_won: Decimal::ZERO,
            stake,
            start_time: Utc::now(),
        }
    }

    /// Balance change since the session started (pending stakes included).
    pub fn total_profit(&self) -> Decimal {
        self.balance - self.initial_balance
    }

    pub fn rounds_settled(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win rate as a percentage. Returns 0.0 if nothing settled yet.
    pub fn win_rate(&self) -> f64 {
        let settled = self.rounds_settled();
        if settled == 0 {
            0.0
        } else {
            (self.wins as f64 / settled as f64) * 100.0
        }
    }

    /// Take a stake into escrow.
    pub fn escrow(&mut self, amount: Decimal) {
        self.balance -= amount;
        self.total_staked += amount;
    }

    /// Return an escrowed stake (replaced or voided wager).
    pub fn refund(&mut self, amount: Decimal) {
        self.balance += amount;
        self.total_staked -= amount;
    }

    /// Credit a settlement payout and count the round.
    pub fn record_settlement(&mut self, win_amount: Decimal, won: bool) {
        self.balance += win_amount;
        self.total_won += win_amount;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for LADDER.
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("Feed transport error: {0}")]
    Transport(String),

    #[error("Missing field in feed payload: {0}")]
    MissingField(&'static str),

    #[error("Malformed feed payload: {0}")]
    MalformedPayload(String),

    #[error("No ledger entry for round {0}")]
    LedgerEntryNotFound(RoundId),

    #[error("Round {0} is already settled")]
    AlreadySettled(RoundId),

    #[error("Invalid pick: {0}")]
    InvalidPick(String),

    #[error("Strategy error: {0}")]
    Strategy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
