//! User-selected picks.

use tracing::warn;

use super::{Pattern, PickStrategy, StrategyMode};
use crate::types::{LadderError, Pick, PickKind};

/// Slot value meaning "no pick".
pub const NONE_SENTINEL: &str = "NONE";

pub fn default_custom_picks() -> Vec<String> {
    vec!["LEFT".into(), "3".into(), NONE_SENTINEL.into()]
}

/// Always predicts the same user-chosen picks.
pub struct CustomStrategy {
    picks: Vec<Pick>,
}

impl CustomStrategy {
    /// Classify each slot by attribute kind; the first value of each kind
    /// wins, later values of the same kind are ignored.
    pub fn from_slots(slots: &[String]) -> Result<Self, LadderError> {
        let mut parsed: Vec<Pick> = Vec::new();
        for slot in slots {
            let slot = slot.trim();
            if slot.is_empty() || slot.eq_ignore_ascii_case(NONE_SENTINEL) {
                continue;
            }
            parsed.push(slot.parse()?);
        }

        let mut picks = Vec::new();
        for kind in PickKind::ALL {
            let mut of_kind = parsed.iter().filter(|p| p.kind() == *kind);
            if let Some(first) = of_kind.next() {
                picks.push(*first);
            }
            for ignored in of_kind {
                warn!(kind = %kind, pick = %ignored, "Duplicate custom pick ignored");
            }
        }

        Ok(Self { picks })
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }
}

impl PickStrategy for CustomStrategy {
    fn mode(&self) -> StrategyMode {
        StrategyMode::Custom
    }

    fn next_pattern(&mut self) -> Pattern {
        Pattern::new(self.picks.clone())
    }
}
