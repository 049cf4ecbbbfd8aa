//! Scripted result feed for integration testing.
//!
//! Replays a fixed queue of responses in order, entirely in memory. Once
//! the script runs out, the last result keeps being served, the way the
//! live endpoint repeats the latest round between draws.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ladder::feed::ResultFeed;
use ladder::types::{Direction, LineCount, Parity, RoundResult};

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Step {
    Result(RoundResult),
    Empty,
    Fail(String),
}

pub struct ScriptedFeed {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Option<RoundResult>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedFeed {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Build a script from compact `(round, "LEFT"/"RIGHT", 3|4, "ODD"/"EVEN")` rows.
    pub fn from_rows(rows: &[(u64, &str, u64, &str)]) -> Self {
        Self::new(rows.iter().map(|r| Step::Result(result(*r))).collect())
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

pub fn result((round, side, lines, parity): (u64, &str, u64, &str)) -> RoundResult {
    RoundResult::new(
        round,
        if side == "LEFT" { Direction::Left } else { Direction::Right },
        LineCount::from_u64(lines).unwrap(),
        if parity == "ODD" { Parity::Odd } else { Parity::Even },
    )
}

#[async_trait]
impl ResultFeed for ScriptedFeed {
    async fn latest(&self) -> Result<Option<RoundResult>> {
        *self.calls.lock().unwrap() += 1;

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Result(r)) => {
                *self.last.lock().unwrap() = Some(r);
                Ok(Some(r))
            }
            Some(Step::Empty) => Ok(None),
            Some(Step::Fail(msg)) => Err(anyhow!("{msg}")),
            None => Ok(*self.last.lock().unwrap()),
        }
    }
}
