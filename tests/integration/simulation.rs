//! Session simulation.
//!
//! Drives whole sessions through scripted feeds and checks the account
//! and ledger invariants that must hold across any sequence of ticks.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use ladder::engine::poller::{poll_once, PollOutcome};
use ladder::engine::session::{Session, SessionSettings, TickOutcome};
use ladder::strategy::stake::StakeScheme;
use ladder::strategy::{StrategyConfig, StrategyMode};

use crate::scripted_feed::{result, ScriptedFeed, Step};

fn session_with(strategy: StrategyConfig) -> Mutex<Session> {
    Mutex::new(
        Session::new(SessionSettings {
            strategy,
            ..SessionSettings::default()
        })
        .unwrap(),
    )
}

/// A balance no generated losing streak can exhaust.
fn rich_session_with(strategy: StrategyConfig) -> Mutex<Session> {
    Mutex::new(
        Session::new(SessionSettings {
            initial_balance: dec!(100000000),
            strategy,
            ..SessionSettings::default()
        })
        .unwrap(),
    )
}

async fn run(feed: &ScriptedFeed, session: &Mutex<Session>, ticks: usize) -> Vec<PollOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..ticks {
        if let Ok(outcome) = poll_once(feed, session).await {
            outcomes.push(outcome);
        }
    }
    outcomes
}

/// balance == initial - escrowed (net of refunds) + credited payouts
fn assert_balance_identity(session: &Session) {
    let account = session.account();
    assert_eq!(
        account.balance,
        account.initial_balance - account.total_staked + account.total_won
    );
}

/// Deterministic pseudo-random results.
fn generated_rows(start: u64, count: u64) -> Vec<(u64, &'static str, u64, &'static str)> {
    let mut seed: u32 = 0x2545_f491;
    (start..start + count)
        .map(|round| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let bits = seed >> 16;
            (
                round,
                if bits & 1 == 0 { "LEFT" } else { "RIGHT" },
                if bits & 2 == 0 { 3 } else { 4 },
                if bits & 4 == 0 { "ODD" } else { "EVEN" },
            )
        })
        .collect()
}

#[tokio::test]
async fn test_first_win_pays_115800() {
    let feed = ScriptedFeed::from_rows(&[(100, "RIGHT", 4, "EVEN"), (101, "LEFT", 3, "ODD")]);
    let session = session_with(StrategyConfig::default());

    let outcomes = run(&feed, &session, 2).await;
    let PollOutcome::Applied(TickOutcome::Advanced { settlement, .. }) = &outcomes[1] else {
        panic!("expected the second tick to advance");
    };
    let report = settlement.as_ref().unwrap();
    assert_eq!(report.settlement.win_amount, dec!(115800));
    assert_eq!(report.settlement.correct_picks, 3);

    let guard = session.lock().await;
    assert_eq!(guard.account().wins, 1);
    assert_balance_identity(&guard);
}

#[tokio::test]
async fn test_long_run_keeps_ledger_consistent() {
    let rows = generated_rows(1000, 60);
    let feed = ScriptedFeed::from_rows(&rows);
    let session = rich_session_with(StrategyConfig::default());

    run(&feed, &session, rows.len()).await;

    let guard = session.lock().await;
    assert_eq!(guard.current_round(), Some(1059));
    assert_eq!(guard.account().rounds_settled(), 59);
    assert_balance_identity(&guard);

    // Retention: 20 closed entries plus the pending one for 1060.
    assert_eq!(guard.ledger().len(), 21);
    assert_eq!(guard.history().len(), 20);
    for entry in guard.ledger().recent() {
        assert_eq!(entry.total_stake, entry.stake_sum());
        if let Some(s) = entry.settlement() {
            assert_eq!(s.net_profit, s.win_amount - s.total_stake);
        }
    }
}

#[tokio::test]
async fn test_repeated_round_settles_once() {
    let feed = ScriptedFeed::from_rows(&[(100, "LEFT", 3, "ODD"), (101, "LEFT", 4, "EVEN")]);
    let session = session_with(StrategyConfig::default());

    // The script ends after two rows; the feed keeps serving round 101.
    let outcomes = run(&feed, &session, 6).await;
    let unchanged = outcomes
        .iter()
        .filter(|o| matches!(o, PollOutcome::Applied(TickOutcome::Unchanged { round: 101 })))
        .count();
    assert_eq!(unchanged, 4);
    assert_eq!(feed.calls(), 6);

    let guard = session.lock().await;
    assert_eq!(guard.account().rounds_settled(), 1);
    assert_eq!(guard.ledger().len(), 2);
    assert_balance_identity(&guard);
}

#[tokio::test]
async fn test_feed_outage_voids_missed_round() {
    let feed = ScriptedFeed::new(vec![
        Step::Result(result((100, "LEFT", 3, "ODD"))),
        Step::Fail("timeout".into()),
        Step::Empty,
        Step::Result(result((103, "RIGHT", 4, "EVEN"))),
    ]);
    let session = session_with(StrategyConfig::default());

    let outcomes = run(&feed, &session, 4).await;
    // The failing tick produces no outcome.
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[1], PollOutcome::Empty));

    let guard = session.lock().await;
    assert_eq!(guard.current_round(), Some(103));
    assert_eq!(guard.account().voided, 1);
    assert_eq!(guard.account().rounds_settled(), 0);
    assert!(guard.pending_prediction().is_some());
    assert_balance_identity(&guard);
}

#[tokio::test]
async fn test_stale_round_ignored() {
    let feed = ScriptedFeed::from_rows(&[
        (100, "LEFT", 3, "ODD"),
        (101, "LEFT", 3, "ODD"),
        (99, "RIGHT", 4, "EVEN"),
    ]);
    let session = session_with(StrategyConfig::default());

    let outcomes = run(&feed, &session, 3).await;
    assert!(matches!(
        outcomes[2],
        PollOutcome::Applied(TickOutcome::Stale { observed: 99, current: 101 })
    ));
    assert_eq!(session.lock().await.current_round(), Some(101));
}

#[tokio::test]
async fn test_strategy_switch_between_ticks() {
    let feed = ScriptedFeed::from_rows(&[(100, "LEFT", 3, "ODD")]);
    let session = session_with(StrategyConfig::default());
    run(&feed, &session, 1).await;

    let before = session.lock().await.account().balance;
    let replacement = session
        .lock()
        .await
        .reconfigure(StrategyConfig {
            mode: StrategyMode::Custom,
            custom_picks: vec!["RIGHT".into(), "4".into(), "EVEN".into()],
            stake: StakeScheme::Martingale {
                ladder: ladder::strategy::stake::default_ladder(),
                hedge: dec!(5000),
            },
            ..StrategyConfig::default()
        })
        .unwrap();
    assert_eq!(replacement.refunded, Some(dec!(75000)));
    // 3 x 10000 + 5000 hedge
    assert_eq!(replacement.committed.as_ref().unwrap().total_stake, dec!(35000));

    {
        let guard = session.lock().await;
        assert_eq!(guard.account().balance, before + dec!(75000) - dec!(35000));
        let pending = guard.pending_prediction().unwrap();
        assert_eq!(pending.scheme, "martingale");
        assert_eq!(pending.label, "custom:RIGHT-4-EVEN");
    }

    feed.push(Step::Result(result((101, "RIGHT", 4, "EVEN"))));
    run(&feed, &session, 1).await;

    let guard = session.lock().await;
    let settled = guard.ledger().get(101).unwrap().settlement().unwrap();
    // 3 x 19300 + 5000 x 3.6
    assert_eq!(settled.win_amount, dec!(75900));
    assert!(settled.won);
    assert_eq!(guard.account().stake.step, 0);
    assert_balance_identity(&guard);
}

#[tokio::test]
async fn test_martingale_step_bounded_over_long_run() {
    let rows = generated_rows(1, 300);
    let feed = ScriptedFeed::from_rows(&rows);
    let session = rich_session_with(StrategyConfig {
        stake: StakeScheme::Martingale {
            ladder: ladder::strategy::stake::default_ladder(),
            hedge: dec!(5000),
        },
        ..StrategyConfig::default()
    });

    for _ in 0..rows.len() {
        poll_once(&feed, &session).await.unwrap();
        let guard = session.lock().await;
        assert!(guard.account().stake.step <= 9);
    }
    assert_balance_identity(&*session.lock().await);
}

#[tokio::test]
async fn test_rotation_period_in_ledger() {
    let rows = generated_rows(1, 7);
    let feed = ScriptedFeed::from_rows(&rows);
    let session = rich_session_with(StrategyConfig::default());
    run(&feed, &session, rows.len()).await;

    let guard = session.lock().await;
    let labels: Vec<String> = (2..=8)
        .map(|round| guard.ledger().get(round).unwrap().label.clone())
        .collect();
    assert_eq!(labels[0], "rotation:LEFT-3-ODD");
    assert_eq!(labels[1], "rotation:RIGHT-4-EVEN");
    assert_eq!(labels[2], "rotation:LEFT-4");
    assert_eq!(labels[0], labels[3]);
    assert_eq!(labels[1], labels[4]);
    assert_eq!(labels[3], labels[6]);
}

#[tokio::test]
async fn test_low_balance_stops_wagering() {
    let rows = generated_rows(1, 5);
    let feed = ScriptedFeed::from_rows(&rows);
    let session = Mutex::new(
        Session::new(SessionSettings {
            initial_balance: dec!(50000),
            ..SessionSettings::default()
        })
        .unwrap(),
    );
    run(&feed, &session, rows.len()).await;

    let guard = session.lock().await;
    assert_eq!(guard.account().balance, dec!(50000));
    assert_eq!(guard.account().total_staked, Decimal::ZERO);
    assert!(guard.ledger().is_empty());
    assert_eq!(guard.current_round(), Some(5));
}
