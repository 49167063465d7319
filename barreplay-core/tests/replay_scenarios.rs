//! End-to-end replay scenarios: pick a game, trade through it, settle.

use barreplay_core::data::{pick_game, synthetic_source, CsvDirectory, EligibilityPolicy, game_rng};
use barreplay_core::{
    AdvanceResult, Bar, BarSeries, DayAction, OrderError, Session, SessionConfig, TradeAction,
};
use chrono::{Duration, NaiveDate};

fn series(closes: &[f64]) -> BarSeries {
    let base = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
            turnover_rate: Some(1.0),
            pe: Some(10.0),
            pb: Some(1.0),
            change_pct: 0.0,
        })
        .collect();
    BarSeries::new("600519", bars)
}

#[test]
fn million_cash_scenario() {
    let mut session = Session::new(series(&[10.0, 12.0, 12.0]), 0, SessionConfig::default()).unwrap();

    let outcome = session.step(DayAction::Buy(100)).unwrap();
    assert_eq!(session.cash(), 999_000.0);
    assert_eq!(session.holdings(), 100);
    assert_eq!(session.avg_cost(), 10.0);
    assert_eq!(
        outcome.advance,
        AdvanceResult::Advanced {
            day: 1,
            total_assets: 1_000_200.0
        }
    );
    assert_eq!(session.assets_history(), &[1_000_000.0, 1_000_200.0]);

    let outcome = session.step(DayAction::Sell(100)).unwrap();
    let sell = outcome.trade.unwrap();
    assert_eq!(sell.action, TradeAction::Sell);
    assert!((sell.profit_rate.unwrap() - 0.2).abs() < 1e-12);
    assert_eq!(session.cash(), 1_000_200.0);
    assert_eq!(session.holdings(), 0);
    assert_eq!(session.avg_cost(), 0.0);
}

#[test]
fn one_win_one_loss_playthrough() {
    // buy @10, sell @12 (+20%), buy @10, sell @9 (-10%)
    let mut session =
        Session::new(series(&[10.0, 12.0, 10.0, 9.0, 9.0]), 0, SessionConfig::default()).unwrap();
    for action in [
        DayAction::Buy(1_000),
        DayAction::Sell(1_000),
        DayAction::Buy(1_000),
        DayAction::Sell(1_000),
    ] {
        session.step(action).unwrap();
    }

    let report = session.settle();
    assert!((report.win_rate - 0.5).abs() < 1e-12);
    assert!((report.avg_win_rate - 0.2).abs() < 1e-12);
    assert!((report.avg_loss_rate - (-0.1)).abs() < 1e-12);
    assert_eq!(report.total_trades, 2);
    assert_eq!(report.total_days, 4);
    assert_eq!(report.assets_history.len(), 5);
    assert_eq!(report.final_assets, 1_001_000.0);
}

#[test]
fn observe_only_playthrough_settles_flat() {
    let mut session = Session::new(series(&[10.0, 11.0, 9.0]), 0, SessionConfig::default()).unwrap();
    while !session.step(DayAction::Observe).unwrap().advance.is_end_of_data() {}

    let report = session.settle();
    assert_eq!(report.total_days, 2);
    assert_eq!(report.final_assets, 1_000_000.0);
    assert_eq!(report.total_return_rate, 0.0);
    assert_eq!(report.max_drawdown, 0.0);
    assert_eq!(report.win_rate, 0.0);
    assert_eq!(report.avg_win_rate, 0.0);
    assert_eq!(report.avg_loss_rate, 0.0);
    assert_eq!(report.total_trades, 0);
}

#[test]
fn drawdown_follows_held_position() {
    // all-in at 10, ride to 12, fall to 9
    let config = SessionConfig {
        initial_cash: 1_000.0,
        lot_size: 100,
    };
    let mut session = Session::new(series(&[10.0, 12.0, 9.0]), 0, config).unwrap();
    session.step(DayAction::Buy(100)).unwrap();
    session.step(DayAction::Observe).unwrap();

    let report = session.settle();
    assert_eq!(report.assets_history, vec![1_000.0, 1_200.0, 900.0]);
    assert!((report.max_drawdown - 0.25).abs() < 1e-12);
    assert!((report.total_return_rate - (-0.1)).abs() < 1e-12);
}

#[test]
fn insufficient_funds_reports_amounts() {
    let config = SessionConfig {
        initial_cash: 500.0,
        lot_size: 100,
    };
    let mut session = Session::new(series(&[10.0, 11.0]), 0, config).unwrap();
    let err = session.step(DayAction::Buy(100)).unwrap_err();
    assert_eq!(
        err,
        OrderError::InsufficientFunds {
            required: 1_000.0,
            available: 500.0
        }
    );
    assert_eq!(session.day_count(), 0);
}

#[test]
fn picked_synthetic_game_plays_to_the_end() {
    let source = synthetic_source(4, 1_100, 5);
    let game = pick_game(&source, &EligibilityPolicy::default(), &mut game_rng(Some(21))).unwrap();
    let remaining = game.remaining_bars();

    let mut session = Session::new(game.series, game.start_index, SessionConfig::default()).unwrap();
    let mut day = 0usize;
    loop {
        let action = match day % 10 {
            0 => DayAction::Buy(1_000),
            5 => DayAction::Sell(1_000),
            _ => DayAction::Observe,
        };
        let outcome = session.step(action).unwrap();
        if outcome.advance.is_end_of_data() {
            break;
        }
        day += 1;
    }

    let report = session.settle();
    assert_eq!(report.total_days, remaining - 1);
    assert_eq!(report.assets_history.len(), remaining);
    assert!(report.total_trades > 0);
}

#[test]
fn csv_directory_feeds_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("date,open,close,high,low,change_pct,volume,turnover_rate,pe,pb\n");
    let base = NaiveDate::from_ymd_opt(2019, 1, 2).unwrap();
    for i in 0..40 {
        let date = base + Duration::days(i);
        let close = 10.0 + i as f64 * 0.1;
        csv.push_str(&format!("{date},{close},{close},{close},{close},0.5,1000,1.0,12,1.2\n"));
    }
    std::fs::write(dir.path().join("000002.csv"), csv).unwrap();

    let policy = EligibilityPolicy {
        min_history: 5,
        min_remaining: 10,
        lookback: 5,
        ..EligibilityPolicy::default()
    };
    let source = CsvDirectory::new(dir.path());
    let game = pick_game(&source, &policy, &mut game_rng(Some(1))).unwrap();
    assert_eq!(game.ticker(), "000002");
    assert!(game.start_index <= 5);
    assert!(game.remaining_bars() >= 10);

    let session = Session::new(game.series, game.start_index, SessionConfig::default()).unwrap();
    assert_eq!(session.visible_bars().len(), game.start_index + 1);
}
