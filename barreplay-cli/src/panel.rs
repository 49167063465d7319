//! Text rendering for the status panel and the settlement report.

use barreplay_core::domain::day_label;
use barreplay_core::indicators::latest_averages;
use barreplay_core::{Session, SettlementReport, Trade, TradeAction};
use barreplay_runner::{HistoryEntry, HistorySummary};
use std::fmt::Write;

fn pct(rate: f64) -> String {
    format!("{:+.2}%", rate * 100.0)
}

pub fn status(session: &Session, default_volume: u64) -> String {
    let mut out = String::new();
    let bar = session.current_bar();

    let _ = writeln!(
        out,
        "── {} {} ── {} ── {} days left ──",
        session.ticker(),
        day_label(session.day_count() as i64),
        bar.date,
        session.remaining_days()
    );
    let _ = writeln!(
        out,
        "Close {:>10.2}  ({:+.2}%)   O {:.2}  H {:.2}  L {:.2}  Vol {}",
        bar.close, bar.change_pct, bar.open, bar.high, bar.low, bar.volume
    );

    let mas: Vec<String> = latest_averages(session.visible_bars())
        .into_iter()
        .map(|(period, value)| match value {
            Some(v) => format!("MA{period} {v:.2}"),
            None => format!("MA{period} -"),
        })
        .collect();
    let _ = writeln!(out, "{}", mas.join("  "));

    let _ = writeln!(
        out,
        "Assets {:>14.2}   Return {:>8}   Position {:>6.1}%",
        session.total_assets(),
        pct(session.total_return_rate()),
        session.position_ratio() * 100.0
    );
    let _ = write!(
        out,
        "Cash   {:>14.2}   Holdings {:>8}   Avg cost {:.2}",
        session.cash(),
        session.holdings(),
        session.avg_cost()
    );
    if session.holdings() > 0 {
        let _ = write!(out, "   Unrealized {}", pct(session.unrealized_return()));
    }
    let _ = writeln!(out);

    let preview = session.order_preview(default_volume);
    let _ = write!(
        out,
        "Order  {} shares = {:.2} ({:.2}% of assets)   max buy {}",
        preview.volume,
        preview.amount,
        preview.share_of_assets * 100.0,
        session.max_affordable_volume()
    );
    if session.order_placed_today() {
        let _ = write!(out, "   [order placed today]");
    }
    out
}

pub fn trade_line(trade: &Trade) -> String {
    let verb = match trade.action {
        TradeAction::Buy => "Bought",
        TradeAction::Sell => "Sold",
    };
    let mut line = format!(
        "{verb} {} @ {:.2} = {:.2} on {} ({})",
        trade.volume,
        trade.price,
        trade.amount(),
        trade.date,
        trade.day_label()
    );
    if let Some(rate) = trade.profit_rate {
        let _ = write!(line, "  profit {}", pct(rate));
    }
    line
}

pub fn report(report: &SettlementReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "=== Settlement: {} ===", report.ticker);
    let _ = writeln!(out, "Days played:    {}", report.total_days);
    let _ = writeln!(out, "Initial cash:   {:.2}", report.initial_cash);
    let _ = writeln!(out, "Final assets:   {:.2}", report.final_assets);
    let _ = writeln!(out);
    let _ = writeln!(out, "--- Performance ---");
    let _ = writeln!(out, "Total Return:   {}", pct(report.total_return_rate));
    let _ = writeln!(out, "Max Drawdown:   {:.2}%", report.max_drawdown * 100.0);
    let _ = writeln!(out, "Win Rate:       {:.1}%", report.win_rate * 100.0);
    let _ = writeln!(out, "Avg Win:        {}", pct(report.avg_win_rate));
    let _ = writeln!(out, "Avg Loss:       {}", pct(report.avg_loss_rate));
    let _ = writeln!(
        out,
        "Trades:         {} sells, {} buys",
        report.total_trades, report.buy_count
    );

    if !report.trade_log.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "--- Trade Log ---");
        let _ = writeln!(
            out,
            "{:<7} {:<10} {:<5} {:>10} {:>9} {:>14} {:>9}",
            "Day", "Date", "Side", "Price", "Volume", "Amount", "Profit"
        );
        let _ = writeln!(out, "{}", "-".repeat(70));
        for t in &report.trade_log {
            let profit = t.profit_rate.map(pct).unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<7} {:<10} {:<5} {:>10.2} {:>9} {:>14.2} {:>9}",
                t.day_label(),
                t.date.to_string(),
                t.action.to_string(),
                t.price,
                t.volume,
                t.amount(),
                profit
            );
        }
    }
    out
}

/// Recorded games, oldest first, followed by the summary over all of them.
pub fn history(entries: &[HistoryEntry], summary: &HistorySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<17} {:<10} {:<10} {:>6} {:>10} {:>9} {:>7}",
        "Finished", "Ticker", "Start", "Days", "Return", "Max DD", "Sells"
    );
    let _ = writeln!(out, "{}", "-".repeat(75));
    for e in entries {
        let start = e.start_date.map(|d| d.to_string()).unwrap_or_default();
        let ticker = if e.synthetic {
            format!("{}*", e.ticker)
        } else {
            e.ticker.clone()
        };
        let _ = writeln!(
            out,
            "{:<17} {:<10} {:<10} {:>6} {:>10} {:>8.2}% {:>7}",
            e.finished_at.format("%Y-%m-%d %H:%M"),
            ticker,
            start,
            e.total_days,
            pct(e.total_return_rate),
            e.max_drawdown * 100.0,
            e.total_trades
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "=== {} games ===", summary.games);
    let _ = writeln!(out, "Profitable:     {}", summary.profitable);
    let _ = writeln!(out, "Mean Return:    {}", pct(summary.mean_return_rate));
    let _ = writeln!(out, "Best Return:    {}", pct(summary.best_return_rate));
    let _ = writeln!(out, "Worst Return:   {}", pct(summary.worst_return_rate));
    if entries.iter().any(|e| e.synthetic) {
        let _ = writeln!(out, "* synthetic data");
    }
    out
}
