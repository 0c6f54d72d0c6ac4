//! CSV export of the trade log.

use crate::domain::error::TradeflowError;
use crate::domain::trade::{Trade, TriState};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct TradeRow<'a> {
    id: &'a str,
    date: &'a str,
    time: &'a str,
    pair: &'a str,
    trade_type: &'a str,
    bias: &'a str,
    range_type: &'a str,
    poi_type: &'a str,
    entry_type: &'a str,
    entry_price: &'a str,
    stop_loss: &'a str,
    take_profit: &'a str,
    rr_ratio: f64,
    lot_size: &'a str,
    poi_tapped: &'static str,
    choch_confirmed: &'static str,
    outcome: &'static str,
    profit_loss: &'a str,
    emotion: &'a str,
    followed_rules: &'static str,
    mistakes: &'a str,
}

fn flag(state: TriState) -> &'static str {
    match state {
        TriState::Yes => "yes",
        TriState::No => "no",
        TriState::Unanswered => "",
    }
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(t: &'a Trade) -> Self {
        Self {
            id: &t.id,
            date: &t.date,
            time: t.time.as_deref().unwrap_or(""),
            pair: &t.pair,
            trade_type: &t.trade_type,
            bias: &t.bias,
            range_type: &t.range_type,
            poi_type: &t.poi_type,
            entry_type: &t.entry_type,
            entry_price: &t.entry_price,
            stop_loss: &t.stop_loss,
            take_profit: &t.take_profit,
            rr_ratio: t.rr_ratio,
            lot_size: &t.lot_size,
            poi_tapped: flag(t.poi_tapped),
            choch_confirmed: flag(t.choch_confirmed),
            outcome: t.outcome.label(),
            profit_loss: &t.profit_loss,
            emotion: &t.emotion,
            followed_rules: flag(t.followed_rules),
            mistakes: &t.mistakes,
        }
    }
}

/// Write one header row and one row per trade.
pub fn write_trades<'t, W: Write>(
    writer: W,
    trades: impl IntoIterator<Item = &'t Trade>,
) -> Result<usize, TradeflowError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut count = 0usize;
    for trade in trades {
        wtr.serialize(TradeRow::from(trade))
            .map_err(|e| TradeflowError::Store {
                reason: format!("CSV write error: {}", e),
            })?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

pub fn export_trades<'t, P: AsRef<Path>>(
    path: P,
    trades: impl IntoIterator<Item = &'t Trade>,
) -> Result<usize, TradeflowError> {
    let file = File::create(path.as_ref())?;
    write_trades(file, trades)
}
