//! Position sizing and risk/reward calculation.
//!
//! Converts an account balance, a risk tolerance and two price levels into a
//! lot size for a given pair. All functions are pure.

use super::error::SizingError;
use super::pair::ForexPair;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Raw calculator inputs, exactly as typed.
#[derive(Debug, Clone, Copy)]
pub struct SizingInput<'a> {
    pub account_balance: &'a str,
    pub risk_percent: &'a str,
    pub entry_price: &'a str,
    pub stop_loss: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizeResult {
    pub risk_amount: f64,
    pub price_difference: f64,
    /// Display value, rounded to one decimal.
    pub pip_count: f64,
    /// Rounded to two decimals.
    pub lot_size: f64,
    pub direction: Direction,
    /// Set when the unrounded pip distance is below one pip.
    pub small_pip_warning: bool,
}

/// Parse a numeric field; blank, malformed and non-finite text count as absent.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Size a position from typed inputs.
///
/// Returns `Ok(None)` when any field is not a number yet, so callers can show
/// an idle state instead of an error.
pub fn compute_position_size(
    input: &SizingInput<'_>,
    pair: &ForexPair,
) -> Result<Option<PositionSizeResult>, SizingError> {
    let (Some(balance), Some(risk), Some(entry), Some(stop)) = (
        parse_decimal(input.account_balance),
        parse_decimal(input.risk_percent),
        parse_decimal(input.entry_price),
        parse_decimal(input.stop_loss),
    ) else {
        return Ok(None);
    };

    size_position(balance, risk, entry, stop, pair).map(Some)
}

/// Size a position from already-parsed values.
pub fn size_position(
    account_balance: f64,
    risk_percent: f64,
    entry_price: f64,
    stop_loss: f64,
    pair: &ForexPair,
) -> Result<PositionSizeResult, SizingError> {
    if account_balance <= 0.0
        || risk_percent <= 0.0
        || risk_percent > 100.0
        || entry_price <= 0.0
        || stop_loss <= 0.0
    {
        return Err(SizingError::OutOfRange);
    }

    if entry_price == stop_loss {
        return Err(SizingError::EqualPrices);
    }

    let risk_amount = account_balance * (risk_percent / 100.0);
    let price_difference = (entry_price - stop_loss).abs();
    let pip_count = price_difference / pair.pip_step;

    if pip_count == 0.0 {
        return Err(SizingError::ZeroPipDistance);
    }

    let lot_size = round_to(risk_amount / (pip_count * pair.pip_value_per_standard_lot), 2);
    if !lot_size.is_finite() {
        return Err(SizingError::OutOfRange);
    }

    Ok(PositionSizeResult {
        risk_amount,
        price_difference,
        pip_count: round_to(pip_count, 1),
        lot_size,
        direction: if entry_price > stop_loss {
            Direction::Long
        } else {
            Direction::Short
        },
        small_pip_warning: pip_count < 1.0,
    })
}

pub fn is_high_risk(risk_percent: f64, threshold: f64) -> bool {
    risk_percent > threshold
}

/// Reward distance over risk distance, rounded to two decimals.
pub fn risk_reward_ratio(entry_price: &str, stop_loss: &str, take_profit: &str) -> Option<f64> {
    let entry = parse_decimal(entry_price)?;
    let stop = parse_decimal(stop_loss)?;
    let target = parse_decimal(take_profit)?;
    if entry == stop {
        return None;
    }
    let risk = (entry - stop).abs();
    let reward = (target - entry).abs();
    Some(round_to(reward / risk, 2))
}
