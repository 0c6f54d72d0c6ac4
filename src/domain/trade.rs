//! Canonical journaled trade.

use serde::{Serialize, Serializer};
use std::fmt;

use super::sizing::parse_decimal;

/// Display value for a field that was never filled in.
pub const PLACEHOLDER: &str = "—";

/// A yes/no answer that may not have been given yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unanswered,
    Yes,
    No,
}

impl TriState {
    pub fn as_option(self) -> Option<bool> {
        match self {
            TriState::Unanswered => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }

    pub fn is_answered(self) -> bool {
        self != TriState::Unanswered
    }

    /// Parse CLI-style answers (`yes`/`no`/`true`/`false`/`y`/`n`).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" => Some(TriState::Yes),
            "no" | "n" | "false" => Some(TriState::No),
            "" | "unanswered" | "null" => Some(TriState::Unanswered),
            _ => None,
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => TriState::Unanswered,
            Some(true) => TriState::Yes,
            Some(false) => TriState::No,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Loss,
    BreakEven,
    Unknown,
}

impl Outcome {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "win" => Outcome::Win,
            "loss" => Outcome::Loss,
            "be" | "breakeven" | "break even" => Outcome::BreakEven,
            _ => Outcome::Unknown,
        }
    }

    /// Label used in stored records.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
            Outcome::BreakEven => "BE",
            Outcome::Unknown => PLACEHOLDER,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One journaled trade after normalization.
///
/// Serializes to the journal-entry record shape, so a serialized `Trade`
/// normalizes back to itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub pair: String,
    pub trade_type: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "bias1H")]
    pub bias: String,
    pub range_type: String,
    pub poi_type: String,
    pub entry_type: String,
    pub entry_price: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub rr_ratio: f64,
    pub lot_size: String,
    pub poi_tapped: TriState,
    pub choch_confirmed: TriState,
    pub outcome: Outcome,
    pub profit_loss: String,
    pub emotion: String,
    pub followed_rules: TriState,
    pub mistakes: String,
    pub screenshots: Vec<String>,
}

impl Trade {
    /// Signed P&L; unparseable text counts as zero.
    pub fn pnl(&self) -> f64 {
        parse_decimal(&self.profit_loss).unwrap_or(0.0)
    }

    pub fn is_win(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Both execution confirmations answered yes.
    pub fn is_fully_confirmed(&self) -> bool {
        self.poi_tapped == TriState::Yes && self.choch_confirmed == TriState::Yes
    }

    /// At least one confirmation answered, but not both yes.
    pub fn is_partially_confirmed(&self) -> bool {
        (self.poi_tapped.is_answered() || self.choch_confirmed.is_answered())
            && !self.is_fully_confirmed()
    }

    pub fn to_record(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
