//! Reconciliation of stored trade records into the canonical [`Trade`].
//!
//! Two record shapes live in the store: journal entries written by the
//! journal workflow and legacy trade rows. Both arrive as untyped JSON
//! objects tagged by the collection they came from. Field resolution is
//! driven by the alias tables below; the first source key holding a
//! non-empty value wins, otherwise the fallback applies. Normalization never
//! branches on the record's origin and never fails.

use serde_json::{Map, Value};

use super::trade::{Outcome, PLACEHOLDER, Trade, TriState};

pub type JsonMap = Map<String, Value>;

/// A stored record, tagged by the collection it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Journal(JsonMap),
    Legacy(JsonMap),
}

impl RawRecord {
    /// Wrap a journal-collection element; non-objects are rejected.
    pub fn journal(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(RawRecord::Journal(map)),
            _ => None,
        }
    }

    pub fn legacy(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(RawRecord::Legacy(map)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &JsonMap {
        match self {
            RawRecord::Journal(map) | RawRecord::Legacy(map) => map,
        }
    }

    pub fn id(&self) -> Option<String> {
        first_text(self.fields(), ID.sources)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, RawRecord::Legacy(_))
    }
}

/// Precedence rule for one canonical text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub field: &'static str,
    pub sources: &'static [&'static str],
    pub fallback: &'static str,
}

const fn alias(
    field: &'static str,
    sources: &'static [&'static str],
    fallback: &'static str,
) -> FieldAlias {
    FieldAlias {
        field,
        sources,
        fallback,
    }
}

pub const ID: FieldAlias = alias("id", &["id"], "");
pub const PAIR: FieldAlias = alias("pair", &["pair", "symbol"], PLACEHOLDER);
pub const TRADE_TYPE: FieldAlias = alias("tradeType", &["tradeType"], PLACEHOLDER);
pub const DATE: FieldAlias = alias("date", &["date"], PLACEHOLDER);
pub const BIAS: FieldAlias = alias("bias1H", &["bias1H"], PLACEHOLDER);
pub const RANGE_TYPE: FieldAlias = alias("rangeType", &["rangeType"], PLACEHOLDER);
pub const POI_TYPE: FieldAlias = alias("poiType", &["poiType"], PLACEHOLDER);
pub const ENTRY_TYPE: FieldAlias = alias("entryType", &["entryType"], PLACEHOLDER);
pub const ENTRY_PRICE: FieldAlias = alias("entryPrice", &["entryPrice", "entry"], PLACEHOLDER);
pub const STOP_LOSS: FieldAlias = alias("stopLoss", &["stopLoss"], PLACEHOLDER);
pub const TAKE_PROFIT: FieldAlias = alias("takeProfit", &["takeProfit", "exit"], PLACEHOLDER);
pub const LOT_SIZE: FieldAlias = alias("lotSize", &["lotSize"], PLACEHOLDER);
pub const OUTCOME: FieldAlias = alias("outcome", &["outcome", "status"], PLACEHOLDER);
pub const PROFIT_LOSS: FieldAlias = alias("profitLoss", &["profitLoss", "pnl"], "0");
pub const EMOTION: FieldAlias = alias("emotion", &["emotion"], PLACEHOLDER);
pub const MISTAKES: FieldAlias = alias("mistakes", &["mistakes", "notes"], "");

/// Every text alias, in canonical field order.
pub const TEXT_ALIASES: [FieldAlias; 16] = [
    ID,
    PAIR,
    TRADE_TYPE,
    DATE,
    BIAS,
    RANGE_TYPE,
    POI_TYPE,
    ENTRY_TYPE,
    ENTRY_PRICE,
    STOP_LOSS,
    TAKE_PROFIT,
    LOT_SIZE,
    OUTCOME,
    PROFIT_LOSS,
    EMOTION,
    MISTAKES,
];

const TIME_KEY: &str = "time";
const RR_KEY: &str = "rrRatio";
const POI_TAPPED_KEY: &str = "poiTapped";
const CHOCH_KEY: &str = "chochConfirmed";
const FOLLOWED_RULES_KEY: &str = "followedRules";
const SCREENSHOTS_KEY: &str = "screenshots";

/// Text form of a stored value, or `None` if it counts as empty.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| f.to_string()),
        },
        _ => None,
    }
}

fn first_text(fields: &JsonMap, sources: &[&str]) -> Option<String> {
    sources
        .iter()
        .find_map(|key| fields.get(*key).and_then(value_text))
}

/// Resolve one canonical text field.
pub fn resolve(fields: &JsonMap, alias: &FieldAlias) -> String {
    first_text(fields, alias.sources).unwrap_or_else(|| alias.fallback.to_string())
}

fn resolve_flag(fields: &JsonMap, key: &str) -> TriState {
    match fields.get(key) {
        Some(Value::Bool(b)) => TriState::from(*b),
        Some(Value::String(s)) => TriState::parse(s).unwrap_or_default(),
        _ => TriState::Unanswered,
    }
}

fn resolve_ratio(fields: &JsonMap) -> f64 {
    let ratio = match fields.get(RR_KEY) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match ratio {
        Some(r) if r.is_finite() && r != 0.0 => r,
        _ => 0.0,
    }
}

fn resolve_screenshots(fields: &JsonMap) -> Vec<String> {
    let strings = |items: &[Value]| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    };
    match fields.get(SCREENSHOTS_KEY) {
        Some(Value::Array(items)) => strings(items),
        // Older rows stored the list as a JSON-encoded string.
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => strings(&items),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Normalize a tagged record into a canonical trade.
pub fn normalize(record: &RawRecord) -> Trade {
    normalize_fields(record.fields())
}

/// Normalize an untagged JSON object. Does not modify the input.
pub fn normalize_fields(fields: &JsonMap) -> Trade {
    Trade {
        id: resolve(fields, &ID),
        pair: resolve(fields, &PAIR),
        trade_type: resolve(fields, &TRADE_TYPE),
        date: resolve(fields, &DATE),
        time: fields.get(TIME_KEY).and_then(value_text),
        bias: resolve(fields, &BIAS),
        range_type: resolve(fields, &RANGE_TYPE),
        poi_type: resolve(fields, &POI_TYPE),
        entry_type: resolve(fields, &ENTRY_TYPE),
        entry_price: resolve(fields, &ENTRY_PRICE),
        stop_loss: resolve(fields, &STOP_LOSS),
        take_profit: resolve(fields, &TAKE_PROFIT),
        rr_ratio: resolve_ratio(fields),
        lot_size: resolve(fields, &LOT_SIZE),
        poi_tapped: resolve_flag(fields, POI_TAPPED_KEY),
        choch_confirmed: resolve_flag(fields, CHOCH_KEY),
        outcome: Outcome::parse(&resolve(fields, &OUTCOME)),
        profit_loss: resolve(fields, &PROFIT_LOSS),
        emotion: resolve(fields, &EMOTION),
        followed_rules: resolve_flag(fields, FOLLOWED_RULES_KEY),
        mistakes: resolve(fields, &MISTAKES),
        screenshots: resolve_screenshots(fields),
    }
}

/// Normalize a trade's own record form; equal to the input for any
/// normalized trade.
pub fn renormalize(trade: &Trade) -> Trade {
    match trade.to_record() {
        Value::Object(map) => normalize_fields(&map),
        _ => trade.clone(),
    }
}
