//! Journal entry creation.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::{Value, json};

use super::checklist::PendingChecklist;
use super::error::TradeflowError;
use super::normalize::normalize_fields;
use super::repository::{Collection, RecordRepository};
use super::sizing::{parse_decimal, risk_reward_ratio};
use super::trade::{Trade, TriState};

/// Form values for a new journal entry, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalDraft {
    pub pair: String,
    pub trade_type: String,
    pub date: String,
    pub time: String,
    pub bias: String,
    pub range_type: String,
    pub poi_type: String,
    pub entry_type: String,
    pub entry_price: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub lot_size: String,
    pub poi_tapped: TriState,
    pub choch_confirmed: TriState,
    pub outcome: String,
    pub profit_loss: String,
    pub emotion: String,
    pub followed_rules: TriState,
    pub mistakes: String,
}

impl JournalDraft {
    /// Names of required fields left blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("pair", &self.pair),
            ("tradeType", &self.trade_type),
            ("date", &self.date),
            ("bias1H", &self.bias),
            ("entryPrice", &self.entry_price),
            ("stopLoss", &self.stop_loss),
            ("takeProfit", &self.take_profit),
            ("outcome", &self.outcome),
            ("emotion", &self.emotion),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), TradeflowError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TradeflowError::MissingField {
                field: missing.join(", "),
            })
        }
    }

    pub fn risk_reward(&self) -> Option<f64> {
        risk_reward_ratio(&self.entry_price, &self.stop_loss, &self.take_profit)
    }

    /// Carry a checklist rule break into this draft.
    pub fn apply_pending(&mut self, pending: &PendingChecklist) {
        if !pending.is_rule_break {
            return;
        }
        self.followed_rules = TriState::No;
        if !pending.failed_items.is_empty() {
            self.mistakes = format!("Rule violations: {}", pending.failed_items.join("; "));
        }
    }

    fn to_journal_record(&self, id: &str, rr: Option<f64>) -> Value {
        json!({
            "id": id,
            "pair": self.pair,
            "tradeType": self.trade_type,
            "date": self.date,
            "time": self.time,
            "bias1H": self.bias,
            "rangeType": self.range_type,
            "poiType": self.poi_type,
            "entryPrice": self.entry_price,
            "stopLoss": self.stop_loss,
            "takeProfit": self.take_profit,
            "rrRatio": rr.unwrap_or(0.0),
            "entryType": self.entry_type,
            "lotSize": self.lot_size,
            "poiTapped": self.poi_tapped,
            "chochConfirmed": self.choch_confirmed,
            "outcome": self.outcome,
            "profitLoss": self.profit_loss,
            "emotion": self.emotion,
            "followedRules": self.followed_rules,
            "mistakes": self.mistakes,
        })
    }

    /// Row in the older trade-list shape, kept so readers of that collection
    /// still see the entry.
    fn to_legacy_record(&self, id: &str, rr: Option<f64>) -> Value {
        let pnl = parse_decimal(&self.profit_loss).unwrap_or(0.0).abs();
        let rr_text = rr.map_or_else(|| "N/A".to_string(), |r| r.to_string());
        json!({
            "id": id,
            "date": self.date,
            "symbol": self.pair,
            "side": if self.bias == "Bullish" { "Long" } else { "Short" },
            "entry": parse_decimal(&self.entry_price).unwrap_or(0.0),
            "exit": parse_decimal(&self.take_profit).unwrap_or(0.0),
            "pnl": if self.outcome == "Loss" { -pnl } else { pnl },
            "status": if self.outcome == "BE" { "Win" } else { self.outcome.as_str() },
            "notes": format!(
                "{} | {} | {} | RR: {}",
                self.trade_type, self.range_type, self.poi_type, rr_text
            ),
        })
    }
}

/// Read and clear the pending checklist hand-off.
///
/// A payload that does not parse is cleared and treated as absent.
pub fn take_pending(repo: &RecordRepository<'_>) -> Result<Option<PendingChecklist>, TradeflowError> {
    let Some(value) = repo.load_value(Collection::PendingChecklist)? else {
        return Ok(None);
    };
    repo.clear(Collection::PendingChecklist)?;
    match serde_json::from_value::<PendingChecklist>(value) {
        Ok(pending) => {
            debug!("picked up pending checklist ({})", pending.checklist_result.label());
            Ok(Some(pending))
        }
        Err(e) => {
            warn!("discarding malformed pending checklist: {}", e);
            Ok(None)
        }
    }
}

/// Persist a new journal entry and its legacy mirror, both at the front of
/// their collections. Returns the canonical trade.
pub fn create_entry(
    repo: &RecordRepository<'_>,
    draft: &JournalDraft,
    now: DateTime<Utc>,
) -> Result<Trade, TradeflowError> {
    draft.validate()?;

    let id = now.timestamp_millis().to_string();
    let rr = draft.risk_reward();
    let record = draft.to_journal_record(&id, rr);

    repo.prepend(Collection::JournalEntries, record.clone())?;
    repo.prepend(Collection::LegacyTrades, draft.to_legacy_record(&id, rr))?;
    info!("journal entry {} saved for {}", id, draft.pair);

    let fields = match record {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    Ok(normalize_fields(&fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::checklist::Verdict;
    use crate::domain::repository::{SortOrder, load_trades};
    use crate::domain::trade::Outcome;
    use chrono::TimeZone;

    fn draft() -> JournalDraft {
        JournalDraft {
            pair: "EU".into(),
            trade_type: "15min PT".into(),
            date: "2024-03-04".into(),
            bias: "Bearish".into(),
            range_type: "LSL".into(),
            poi_type: "OB".into(),
            entry_price: "1.0800".into(),
            stop_loss: "1.0820".into(),
            take_profit: "1.0700".into(),
            outcome: "Loss".into(),
            profit_loss: "120".into(),
            emotion: "Calm".into(),
            ..JournalDraft::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 19, 0, 0).unwrap()
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let mut d = draft();
        d.pair.clear();
        d.emotion = "  ".into();
        assert_eq!(d.missing_fields(), vec!["pair", "emotion"]);
        let err = d.validate().unwrap_err();
        assert_eq!(err.to_string(), "missing required field: pair, emotion");
    }

    #[test]
    fn create_entry_writes_journal_and_mirror() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        let trade = create_entry(&repo, &draft(), now()).unwrap();

        assert_eq!(trade.id, "1709578800000");
        assert_eq!(trade.rr_ratio, 5.0);
        assert_eq!(trade.outcome, Outcome::Loss);
        assert_eq!(trade.range_type, "LSL");
        assert_eq!(trade.entry_type, "—");
        assert_eq!(trade.time, None);

        let legacy = repo.load(Collection::LegacyTrades).unwrap();
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0]["side"], json!("Short"));
        assert_eq!(legacy[0]["pnl"], json!(-120.0));
        assert_eq!(legacy[0]["status"], json!("Loss"));
        assert_eq!(legacy[0]["notes"], json!("15min PT | LSL | OB | RR: 5"));
    }

    #[test]
    fn mirror_never_double_counts() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        create_entry(&repo, &draft(), now()).unwrap();
        let trades = load_trades(&repo, SortOrder::ReverseChronological).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].profit_loss, "120");
    }

    #[test]
    fn breakeven_mirror_is_recorded_as_win() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        let mut d = draft();
        d.outcome = "BE".into();
        d.bias = "Bullish".into();
        d.take_profit = "abc".into();
        create_entry(&repo, &d, now()).unwrap();

        let legacy = repo.load(Collection::LegacyTrades).unwrap();
        assert_eq!(legacy[0]["status"], json!("Win"));
        assert_eq!(legacy[0]["side"], json!("Long"));
        assert_eq!(legacy[0]["pnl"], json!(120.0));
        assert_eq!(legacy[0]["notes"], json!("15min PT | LSL | OB | RR: N/A"));

        let journal = repo.load(Collection::JournalEntries).unwrap();
        assert_eq!(journal[0]["rrRatio"], json!(0.0));
    }

    #[test]
    fn new_entries_go_to_the_front() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        create_entry(&repo, &draft(), now()).unwrap();
        let later = now() + chrono::Duration::seconds(1);
        create_entry(&repo, &draft(), later).unwrap();

        let journal = repo.load(Collection::JournalEntries).unwrap();
        assert_eq!(journal[0]["id"], json!("1709578801000"));
        assert_eq!(journal[1]["id"], json!("1709578800000"));
    }

    #[test]
    fn pending_rule_break_marks_draft() {
        let mut d = draft();
        d.mistakes = "typed by hand".into();
        d.apply_pending(&PendingChecklist {
            is_rule_break: true,
            failed_items: vec!["RR ≥ 5R".into(), "Entry model valid".into()],
            checklist_result: Verdict::Invalid,
            timestamp: String::new(),
        });
        assert_eq!(d.followed_rules, TriState::No);
        assert_eq!(d.mistakes, "Rule violations: RR ≥ 5R; Entry model valid");
    }

    #[test]
    fn pending_without_break_leaves_draft_alone() {
        let mut d = draft();
        d.apply_pending(&PendingChecklist {
            is_rule_break: false,
            failed_items: vec![],
            checklist_result: Verdict::Valid,
            timestamp: String::new(),
        });
        assert_eq!(d, draft());
    }

    #[test]
    fn take_pending_clears_payload() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        repo.save_value(
            Collection::PendingChecklist,
            &json!({"isRuleBreak": true, "failedItems": ["x"], "checklistResult": "INVALID"}),
        )
        .unwrap();

        let pending = take_pending(&repo).unwrap().unwrap();
        assert!(pending.is_rule_break);
        assert!(take_pending(&repo).unwrap().is_none());
    }

    #[test]
    fn take_pending_discards_malformed_payload() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        repo.save_value(Collection::PendingChecklist, &json!({"isRuleBreak": "maybe"}))
            .unwrap();
        assert!(take_pending(&repo).unwrap().is_none());
        assert!(repo.load_value(Collection::PendingChecklist).unwrap().is_none());
    }
}
