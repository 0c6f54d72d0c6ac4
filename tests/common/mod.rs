#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::Write;
use tradeflow::adapters::memory_store::MemoryStore;
use tradeflow::domain::repository::Collection;

/// Store pre-seeded with the two trade collections.
pub fn seeded_store(journal: Vec<Value>, legacy: Vec<Value>) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(
        Collection::JournalEntries.key(),
        &Value::Array(journal).to_string(),
    );
    store.insert(
        Collection::LegacyTrades.key(),
        &Value::Array(legacy).to_string(),
    );
    store
}

pub fn journal_record(id: &str, date: &str, outcome: &str, pnl: &str) -> Value {
    json!({
        "id": id,
        "pair": "EU",
        "tradeType": "15min PT",
        "date": date,
        "bias1H": "Bullish",
        "entryPrice": "1.0800",
        "stopLoss": "1.0780",
        "takeProfit": "1.0900",
        "rrRatio": 5.0,
        "outcome": outcome,
        "profitLoss": pnl,
        "emotion": "Calm",
        "followedRules": true,
        "mistakes": "",
    })
}

pub fn legacy_record(id: &str, date: &str, status: &str, pnl: f64) -> Value {
    json!({
        "id": id,
        "date": date,
        "symbol": "GU",
        "side": "Long",
        "entry": 1.25,
        "exit": 1.26,
        "pnl": pnl,
        "status": status,
        "notes": "",
    })
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
