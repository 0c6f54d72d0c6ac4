//! Record collections, the journal/legacy merge, and the trade views built
//! on top of them.

use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use super::error::TradeflowError;
use super::normalize::{RawRecord, normalize};
use super::trade::{Outcome, Trade};
use crate::ports::blob_store::BlobStore;

/// Named collections in the blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    JournalEntries,
    LegacyTrades,
    ChecklistLogs,
    PendingChecklist,
    ChecklistState,
    AccountBalance,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::JournalEntries => "tradeflow-journal-entries",
            Collection::LegacyTrades => "tradeflow-trades",
            Collection::ChecklistLogs => "tradeflow-checklist-logs",
            Collection::PendingChecklist => "tradeflow-pending-checklist",
            Collection::ChecklistState => "tradeflow-sop-checklist",
            Collection::AccountBalance => "tradeflow-account-balance",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Narrow, storage-agnostic access to whole collections.
pub struct RecordRepository<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> RecordRepository<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Read a list collection. Absent, unparseable or non-list blobs read as
    /// empty.
    pub fn load(&self, collection: Collection) -> Result<Vec<Value>, TradeflowError> {
        match self.load_value(collection)? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => {
                warn!("{} is not a list, treating as empty", collection);
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite a list collection.
    pub fn save(&self, collection: Collection, records: &[Value]) -> Result<(), TradeflowError> {
        self.save_value(collection, &Value::Array(records.to_vec()))
    }

    /// Insert a record at the front of a list collection.
    pub fn prepend(&self, collection: Collection, record: Value) -> Result<(), TradeflowError> {
        let mut records = self.load(collection)?;
        records.insert(0, record);
        self.save(collection, &records)
    }

    /// Read a single-value collection. Unparseable blobs read as absent.
    pub fn load_value(&self, collection: Collection) -> Result<Option<Value>, TradeflowError> {
        let Some(blob) = self.store.read(collection.key())? else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("{} holds malformed JSON ({}), ignoring it", collection, e);
                Ok(None)
            }
        }
    }

    pub fn save_value(&self, collection: Collection, value: &Value) -> Result<(), TradeflowError> {
        let blob = serde_json::to_string(value).map_err(|e| TradeflowError::Store {
            reason: format!("failed to serialize {}: {}", collection, e),
        })?;
        self.store.write(collection.key(), &blob)
    }

    pub fn clear(&self, collection: Collection) -> Result<(), TradeflowError> {
        self.store.remove(collection.key())
    }
}

/// Combine both trade collections: every journal record in stored order, then
/// each legacy record whose id no journal record uses.
pub fn merge_records(journal: Vec<Value>, legacy: Vec<Value>) -> Vec<RawRecord> {
    let journal: Vec<RawRecord> = journal.into_iter().filter_map(RawRecord::journal).collect();
    let journal_ids: HashSet<Option<String>> = journal.iter().map(RawRecord::id).collect();

    let mut merged = journal;
    let mut discarded = 0usize;
    for record in legacy.into_iter().filter_map(RawRecord::legacy) {
        if journal_ids.contains(&record.id()) {
            discarded += 1;
        } else {
            merged.push(record);
        }
    }
    if discarded > 0 {
        debug!("merge discarded {} legacy records shadowed by journal entries", discarded);
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first, for the equity curve.
    Chronological,
    /// Newest first, for the trade log.
    ReverseChronological,
}

/// Stable sort on the raw date string.
///
/// Placeholder or non-ISO dates compare as plain strings.
pub fn sort_trades(trades: &mut [Trade], order: SortOrder) {
    match order {
        SortOrder::Chronological => trades.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::ReverseChronological => trades.sort_by(|a, b| b.date.cmp(&a.date)),
    }
}

/// Merge, normalize and sort both trade collections.
pub fn load_trades(
    repo: &RecordRepository<'_>,
    order: SortOrder,
) -> Result<Vec<Trade>, TradeflowError> {
    let journal = repo.load(Collection::JournalEntries)?;
    let legacy = repo.load(Collection::LegacyTrades)?;
    let mut trades: Vec<Trade> = merge_records(journal, legacy).iter().map(normalize).collect();
    sort_trades(&mut trades, order);
    Ok(trades)
}

/// Exact-match filter for the trade log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    pub pair: Option<String>,
    pub trade_type: Option<String>,
    pub outcome: Option<Outcome>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        self.pair.as_ref().is_none_or(|p| &trade.pair == p)
            && self.trade_type.as_ref().is_none_or(|t| &trade.trade_type == t)
            && self.outcome.is_none_or(|o| trade.outcome == o)
    }

    pub fn apply<'t>(&self, trades: &'t [Trade]) -> Vec<&'t Trade> {
        trades.iter().filter(|t| self.matches(t)).collect()
    }
}
