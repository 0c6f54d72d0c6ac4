//! Key-value blob store port.

use crate::domain::error::TradeflowError;

/// Whole-value storage keyed by collection name.
///
/// There are no partial updates: callers read a blob, change it, and write it
/// back. Concurrent writers can lose updates.
pub trait BlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, TradeflowError>;

    fn write(&self, key: &str, value: &str) -> Result<(), TradeflowError>;

    fn remove(&self, key: &str) -> Result<(), TradeflowError>;
}
