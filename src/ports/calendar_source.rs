//! Economic-calendar data source port.

use chrono::NaiveDate;

use crate::domain::calendar::RawEvent;
use crate::domain::error::TradeflowError;

/// Supplies the economic events scheduled for one day.
///
/// Implementations make a single attempt; callers decide what to do on
/// failure.
pub trait CalendarSource {
    fn fetch(&self, day: NaiveDate) -> Result<Vec<RawEvent>, TradeflowError>;
}
