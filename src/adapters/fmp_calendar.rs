//! Financial Modeling Prep economic-calendar source.
//!
//! One blocking GET per fetch, with no timeout and no retry. Any failure is
//! reported to the caller, which serves sample data instead.

use crate::domain::calendar::RawEvent;
use crate::domain::error::TradeflowError;
use crate::ports::calendar_source::CalendarSource;
use chrono::NaiveDate;
use log::debug;
use serde_json::Value;
use std::time::Duration;

pub struct FmpCalendarSource {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

fn calendar_error(reason: impl Into<String>) -> TradeflowError {
    TradeflowError::Calendar {
        reason: reason.into(),
    }
}

impl FmpCalendarSource {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, TradeflowError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| calendar_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn day_query(day: NaiveDate) -> [(&'static str, String); 2] {
        let day = day.format("%Y-%m-%d").to_string();
        [("from", day.clone()), ("to", day)]
    }

    /// Decode a response body. Anything but a JSON list is rejected.
    pub fn parse_body(body: Value) -> Result<Vec<RawEvent>, TradeflowError> {
        match body {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<RawEvent>(item).ok())
                .collect()),
            other => Err(calendar_error(format!(
                "unexpected calendar payload: {}",
                other
            ))),
        }
    }
}

impl CalendarSource for FmpCalendarSource {
    fn fetch(&self, day: NaiveDate) -> Result<Vec<RawEvent>, TradeflowError> {
        debug!("requesting {} for {}", self.base_url, day);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&Self::day_query(day))
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .map_err(|e| calendar_error(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(calendar_error(format!("HTTP {}", status)));
        }

        let body: Value = resp
            .json()
            .map_err(|e| calendar_error(format!("invalid JSON: {}", e)))?;
        Self::parse_body(body)
    }
}
