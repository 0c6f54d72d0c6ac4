//! Economic calendar events.
//!
//! Events come from a [`CalendarSource`] when one is configured and
//! answers with data; otherwise a curated sample set for the day is served.
//! The feed is always tagged with where it came from.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use super::normalize::value_text;
use crate::ports::calendar_source::CalendarSource;

/// Event timestamps are UTC in this layout.
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One event as delivered by a source. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub event: Option<String>,
    pub currency: Option<String>,
    pub impact: Option<String>,
    pub date: Option<String>,
    pub actual: Option<Value>,
    pub estimate: Option<Value>,
    pub previous: Option<Value>,
    pub country: Option<String>,
    pub change: Option<f64>,
    pub change_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    /// Unrecognized labels classify as `Low`.
    pub fn classify(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Impact::High,
            "medium" => Impact::Medium,
            _ => Impact::Low,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        })
    }
}

/// How a released figure compares with its forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surprise {
    Beat,
    Met,
    Missed,
}

/// Numeric value of a reading like `"3.7%"` or `"275K"`.
pub fn numeric_reading(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches(['%', 'K'])
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Compare an actual reading with the forecast; `None` when either is not
/// numeric.
pub fn surprise(actual: &str, forecast: &str) -> Option<Surprise> {
    let actual = numeric_reading(actual)?;
    let forecast = numeric_reading(forecast)?;
    Some(if actual > forecast {
        Surprise::Beat
    } else if actual < forecast {
        Surprise::Missed
    } else {
        Surprise::Met
    })
}

pub fn parse_event_time(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date.trim(), EVENT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicEvent {
    pub event: String,
    pub currency: String,
    pub impact: Impact,
    /// UTC, as delivered.
    pub date: String,
    pub actual: Option<String>,
    pub forecast: Option<String>,
    pub previous: Option<String>,
    pub country: String,
    pub change: Option<f64>,
    pub change_percentage: Option<f64>,
}

impl From<RawEvent> for EconomicEvent {
    fn from(raw: RawEvent) -> Self {
        let reading = |v: Option<Value>| v.as_ref().and_then(value_text);
        Self {
            event: raw.event.unwrap_or_default(),
            currency: raw.currency.unwrap_or_default(),
            impact: raw
                .impact
                .as_deref()
                .filter(|s| !s.is_empty())
                .map_or(Impact::Low, Impact::classify),
            date: raw.date.unwrap_or_default(),
            actual: reading(raw.actual),
            forecast: reading(raw.estimate),
            previous: reading(raw.previous),
            country: raw.country.unwrap_or_default(),
            change: raw.change,
            change_percentage: raw.change_percentage,
        }
    }
}

impl EconomicEvent {
    pub fn utc_time(&self) -> Option<DateTime<Utc>> {
        parse_event_time(&self.date)
    }

    pub fn local_time(&self) -> Option<DateTime<Local>> {
        self.utc_time().map(|t| t.with_timezone(&Local))
    }

    pub fn surprise(&self) -> Option<Surprise> {
        surprise(self.actual.as_deref()?, self.forecast.as_deref()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Live,
    Sample,
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Live => write!(f, "live"),
            FeedSource::Sample => write!(f, "sample"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarFeed {
    pub source: FeedSource,
    pub events: Vec<EconomicEvent>,
}

type SampleRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    Option<&'static str>,
    Option<&'static str>,
    &'static str,
);

const SAMPLE_EVENTS: [SampleRow; 24] = [
    ("Non-Farm Payrolls", "USD", "High", "13:30:00", Some("275K"), Some("250K"), Some("229K"), "US"),
    ("Unemployment Rate", "USD", "High", "13:30:00", Some("3.7%"), Some("3.8%"), Some("3.7%"), "US"),
    ("ISM Manufacturing PMI", "USD", "High", "15:00:00", Some("49.1"), Some("47.5"), Some("47.4"), "US"),
    ("BOE Interest Rate Decision", "GBP", "High", "12:00:00", Some("5.25%"), Some("5.25%"), Some("5.25%"), "GB"),
    ("ECB Monetary Policy Statement", "EUR", "High", "12:45:00", None, None, None, "EU"),
    ("French Flash Manufacturing PMI", "EUR", "Medium", "08:15:00", Some("42.5"), Some("43.1"), Some("42.8"), "FR"),
    ("Flash Manufacturing PMI", "GBP", "Medium", "09:30:00", Some("47.3"), Some("46.5"), Some("46.2"), "GB"),
    ("BOJ Monetary Policy Minutes", "JPY", "Medium", "00:30:00", None, None, None, "JP"),
    ("Core Retail Sales m/m", "CAD", "High", "13:30:00", Some("0.6%"), Some("0.4%"), Some("-0.3%"), "CA"),
    ("German Ifo Business Climate", "EUR", "High", "09:00:00", Some("86.0"), Some("85.5"), Some("85.2"), "DE"),
    ("CB Consumer Confidence", "USD", "High", "15:00:00", Some("110.7"), Some("114.0"), Some("114.8"), "US"),
    ("FOMC Meeting Minutes", "USD", "High", "19:00:00", None, None, None, "US"),
    ("CPI y/y", "GBP", "High", "07:00:00", Some("4.0%"), Some("4.1%"), Some("4.0%"), "GB"),
    ("Core Durable Goods Orders m/m", "USD", "Medium", "13:30:00", Some("0.1%"), Some("0.2%"), Some("-0.3%"), "US"),
    ("Advance GDP q/q", "USD", "High", "13:30:00", Some("3.3%"), Some("2.0%"), Some("4.9%"), "US"),
    ("Core CPI y/y", "JPY", "High", "00:30:00", Some("2.3%"), Some("2.3%"), Some("2.5%"), "JP"),
    ("ECB Press Conference", "EUR", "High", "13:45:00", None, None, None, "EU"),
    ("Core PCE Price Index m/m", "USD", "High", "13:30:00", Some("0.2%"), Some("0.2%"), Some("0.1%"), "US"),
    ("GDP m/m", "CAD", "High", "13:30:00", Some("0.2%"), Some("0.1%"), Some("-0.1%"), "CA"),
    ("German CPI m/m", "EUR", "Low", "13:00:00", Some("0.2%"), Some("0.3%"), Some("0.1%"), "DE"),
    ("Richmond Manufacturing Index", "USD", "Low", "15:00:00", Some("-15"), Some("-10"), Some("-11"), "US"),
    ("Pending Home Sales m/m", "USD", "Low", "15:00:00", Some("8.3%"), Some("1.5%"), Some("-0.3%"), "US"),
    ("Retail Sales m/m", "CAD", "Medium", "13:30:00", Some("0.9%"), Some("0.8%"), Some("-0.2%"), "CA"),
    ("Revised GDP q/q", "GBP", "Medium", "07:00:00", Some("-0.3%"), Some("-0.1%"), Some("-0.1%"), "GB"),
];

/// Curated events, all dated `today`.
pub fn sample_events(today: NaiveDate) -> Vec<EconomicEvent> {
    let day = today.format("%Y-%m-%d");
    SAMPLE_EVENTS
        .iter()
        .map(
            |&(event, currency, impact, time, actual, estimate, previous, country)| EconomicEvent {
                event: event.to_string(),
                currency: currency.to_string(),
                impact: Impact::classify(impact),
                date: format!("{} {}", day, time),
                actual: actual.map(str::to_string),
                forecast: estimate.map(str::to_string),
                previous: previous.map(str::to_string),
                country: country.to_string(),
                change: None,
                change_percentage: None,
            },
        )
        .collect()
}

/// Fetch today's events, falling back to the sample set on any failure or an
/// empty answer. Never fails.
pub fn load_calendar(source: Option<&dyn CalendarSource>, today: NaiveDate) -> CalendarFeed {
    if let Some(source) = source {
        match source.fetch(today) {
            Ok(raw) if !raw.is_empty() => {
                info!("calendar: {} live events", raw.len());
                return CalendarFeed {
                    source: FeedSource::Live,
                    events: raw.into_iter().map(EconomicEvent::from).collect(),
                };
            }
            Ok(_) => warn!("calendar source returned no events, using sample data"),
            Err(e) => warn!("{}, using sample data", e),
        }
    }

    CalendarFeed {
        source: FeedSource::Sample,
        events: sample_events(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TradeflowError;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    struct FixedSource(Result<Vec<RawEvent>, ()>);

    impl CalendarSource for FixedSource {
        fn fetch(&self, _day: NaiveDate) -> Result<Vec<RawEvent>, TradeflowError> {
            self.0.clone().map_err(|_| TradeflowError::Calendar {
                reason: "HTTP 403".into(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn impact_defaults_to_low() {
        assert_eq!(Impact::classify("High"), Impact::High);
        assert_eq!(Impact::classify("medium"), Impact::Medium);
        assert_eq!(Impact::classify("None"), Impact::Low);
        assert_eq!(EconomicEvent::from(RawEvent::default()).impact, Impact::Low);
    }

    #[test]
    fn impact_label_honours_column_width() {
        assert_eq!(format!("{:<6}|", Impact::Low), "Low   |");
        assert_eq!(format!("{:>6}|", Impact::High), "  High|");
        assert_eq!(Impact::Medium.to_string(), "Medium");
    }

    #[test]
    fn surprise_strips_percent_and_thousands() {
        assert_eq!(surprise("275K", "250K"), Some(Surprise::Beat));
        assert_eq!(surprise("3.7%", "3.8%"), Some(Surprise::Missed));
        assert_eq!(surprise("5.25%", "5.25%"), Some(Surprise::Met));
        assert_eq!(surprise("-15", "-10"), Some(Surprise::Missed));
    }

    #[test]
    fn non_numeric_readings_give_no_signal() {
        assert_eq!(surprise("n/a", "1.0"), None);
        assert_eq!(surprise("", "1.0"), None);
        let event = EconomicEvent::from(RawEvent {
            actual: Some(json!("1.2")),
            ..RawEvent::default()
        });
        assert_eq!(event.surprise(), None);
    }

    #[test]
    fn raw_event_maps_missing_fields() {
        let raw: RawEvent = serde_json::from_value(json!({
            "event": "CPI",
            "date": "2024-03-04 13:30:00",
            "actual": 3.1,
            "estimate": "3.0",
            "previous": null,
            "changePercentage": 0.5
        }))
        .unwrap();
        let event = EconomicEvent::from(raw);
        assert_eq!(event.currency, "");
        assert_eq!(event.impact, Impact::Low);
        assert_eq!(event.actual.as_deref(), Some("3.1"));
        assert_eq!(event.forecast.as_deref(), Some("3.0"));
        assert_eq!(event.previous, None);
        assert_eq!(event.change_percentage, Some(0.5));
        assert_eq!(event.surprise(), Some(Surprise::Beat));
    }

    #[test]
    fn event_time_is_utc() {
        let t = parse_event_time("2024-03-04 13:30:00").unwrap();
        assert_eq!((t.day(), t.hour(), t.minute()), (4, 13, 30));
        assert!(parse_event_time("2024-03-04").is_none());

        let events = sample_events(today());
        assert_eq!(events[0].local_time().map(|l| l.with_timezone(&Utc)), Some(t));
    }

    #[test]
    fn sample_set_is_dated_today() {
        let events = sample_events(today());
        assert_eq!(events.len(), 24);
        assert!(events.iter().all(|e| e.date.starts_with("2024-03-04 ")));
        assert_eq!(events[4].actual, None);
    }

    #[test]
    fn load_calendar_prefers_live_data() {
        let source = FixedSource(Ok(vec![RawEvent {
            event: Some("Live".into()),
            ..RawEvent::default()
        }]));
        let feed = load_calendar(Some(&source), today());
        assert_eq!(feed.source, FeedSource::Live);
        assert_eq!(feed.events.len(), 1);
    }

    #[test]
    fn load_calendar_falls_back_on_error_empty_or_missing_source() {
        let failing = FixedSource(Err(()));
        assert_eq!(load_calendar(Some(&failing), today()).source, FeedSource::Sample);

        let empty = FixedSource(Ok(vec![]));
        assert_eq!(load_calendar(Some(&empty), today()).source, FeedSource::Sample);

        let feed = load_calendar(None, today());
        assert_eq!(feed.source, FeedSource::Sample);
        assert_eq!(feed.events.len(), 24);
    }
}
