//! Concrete adapter implementations for ports.

pub mod csv_export;
#[cfg(feature = "live-calendar")]
pub mod fmp_calendar;
pub mod file_config_adapter;
pub mod file_store;
pub mod memory_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;
