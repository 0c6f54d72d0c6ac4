//! Core domain types and logic.

pub mod calendar;
pub mod checklist;
pub mod config_validation;
pub mod error;
pub mod journal;
pub mod metrics;
pub mod normalize;
pub mod pair;
pub mod repository;
pub mod settings;
pub mod sizing;
pub mod trade;
