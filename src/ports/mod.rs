//! Port traits at the edges of the domain.

pub mod blob_store;
pub mod calendar_source;
pub mod config_port;
