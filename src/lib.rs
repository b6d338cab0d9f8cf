//! Principal engagement analytics over a CRM record store.
//!
//! Aggregates per-principal interaction history across the
//! principal/distributor relationship graph into health scores, risk
//! factors, churn and growth signals, trends and recommendations.

pub mod config;
pub mod db;
pub mod engagement;
pub mod error;
pub mod export;
mod migrations;
pub mod store;
pub mod util;

pub use config::{load_config, EngagementConfig};
pub use db::{EngagementDb, PrincipalFilter};
pub use engagement::{
    AggregationOptions, BatchAggregation, EngagementService, PrincipalEngagementAnalytics,
};
pub use error::EngagementError;
pub use store::{RecordStore, SqliteRecordStore};

/// Initialise `env_logger` with an `info` default, overridable via `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
