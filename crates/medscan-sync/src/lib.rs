//! Sync layer: HTTP access to the diagnosis service (analysis upload, history,
//! patient stats, and reports).

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HistoryClient, HistoryError, PredictionUpload};
