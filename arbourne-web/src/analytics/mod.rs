//! Analytics aggregators for the admin dashboard
//!
//! Every aggregation is computed on demand from the event log within a
//! single request. No precomputation, no caching layer, no background jobs.

pub mod intent;
pub mod leads;
pub mod stats;
pub mod timerange;

pub use timerange::Lookback;
