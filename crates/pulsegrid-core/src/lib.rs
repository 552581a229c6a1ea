//! pulsegrid-core — shared domain types for metric-source scalers.
//!
//! A scaler turns an external signal (a queue backlog, a time-series
//! statistic) into normalized measurements a control loop compares against
//! configured targets. This crate holds the types that cross the boundary
//! between the host loop and the per-trigger scalers: raw string-keyed
//! configuration maps on the way in, metric specs and samples on the way
//! out.

pub mod types;

pub use types::*;
