//! Engine and result types
//!
//! - `FeatureEngine`: owns all per-session analyzer state
//! - `FeatureRecord` and its sub-records

pub mod engine;
pub mod result;
