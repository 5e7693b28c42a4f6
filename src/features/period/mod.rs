//! Period estimation modules
//!
//! Convert the onset detection function history into tempo:
//! - Normalised FFT autocorrelation and peak-lag selection
//! - Ring-buffered tempo estimator with beat-phase tracking

pub mod autocorrelation;
pub mod tempo;

pub use autocorrelation::{select_peak_lag, Autocorrelator};
pub use tempo::{TempoEstimate, TempoEstimator};
