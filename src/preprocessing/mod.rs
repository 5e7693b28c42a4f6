//! Frame preprocessing modules
//!
//! Utilities applied before feature extraction:
//! - A-weighting (perceptual loudness curve)
//! - Adaptive envelope normalisation and waveform peak normalisation
//! - Near-silence gating

pub mod normalization;
pub mod silence;
pub mod weighting;
