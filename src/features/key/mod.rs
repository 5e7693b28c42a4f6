//! Key detection
//!
//! Correlates a 12-element pitch-class vector against the 24
//! Krumhansl-Kessler key profiles (12 major + 12 minor rotations).

pub mod detector;
pub mod templates;

pub use detector::{detect_key, pearson_correlation, pitch_class_contrast};
pub use templates::KeyTemplates;

use crate::analysis::result::Key;

/// Key detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyDetectionResult {
    /// Best matching key
    pub key: Key,
    /// Pearson correlation with that key's profile (-1.0 to 1.0)
    pub correlation: f32,
}
