//! Near-silence gate
//!
//! A frame whose loudest bin is below the configured threshold carries no
//! usable information; the engine short-circuits it instead of analysing noise.

use crate::config::SilenceConfig;

/// Silence gate over normalised magnitudes
#[derive(Debug, Clone, Copy)]
pub struct SilenceDetector {
    threshold: f32,
}

impl SilenceDetector {
    /// Create a gate from configuration
    pub fn new(config: SilenceConfig) -> Self {
        Self {
            threshold: config.threshold,
        }
    }

    /// Peak of a normalised magnitude spectrum
    pub fn peak(magnitudes: &[f32]) -> f32 {
        magnitudes.iter().copied().fold(0.0f32, f32::max)
    }

    /// True when the frame's peak magnitude is below the gate threshold
    pub fn is_silent(&self, magnitudes: &[f32]) -> bool {
        Self::peak(magnitudes) < self.threshold
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(SilenceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frame_is_silent() {
        let gate = SilenceDetector::default();
        assert!(gate.is_silent(&[0.0; 64]));
        assert!(gate.is_silent(&[]));
    }

    #[test]
    fn test_single_loud_bin_is_not_silent() {
        let gate = SilenceDetector::default();
        let mut mags = vec![0.0f32; 64];
        mags[10] = 0.2;
        assert!(!gate.is_silent(&mags));
    }
}
