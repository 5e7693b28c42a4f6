//! Chroma (pitch-class) analysis
//!
//! Per frame:
//! 1. Fold A-weighted magnitudes in the chroma range onto 12 semitone classes,
//!    70% to the nearest class and 15% to each neighbour
//! 2. Normalise the histogram to sum 1
//! 3. Exponentially smooth against the previous frame
//!
//! Harmonic content (overtone energy relative to the fundamental) lives here
//! too since it reads the same magnitude bins.

pub mod extractor;
pub mod harmonics;
pub mod normalization;
pub mod smoothing;

pub use extractor::ChromaExtractor;
pub use harmonics::harmonic_content;
pub use normalization::normalize_l1;
pub use smoothing::ChromaSmoother;

use crate::config::ChromaConfig;

/// Number of pitch classes
pub const PITCH_CLASSES: usize = 12;

/// Extractor plus smoothing state for one session
#[derive(Debug, Clone)]
pub struct ChromaAnalyzer {
    extractor: ChromaExtractor,
    smoother: ChromaSmoother,
}

impl ChromaAnalyzer {
    /// Build the bin-to-class map for `bins` bins at `sample_rate`
    pub fn new(config: &ChromaConfig, bins: usize, sample_rate: f32) -> Self {
        Self {
            extractor: ChromaExtractor::new(config, bins, sample_rate),
            smoother: ChromaSmoother::new(config.smoothing),
        }
    }

    /// Extract, normalise and smooth one frame; returns the smoothed vector
    pub fn process(&mut self, magnitudes: &[f32]) -> [f32; PITCH_CLASSES] {
        let mut chroma = self.extractor.extract(magnitudes);
        normalize_l1(&mut chroma);
        self.smoother.smooth(&chroma)
    }

    /// Current smoothed vector
    pub fn smoothed(&self) -> [f32; PITCH_CLASSES] {
        self.smoother.state()
    }

    /// Let the smoothed vector fade one frame (silence)
    pub fn decay(&mut self) -> [f32; PITCH_CLASSES] {
        self.smoother.decay()
    }

    /// Clear smoothing state
    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}

/// Index of the largest entry (0 for an all-zero vector)
pub fn dominant_class(chroma: &[f32; PITCH_CLASSES]) -> usize {
    chroma
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_class() {
        let mut c = [0.0f32; 12];
        assert_eq!(dominant_class(&c), 0);
        c[9] = 0.4;
        c[2] = 0.3;
        assert_eq!(dominant_class(&c), 9);
    }

    #[test]
    fn test_analyzer_converges_on_tone() {
        let sr = 44100.0;
        let bins = 1024;
        let bin_width = sr / 2.0 / bins as f32;
        let mut mags = vec![0.0f32; bins];
        mags[(440.0 / bin_width).round() as usize] = 1.0;

        let mut analyzer = ChromaAnalyzer::new(&ChromaConfig::default(), bins, sr);
        let mut chroma = [0.0; 12];
        for _ in 0..60 {
            chroma = analyzer.process(&mags);
        }
        assert_eq!(dominant_class(&chroma), 9);
        assert!((chroma.iter().sum::<f32>() - 1.0).abs() < 0.01);

        analyzer.reset();
        assert_eq!(analyzer.smoothed(), [0.0; 12]);
    }
}
