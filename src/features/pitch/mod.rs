//! Fundamental frequency estimation
//!
//! YIN on the time-domain waveform, falling back to spectral peak-picking
//! when YIN finds no lag under its threshold or reports a low probability.
//!
//! # Example
//!
//! ```
//! use aura_dsp::config::PitchConfig;
//! use aura_dsp::features::pitch::{note_name, PitchDetector};
//!
//! let sr = 44100.0;
//! let wave: Vec<f32> = (0..2048)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr).sin())
//!     .collect();
//! let mags = vec![0.0f32; 1024];
//!
//! let mut detector = PitchDetector::new(PitchConfig::default());
//! let est = detector.detect(&wave, &mags, sr);
//! assert_eq!(note_name(est.frequency), "A4");
//! ```

pub mod spectral_peak;
pub mod yin;

pub use spectral_peak::{find_spectral_peak, SpectralPeak};
pub use yin::{Yin, YinEstimate};

use crate::analysis::result::NOTE_NAMES;
use crate::config::PitchConfig;

/// Which path produced a pitch estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PitchSource {
    /// Time-domain YIN
    Yin,
    /// Magnitude-spectrum peak
    SpectralPeak,
    /// No pitch found
    #[default]
    None,
}

/// One frame's pitch estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PitchEstimate {
    /// Fundamental in Hz (0 when unpitched)
    pub frequency: f32,
    /// Confidence (0.0-1.0)
    pub confidence: f32,
    /// Estimator that produced the value
    pub source: PitchSource,
}

/// YIN pitch detector with spectral fallback
#[derive(Debug, Clone)]
pub struct PitchDetector {
    config: PitchConfig,
    yin: Yin,
}

impl PitchDetector {
    /// Create a detector from configuration
    pub fn new(config: PitchConfig) -> Self {
        let yin = Yin::new(
            config.window_size,
            config.threshold,
            config.min_frequency,
            config.max_frequency,
        );
        Self { config, yin }
    }

    /// Estimate the fundamental for one frame
    ///
    /// # Arguments
    ///
    /// * `waveform` - Centred samples (-1.0 to 1.0)
    /// * `magnitudes` - Normalised magnitudes (0.0-1.0) for the fallback
    /// * `sample_rate` - Sample rate in Hz
    pub fn detect(&mut self, waveform: &[f32], magnitudes: &[f32], sample_rate: f32) -> PitchEstimate {
        if let Some(est) = self.yin.detect(waveform, sample_rate) {
            if est.probability >= self.config.min_probability {
                log::trace!(
                    "YIN: {:.2} Hz (p = {:.3})",
                    est.frequency,
                    est.probability
                );
                return PitchEstimate {
                    frequency: est.frequency,
                    confidence: est.probability,
                    source: PitchSource::Yin,
                };
            }
        }

        if magnitudes.is_empty() {
            return PitchEstimate::default();
        }
        let bin_width = (sample_rate / 2.0) / magnitudes.len() as f32;

        match find_spectral_peak(
            magnitudes,
            bin_width,
            self.config.min_frequency,
            self.config.max_frequency,
            self.config.fallback_confidence_cap,
        ) {
            Some(peak) => {
                log::trace!(
                    "YIN inconclusive, spectral peak {:.2} Hz (c = {:.3})",
                    peak.frequency,
                    peak.confidence
                );
                PitchEstimate {
                    frequency: peak.frequency,
                    confidence: peak.confidence,
                    source: PitchSource::SpectralPeak,
                }
            }
            None => PitchEstimate::default(),
        }
    }
}

/// Fractional MIDI note number of `frequency` (A4 = 440 Hz = 69)
///
/// Returns `None` for non-positive or non-finite frequencies.
pub fn frequency_to_midi(frequency: f32) -> Option<f32> {
    if frequency <= 0.0 || !frequency.is_finite() {
        return None;
    }
    Some(12.0 * (frequency / 440.0).log2() + 69.0)
}

/// Scientific pitch name of the nearest note ("A4", "C#5"), or "N/A"
pub fn note_name(frequency: f32) -> String {
    let Some(midi) = frequency_to_midi(frequency) else {
        return "N/A".to_string();
    };
    let note = midi.round() as i32;
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}
