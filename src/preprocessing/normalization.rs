//! Signal normalisation utilities
//!
//! - Adaptive envelope normalisation: a rolling min/max compressor that maps a
//!   feature stream onto a stable 0..1 range without absolute thresholds
//! - Peak normalisation of a waveform window (removes level bias before pitch
//!   detection)
//!
//! # Example
//!
//! ```
//! use aura_dsp::config::EnvelopeConfig;
//! use aura_dsp::preprocessing::normalization::AdaptiveEnvelopeNormalizer;
//!
//! let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());
//! for _ in 0..100 {
//!     let out = envelope.process(0.4);
//!     assert!((0.0..=1.0).contains(&out));
//! }
//! ```

use crate::config::EnvelopeConfig;

/// Numerical stability epsilon for divisions
const EPSILON: f32 = 1e-10;

/// Floor is never allowed above this value
const MAX_FLOOR: f32 = 0.9;

/// Minimum distance kept between floor and ceiling
const MIN_RANGE: f32 = 0.1;

/// Below this range the input is passed through unchanged
const PASSTHROUGH_RANGE: f32 = 0.01;

/// Rolling min/max compressor for one signal
///
/// The ceiling jumps toward new peaks and decays slowly; the floor follows new
/// lows and creeps upward otherwise. Output is the input's position inside
/// [floor, ceiling].
#[derive(Debug, Clone)]
pub struct AdaptiveEnvelopeNormalizer {
    config: EnvelopeConfig,
    min: f32,
    max: f32,
}

impl AdaptiveEnvelopeNormalizer {
    /// Create a normaliser starting at the configured initial range
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            config,
            min: config.initial_min,
            max: config.initial_max,
        }
    }

    /// Current floor
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Current ceiling
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Feed one value and return it normalised into [0, 1]
    pub fn process(&mut self, value: f32) -> f32 {
        let value = if value.is_finite() { value } else { 0.0 };
        let rate = self.config.adaptive_rate;

        if value > self.max {
            self.max += (value - self.max) * rate;
        } else {
            self.max *= 1.0 - self.config.max_decay;
        }

        if value < self.min {
            self.min += (value - self.min) * rate;
        } else {
            self.min = self.min * (1.0 + self.config.min_decay) + self.config.min_threshold;
        }

        self.min = self.min.clamp(0.0, MAX_FLOOR);
        self.max = self.max.max(self.min + MIN_RANGE).min(1.0);

        let range = self.max - self.min;
        if range > PASSTHROUGH_RANGE {
            ((value - self.min) / range).clamp(0.0, 1.0)
        } else {
            value
        }
    }

    /// Return to the initial range
    pub fn reset(&mut self) {
        self.min = self.config.initial_min;
        self.max = self.config.initial_max;
    }
}

/// Scale `samples` in place so the largest absolute sample is 1.0
///
/// Returns the peak found before scaling. Silent windows (peak below epsilon)
/// are left untouched and report a peak of 0.
pub fn normalize_peak(samples: &mut [f32]) -> f32 {
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);

    if peak <= EPSILON {
        return 0.0;
    }

    let gain = 1.0 / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }

    peak
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_constant_input_converges() {
        let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());

        let outputs: Vec<f32> = (0..2000).map(|_| envelope.process(0.5)).collect();

        for &out in &outputs {
            assert!((0.0..=1.0).contains(&out), "output out of range: {}", out);
        }

        // Last stretch should have settled
        let tail = &outputs[outputs.len() - 100..];
        let lo = tail.iter().copied().fold(f32::MAX, f32::min);
        let hi = tail.iter().copied().fold(f32::MIN, f32::max);
        assert!(hi - lo < 0.05, "output still moving: [{:.4}, {:.4}]", lo, hi);
    }

    #[test]
    fn test_envelope_increasing_input_never_exceeds_one() {
        let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());

        for i in 0..1000 {
            let out = envelope.process(i as f32 * 0.01);
            assert!(out <= 1.0, "output exceeded 1 at step {}: {}", i, out);
            assert!(out >= 0.0);
        }
    }

    #[test]
    fn test_envelope_range_invariants() {
        let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());
        let inputs = [0.0, 1.0, 0.3, 5.0, -2.0, 0.95, 0.01, f32::NAN, 0.5];

        for _ in 0..50 {
            for &v in &inputs {
                envelope.process(v);
                assert!(envelope.min() >= 0.0 && envelope.min() <= 0.9);
                assert!(envelope.max() <= 1.0);
                assert!(envelope.max() >= envelope.min() + 0.1 - 1e-6);
            }
        }
    }

    #[test]
    fn test_envelope_peak_maps_high() {
        let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());
        for _ in 0..200 {
            envelope.process(0.05);
        }
        // A loud value after a quiet stretch sits at the top of the range
        assert!(envelope.process(0.8) > 0.9);
    }

    #[test]
    fn test_envelope_reset() {
        let mut envelope = AdaptiveEnvelopeNormalizer::new(EnvelopeConfig::default());
        for _ in 0..100 {
            envelope.process(0.9);
        }
        envelope.reset();
        assert!((envelope.min() - 0.1).abs() < 1e-6);
        assert!((envelope.max() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_peak() {
        let mut samples = vec![0.1, -0.25, 0.2, 0.0];
        let peak = normalize_peak(&mut samples);
        assert!((peak - 0.25).abs() < 1e-6);
        assert!((samples[1] + 1.0).abs() < 1e-6);
        assert!((samples[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_peak_silent() {
        let mut samples = vec![0.0f32; 16];
        assert_eq!(normalize_peak(&mut samples), 0.0);
        assert!(samples.iter().all(|&x| x == 0.0));
    }
}
