//! PCM → analyser frame conversion
//!
//! Produces the engine's byte input contract from a mono PCM window, the way a
//! capture-side spectrum analyser does:
//!
//! 1. Blackman window, forward FFT
//! 2. Magnitude `|X[k]|·2/Σw` (a full-scale sine peaks near 1.0)
//! 3. Temporal smoothing `S = τ·S_prev + (1-τ)·|X|`
//! 4. dB conversion, mapped linearly from [min_db, max_db] onto 0..255
//!
//! The waveform bytes are `128 + 128·x`, clamped.
//!
//! # Example
//!
//! ```
//! use aura_dsp::io::{AnalyserConfig, FrameAnalyser};
//!
//! let mut analyser = FrameAnalyser::new(AnalyserConfig::default())?;
//! let window: Vec<f32> = (0..2048)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin() * 0.5)
//!     .collect();
//! let frame = analyser.analyse(&window, 44100.0, 0.0)?;
//! assert_eq!(frame.magnitudes.len(), 1024);
//! assert_eq!(frame.waveform.len(), 2048);
//! # Ok::<(), aura_dsp::AnalysisError>(())
//! ```

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::frame::FrameInput;
use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-12;

/// Analyser parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserConfig {
    /// FFT size, power of two >= 32 (default: 2048)
    pub fft_size: usize,
    /// dB value mapped to byte 0 (default: -100.0)
    pub min_db: f32,
    /// dB value mapped to byte 255 (default: -30.0)
    pub max_db: f32,
    /// Temporal smoothing constant in [0, 1) (default: 0.8)
    pub smoothing: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            min_db: -100.0,
            max_db: -30.0,
            smoothing: 0.8,
        }
    }
}

/// Stateful spectrum analyser producing `FrameInput`s
pub struct FrameAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    window_sum: f32,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl FrameAnalyser {
    /// Create an analyser
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the FFT size is not a power of
    /// two >= 32, the dB range is empty, or smoothing is outside [0, 1).
    pub fn new(config: AnalyserConfig) -> Result<Self, AnalysisError> {
        if config.fft_size < 32 || !config.fft_size.is_power_of_two() {
            return Err(AnalysisError::InvalidConfig(format!(
                "fft_size must be a power of two >= 32, got {}",
                config.fft_size
            )));
        }

        if config.min_db >= config.max_db {
            return Err(AnalysisError::InvalidConfig(format!(
                "Invalid dB range: [{:.1}, {:.1}]",
                config.min_db, config.max_db
            )));
        }

        if !(0.0..1.0).contains(&config.smoothing) {
            return Err(AnalysisError::InvalidConfig(format!(
                "smoothing must be in [0, 1), got {}",
                config.smoothing
            )));
        }

        let n = config.fft_size;
        let window: Vec<f32> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();
        let window_sum = window.iter().sum::<f32>();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);

        log::debug!(
            "FrameAnalyser: fft_size={}, dB range=[{:.1}, {:.1}], smoothing={:.2}",
            n,
            config.min_db,
            config.max_db,
            config.smoothing
        );

        Ok(Self {
            config,
            fft,
            window,
            window_sum,
            buffer: vec![Complex::new(0.0, 0.0); n],
            smoothed: vec![0.0; n / 2],
        })
    }

    /// FFT size (also the waveform length of produced frames)
    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Convert one PCM window (exactly `fft_size` samples) into a frame
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the window length is wrong.
    pub fn analyse(
        &mut self,
        samples: &[f32],
        sample_rate: f32,
        timestamp: f64,
    ) -> Result<FrameInput, AnalysisError> {
        let n = self.config.fft_size;
        if samples.len() != n {
            return Err(AnalysisError::InvalidInput(format!(
                "Analyser expects {} samples, got {}",
                n,
                samples.len()
            )));
        }

        for ((slot, &x), &w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 2.0 / self.window_sum.max(EPSILON);
        let tau = self.config.smoothing;
        let db_range = self.config.max_db - self.config.min_db;

        let magnitudes: Vec<u8> = self
            .smoothed
            .iter_mut()
            .zip(&self.buffer[..n / 2])
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * scale;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                let db = 20.0 * smoothed.max(EPSILON).log10();
                let scaled = 255.0 * (db - self.config.min_db) / db_range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();

        let waveform: Vec<u8> = samples
            .iter()
            .map(|&x| (128.0 + x * 128.0).round().clamp(0.0, 255.0) as u8)
            .collect();

        Ok(FrameInput::new(magnitudes, waveform, sample_rate, timestamp))
    }

    /// Clear the smoothing state
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
    }
}
