//! Normalised autocorrelation for periodicity detection
//!
//! Finds periodicity in the onset detection function history using
//! FFT-accelerated autocorrelation: `ACF = IFFT(|FFT(signal)|²)`, zero-padded
//! to at least twice the signal length so the result is linear, not circular.
//!
//! The signal is mean-removed first and every lag is divided by the zero-lag
//! value (the signal's self-energy), so `acf[0] == 1` and peaks read directly
//! as a confidence in [0, 1].
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

const EPSILON: f32 = 1e-10;

/// Later lags must beat the running best by more than this to win
///
/// FFT round-off makes exact ties unlikely; within this tolerance two lags are
/// treated as tied and the shorter one (faster tempo) is kept.
const TIE_TOLERANCE: f32 = 1e-5;

/// FFT autocorrelation over signals of a fixed maximum length
pub struct Autocorrelator {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    max_len: usize,
}

impl std::fmt::Debug for Autocorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autocorrelator")
            .field("max_len", &self.max_len)
            .field("fft_size", &self.buffer.len())
            .finish()
    }
}

impl Autocorrelator {
    /// Plan FFTs for signals up to `max_len` samples
    pub fn new(max_len: usize) -> Self {
        let fft_size = (2 * max_len.max(1)).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            max_len,
        }
    }

    /// Normalised autocorrelation of `signal` for lags `0..=max_lag`
    ///
    /// Returns all zeros when the signal has no energy after mean removal
    /// (silence or a constant), so callers never divide by zero.
    pub fn normalized(&mut self, signal: &[f32], max_lag: usize) -> Vec<f32> {
        let n = signal.len().min(self.max_len);
        let lags = max_lag.min(n.saturating_sub(1)) + 1;
        if n == 0 {
            return vec![0.0; max_lag + 1];
        }

        let mean = signal[..n].iter().sum::<f32>() / n as f32;

        for (slot, &x) in self.buffer.iter_mut().zip(&signal[..n]) {
            *slot = Complex::new(x - mean, 0.0);
        }
        for slot in self.buffer[n..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.forward.process(&mut self.buffer);
        for x in self.buffer.iter_mut() {
            *x = *x * x.conj();
        }
        self.inverse.process(&mut self.buffer);

        let zero_lag = self.buffer[0].re;
        let mut acf = vec![0.0f32; max_lag + 1];
        if zero_lag <= EPSILON * self.buffer.len() as f32 {
            return acf;
        }

        for (lag, value) in acf.iter_mut().take(lags).enumerate() {
            *value = (self.buffer[lag].re / zero_lag).clamp(-1.0, 1.0);
        }
        acf
    }
}

/// Lag with the highest autocorrelation in `lag_min..=lag_max`
///
/// Ties (within round-off) resolve to the shortest lag, favouring the finer
/// rhythmic level over its multiples. Returns `None` for an empty range.
pub fn select_peak_lag(acf: &[f32], lag_min: usize, lag_max: usize) -> Option<(usize, f32)> {
    let lag_min = lag_min.max(1);
    let lag_max = lag_max.min(acf.len().saturating_sub(1));
    if lag_min > lag_max {
        return None;
    }

    let mut best = (lag_min, acf[lag_min]);
    for (lag, &value) in acf.iter().enumerate().take(lag_max + 1).skip(lag_min + 1) {
        if value > best.1 + TIE_TOLERANCE {
            best = (lag, value);
        }
    }
    Some(best)
}
