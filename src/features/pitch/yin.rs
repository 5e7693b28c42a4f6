//! YIN fundamental frequency estimation
//!
//! 1. **Difference function** - d(τ) = Σ(x[j] - x[j+τ])²
//! 2. **Cumulative mean normalised difference** - d'(τ) = d(τ)·τ / Σ_{j=1..τ} d(j), d'(0) = 1
//! 3. **Absolute threshold** - first τ in range with d'(τ) below the threshold,
//!    followed down to its local minimum (never the global minimum, which
//!    invites octave errors)
//! 4. **Parabolic interpolation** - sub-sample refinement over τ-1, τ, τ+1
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency estimator
//! for speech and music. *The Journal of the Acoustical Society of America*, 111(4), 1917-1930.

use crate::preprocessing::normalization::normalize_peak;

const EPSILON: f32 = 1e-10;

/// Successful YIN estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinEstimate {
    /// Fundamental in Hz
    pub frequency: f32,
    /// 1 - d'(τ) at the selected lag, clamped to [0, 1]
    pub probability: f32,
}

/// YIN detector with pre-allocated buffers
#[derive(Debug, Clone)]
pub struct Yin {
    window_size: usize,
    threshold: f32,
    min_frequency: f32,
    max_frequency: f32,
    frame: Vec<f32>,
    difference: Vec<f32>,
    cumulative_mean: Vec<f32>,
}

impl Yin {
    /// Create a detector analysing at most `window_size` samples
    pub fn new(window_size: usize, threshold: f32, min_frequency: f32, max_frequency: f32) -> Self {
        Self {
            window_size,
            threshold,
            min_frequency,
            max_frequency,
            frame: Vec::with_capacity(window_size),
            difference: Vec::new(),
            cumulative_mean: Vec::new(),
        }
    }

    /// Estimate the fundamental of `samples` (centred waveform)
    ///
    /// Uses the most recent `window_size` samples, peak-normalised. Returns
    /// `None` for silent windows, windows too short for the frequency range,
    /// and when no lag falls below the threshold.
    pub fn detect(&mut self, samples: &[f32], sample_rate: f32) -> Option<YinEstimate> {
        let len = samples.len().min(self.window_size);
        self.frame.clear();
        self.frame.extend_from_slice(&samples[samples.len() - len..]);

        if normalize_peak(&mut self.frame) <= 0.0 {
            return None;
        }

        let tau_min = ((sample_rate / self.max_frequency).floor() as usize).max(2);
        let tau_max = ((sample_rate / self.min_frequency).ceil() as usize).min(len / 2);
        if tau_max <= tau_min + 1 {
            log::trace!(
                "YIN window of {} samples too short for [{}, {}] lags",
                len,
                tau_min,
                tau_max
            );
            return None;
        }

        self.compute_difference(tau_max);
        self.compute_cumulative_mean(tau_max);

        let tau = self.first_dip(tau_min, tau_max)?;
        let refined = self.parabolic_interpolation(tau, tau_max);
        if refined <= 0.0 {
            return None;
        }

        Some(YinEstimate {
            frequency: sample_rate / refined,
            probability: (1.0 - self.cumulative_mean[tau]).clamp(0.0, 1.0),
        })
    }

    fn compute_difference(&mut self, tau_max: usize) {
        let x = &self.frame;
        let width = x.len() - tau_max;

        self.difference.clear();
        self.difference.resize(tau_max + 1, 0.0);

        for tau in 1..=tau_max {
            let mut sum = 0.0f32;
            for j in 0..width {
                let delta = x[j] - x[j + tau];
                sum += delta * delta;
            }
            self.difference[tau] = sum;
        }
    }

    fn compute_cumulative_mean(&mut self, tau_max: usize) {
        self.cumulative_mean.clear();
        self.cumulative_mean.resize(tau_max + 1, 1.0);

        let mut running_sum = 0.0f32;
        for tau in 1..=tau_max {
            running_sum += self.difference[tau];
            if running_sum > EPSILON {
                self.cumulative_mean[tau] = self.difference[tau] * tau as f32 / running_sum;
            }
        }
    }

    /// First lag under the threshold, walked down to its local minimum
    fn first_dip(&self, tau_min: usize, tau_max: usize) -> Option<usize> {
        let d = &self.cumulative_mean;
        let mut tau = tau_min;

        while tau < tau_max {
            if d[tau] < self.threshold {
                while tau + 1 < tau_max && d[tau + 1] < d[tau] {
                    tau += 1;
                }
                return Some(tau);
            }
            tau += 1;
        }

        None
    }

    fn parabolic_interpolation(&self, tau: usize, tau_max: usize) -> f32 {
        if tau < 1 || tau + 1 > tau_max {
            return tau as f32;
        }

        let s0 = self.cumulative_mean[tau - 1];
        let s1 = self.cumulative_mean[tau];
        let s2 = self.cumulative_mean[tau + 1];
        let denominator = 2.0 * (2.0 * s1 - s2 - s0);

        if denominator.abs() > EPSILON {
            let adjustment = ((s2 - s0) / denominator).clamp(-1.0, 1.0);
            tau as f32 + adjustment
        } else {
            tau as f32
        }
    }
}
