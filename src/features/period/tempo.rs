//! Tempo estimation from the onset detection function history
//!
//! The ODF is sampled onto a fixed analysis grid (≈43 Hz by default),
//! independent of how often the caller runs the engine, into a ring buffer of
//! ≈6 s. Tempo is the lag with the strongest normalised autocorrelation inside
//! the plausible BPM window:
//!
//! ```text
//! lag = analysis_rate · 60 / bpm        bpm = 60 · analysis_rate / lag
//! ```
//!
//! Beat phase is extrapolated from the last beat time, which is re-anchored to
//! the signal whenever the overall transient detector fires.

use std::collections::VecDeque;

use super::autocorrelation::{select_peak_lag, Autocorrelator};
use crate::config::TempoConfig;

/// Correlation (relative to the beat peak) needed to report a subdivision
const SUBDIVISION_RATIO: f32 = 0.5;

/// Below this BPM a decaying estimate snaps to 0
const MIN_REPORTED_BPM: f32 = 1.0;

/// Below this a decaying confidence snaps to 0
const MIN_REPORTED_CONFIDENCE: f32 = 0.01;

/// Result of one tempo estimate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TempoEstimate {
    /// Tempo in BPM (0 when no confident estimate)
    pub bpm: f32,
    /// Peak autocorrelation relative to self-energy (0.0-1.0)
    pub confidence: f32,
    /// Pulses per beat suggested by the autocorrelation (1, 2 or 4; 0 without tempo)
    pub subdivision: u8,
}

/// Ring buffer of ODF samples plus beat-phase tracking
#[derive(Debug)]
pub struct TempoEstimator {
    config: TempoConfig,
    history: VecDeque<f32>,
    autocorrelator: Autocorrelator,
    /// Timestamp of analysis slot 0
    anchor: Option<f64>,
    /// Index of the most recently filled slot
    last_slot: u64,
    last_beat_time: Option<f64>,
    current: TempoEstimate,
    lag_min: usize,
    lag_max: usize,
}

impl TempoEstimator {
    /// Create an estimator from configuration
    pub fn new(config: TempoConfig) -> Self {
        let rate = config.analysis_rate;
        let lag_min = ((rate * 60.0) / config.max_bpm).ceil().max(1.0) as usize;
        let lag_max = ((rate * 60.0) / config.min_bpm).floor().max(1.0) as usize;

        log::debug!(
            "TempoEstimator: {} slots at {:.1} Hz, lags [{}, {}] ({:.0}-{:.0} BPM)",
            config.history_len,
            rate,
            lag_min,
            lag_max,
            config.min_bpm,
            config.max_bpm
        );

        Self {
            history: VecDeque::with_capacity(config.history_len),
            autocorrelator: Autocorrelator::new(config.history_len),
            anchor: None,
            last_slot: 0,
            last_beat_time: None,
            current: TempoEstimate::default(),
            lag_min,
            lag_max,
            config,
        }
    }

    /// Number of ODF samples currently held
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no ODF sample has been pushed
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Most recent estimate
    pub fn current(&self) -> TempoEstimate {
        self.current
    }

    /// Append one ODF sample directly (one analysis slot)
    pub fn push(&mut self, odf: f32) {
        if self.history.len() == self.config.history_len {
            self.history.pop_front();
        }
        self.history.push_back(if odf.is_finite() { odf.max(0.0) } else { 0.0 });
    }

    /// Record an ODF value observed at `timestamp` seconds
    ///
    /// Maps the timestamp onto the analysis grid: a new slot pushes the value
    /// (skipped slots are padded with 0), a frame landing in the slot already
    /// filled keeps the max of the two. A timestamp that moves backwards
    /// re-anchors the grid.
    pub fn observe(&mut self, odf: f32, timestamp: f64) {
        let rate = self.config.analysis_rate as f64;

        let anchor = match self.anchor {
            Some(anchor) if timestamp >= anchor => anchor,
            _ => {
                self.anchor = Some(timestamp);
                self.last_slot = 0;
                self.push(odf);
                return;
            }
        };

        let slot = ((timestamp - anchor) * rate + 1e-6).floor() as u64;
        if slot < self.last_slot {
            // Went backwards inside the grid
            self.anchor = Some(timestamp);
            self.last_slot = 0;
            self.push(odf);
            return;
        }

        if slot == self.last_slot {
            if let Some(last) = self.history.back_mut() {
                *last = last.max(odf);
            }
            return;
        }

        let gap = ((slot - self.last_slot - 1) as usize).min(self.config.history_len);
        for _ in 0..gap {
            self.push(0.0);
        }
        self.push(odf);
        self.last_slot = slot;
    }

    /// Estimate tempo from the current history
    ///
    /// Estimates whose confidence falls below the configured minimum degrade
    /// to bpm = 0.
    pub fn detect_bpm(&mut self) -> TempoEstimate {
        if self.history.len() <= self.lag_min {
            self.current = TempoEstimate::default();
            return self.current;
        }

        let signal = self.history.make_contiguous();
        let acf = self.autocorrelator.normalized(signal, self.lag_max);

        let estimate = match select_peak_lag(&acf, self.lag_min, self.lag_max) {
            Some((lag, value)) if value >= self.config.min_confidence => TempoEstimate {
                bpm: 60.0 * self.config.analysis_rate / lag as f32,
                confidence: value.clamp(0.0, 1.0),
                subdivision: subdivision(&acf, lag, value),
            },
            Some((_, value)) => {
                log::trace!("Tempo confidence {:.3} below minimum, reporting 0 BPM", value);
                TempoEstimate {
                    bpm: 0.0,
                    confidence: value.clamp(0.0, 1.0),
                    subdivision: 0,
                }
            }
            None => TempoEstimate::default(),
        };

        self.current = estimate;
        estimate
    }

    /// Decay the held estimate one frame toward 0 (used during silence)
    pub fn decay(&mut self) -> TempoEstimate {
        let factor = self.config.silence_decay;
        let mut est = self.current;

        est.bpm *= factor;
        est.confidence *= factor;
        if est.bpm < MIN_REPORTED_BPM {
            est.bpm = 0.0;
            est.subdivision = 0;
        }
        if est.confidence < MIN_REPORTED_CONFIDENCE {
            est.confidence = 0.0;
        }

        self.current = est;
        est
    }

    /// Re-anchor beat phase on an observed beat
    pub fn mark_beat(&mut self, timestamp: f64) {
        self.last_beat_time = Some(timestamp);
    }

    /// Fractional position (0..1) inside the current beat at `timestamp`
    pub fn beat_phase(&self, timestamp: f64) -> f32 {
        let bpm = self.current.bpm;
        let Some(last_beat) = self.last_beat_time else {
            return 0.0;
        };
        if bpm <= 0.0 {
            return 0.0;
        }

        let period = 60.0 / bpm as f64;
        let elapsed = (timestamp - last_beat).max(0.0);
        ((elapsed / period).fract() as f32).clamp(0.0, 1.0)
    }

    /// Clear history, grid anchor, beat time and estimate
    pub fn reset(&mut self) {
        self.history.clear();
        self.anchor = None;
        self.last_slot = 0;
        self.last_beat_time = None;
        self.current = TempoEstimate::default();
    }
}

/// Pulses per beat implied by strong correlation at a quarter or half of the beat lag
fn subdivision(acf: &[f32], lag: usize, peak: f32) -> u8 {
    let strong = |div: usize| {
        let sub_lag = (lag as f32 / div as f32).round() as usize;
        sub_lag >= 2 && acf.get(sub_lag).is_some_and(|&v| v >= peak * SUBDIVISION_RATIO)
    };

    if strong(4) {
        4
    } else if strong(2) {
        2
    } else {
        1
    }
}
