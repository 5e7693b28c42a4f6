//! Adaptive-threshold transient detection
//!
//! One detector per tracked signal (bass, mid, treble, overall). A transient
//! fires when the value clears both an adaptive threshold derived from recent
//! history and the detector's own running level:
//!
//! ```text
//! threshold = max(static, mean(history) · multiplier)
//! fire      = value > threshold && value > running · multiplier
//! running   = running · decay + value · (1 - decay)
//! ```

use std::collections::VecDeque;

use super::threshold::adaptive_threshold;
use crate::config::{TransientBankConfig, TransientConfig};

/// Spike detector for one signal
#[derive(Debug, Clone)]
pub struct TransientDetector {
    config: TransientConfig,
    running: f32,
    history: VecDeque<f32>,
    capacity: usize,
}

impl TransientDetector {
    /// Create a detector with a history ring of `history_len` values
    pub fn new(config: TransientConfig, history_len: usize) -> Self {
        Self {
            config,
            running: 0.0,
            history: VecDeque::with_capacity(history_len),
            capacity: history_len.max(1),
        }
    }

    /// Running (smoothed) level
    pub fn running_value(&self) -> f32 {
        self.running
    }

    /// Feed one value; returns true when it is a transient
    pub fn process(&mut self, value: f32) -> bool {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(value);

        let threshold =
            adaptive_threshold(&self.history, self.config.threshold, self.config.multiplier);
        let fired = value > threshold && value > self.running * self.config.multiplier;

        self.running = self.running * self.config.decay + value * (1.0 - self.config.decay);

        fired
    }

    /// Clear history and running level
    pub fn reset(&mut self) {
        self.running = 0.0;
        self.history.clear();
    }
}

/// Transient flags for the four tracked signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransientFlags {
    /// Bass band
    pub bass: bool,
    /// Mid band
    pub mid: bool,
    /// Treble band
    pub treble: bool,
    /// Overall energy
    pub overall: bool,
}

/// The four detectors the engine runs every frame
#[derive(Debug, Clone)]
pub struct TransientBank {
    bass: TransientDetector,
    mid: TransientDetector,
    treble: TransientDetector,
    overall: TransientDetector,
}

impl TransientBank {
    /// Create the bank from configuration
    pub fn new(config: &TransientBankConfig) -> Self {
        let len = config.history_len;
        Self {
            bass: TransientDetector::new(config.bass, len),
            mid: TransientDetector::new(config.mid, len),
            treble: TransientDetector::new(config.treble, len),
            overall: TransientDetector::new(config.overall, len),
        }
    }

    /// Run all four detectors
    pub fn process(&mut self, bass: f32, mid: f32, treble: f32, overall: f32) -> TransientFlags {
        TransientFlags {
            bass: self.bass.process(bass),
            mid: self.mid.process(mid),
            treble: self.treble.process(treble),
            overall: self.overall.process(overall),
        }
    }

    /// Reset all four detectors
    pub fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.treble.reset();
        self.overall.reset();
    }
}
