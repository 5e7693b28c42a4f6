//! Mel-band spectral flux onset detection function
//!
//! Per frame:
//! 1. Apply the mel filterbank to the normalised magnitudes
//! 2. Half-wave rectified flux per band: `max(0, E_b(t) - E_b(t-1))`
//! 3. ODF = median of the strictly positive fluxes (0 when no band increased)
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use super::mel::MelFilterbank;
use super::threshold::median;
use crate::config::OnsetConfig;

/// Stateful onset detection function over mel-band energies
#[derive(Debug, Clone)]
pub struct OnsetDetectionEngine {
    filterbank: MelFilterbank,
    flux_scale: f32,
    previous: Vec<f32>,
    current: Vec<f32>,
    has_previous: bool,
    positive_flux: Vec<f32>,
}

impl OnsetDetectionEngine {
    /// Create an ODF for `bins` magnitude bins at `sample_rate`
    pub fn new(config: &OnsetConfig, bins: usize, sample_rate: f32) -> Self {
        let filterbank =
            MelFilterbank::new(config.mel_bands, bins, sample_rate, config.min_frequency);
        Self {
            filterbank,
            flux_scale: config.flux_scale,
            previous: Vec::with_capacity(config.mel_bands),
            current: Vec::with_capacity(config.mel_bands),
            has_previous: false,
            positive_flux: Vec::with_capacity(config.mel_bands),
        }
    }

    /// Sample rate the filterbank was built for
    pub fn sample_rate(&self) -> f32 {
        self.filterbank.sample_rate()
    }

    /// Mel energies of the most recent frame
    pub fn mel_energies(&self) -> &[f32] {
        &self.previous
    }

    /// Compute the ODF for one frame of normalised magnitudes
    ///
    /// The first frame after construction or `reset` has no predecessor and
    /// yields 0.
    pub fn process(&mut self, magnitudes: &[f32]) -> f32 {
        self.filterbank.apply(magnitudes, &mut self.current);

        self.positive_flux.clear();
        if self.has_previous {
            self.positive_flux.extend(
                self.current
                    .iter()
                    .zip(&self.previous)
                    .map(|(now, before)| now - before)
                    .filter(|&flux| flux > 0.0),
            );
        }

        let odf = median(&self.positive_flux);

        std::mem::swap(&mut self.previous, &mut self.current);
        self.has_previous = true;

        log::trace!(
            "ODF: {:.5} ({} of {} bands rising)",
            odf,
            self.positive_flux.len(),
            self.filterbank.len()
        );

        odf
    }

    /// ODF scaled and clamped for display as `spectral.flux`
    pub fn display_flux(&self, odf: f32) -> f32 {
        (odf * self.flux_scale).clamp(0.0, 1.0)
    }

    /// Treat the next frame as rising from silence
    pub fn zero_previous(&mut self) {
        self.previous.clear();
        self.previous.resize(self.filterbank.len(), 0.0);
        self.has_previous = true;
    }

    /// Forget the previous frame
    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
        self.has_previous = false;
    }
}
