//! Chroma vector extraction
//!
//! Maps each magnitude bin in the chroma range to a pitch class once per
//! session, then folds every frame's A-weighted magnitudes onto 12 classes:
//!
//! ```text
//! midi  = 12 · log2(f / 440) + 69
//! class = round(midi) mod 12
//! ```
//!
//! Each bin contributes `center_weight` to its class and `neighbor_weight` to
//! each adjacent semitone, which softens the hard boundaries of the binning.

use super::PITCH_CLASSES;
use crate::config::ChromaConfig;
use crate::features::pitch::frequency_to_midi;
use crate::preprocessing::weighting::a_weighting;

/// Precomputed bin-to-pitch-class map
#[derive(Debug, Clone)]
pub struct ChromaExtractor {
    /// (bin index, pitch class, A-weight)
    bins: Vec<(usize, usize, f32)>,
    center_weight: f32,
    neighbor_weight: f32,
}

impl ChromaExtractor {
    /// Map bins of a `bins`-long magnitude frame at `sample_rate`
    pub fn new(config: &ChromaConfig, bins: usize, sample_rate: f32) -> Self {
        let bin_width = if bins > 0 {
            (sample_rate / 2.0) / bins as f32
        } else {
            0.0
        };

        let mapped: Vec<(usize, usize, f32)> = (0..bins)
            .filter_map(|i| {
                let freq = i as f32 * bin_width;
                if freq < config.min_frequency || freq > config.max_frequency {
                    return None;
                }
                let midi = frequency_to_midi(freq)?;
                let class = (midi.round() as i32).rem_euclid(PITCH_CLASSES as i32) as usize;
                Some((i, class, a_weighting(freq)))
            })
            .collect();

        log::debug!(
            "ChromaExtractor: {} of {} bins in [{:.0}, {:.0}] Hz",
            mapped.len(),
            bins,
            config.min_frequency,
            config.max_frequency
        );

        Self {
            bins: mapped,
            center_weight: config.center_weight,
            neighbor_weight: config.neighbor_weight,
        }
    }

    /// Number of bins that contribute to the chroma vector
    pub fn mapped_bins(&self) -> usize {
        self.bins.len()
    }

    /// Raw (unnormalised) chroma histogram of one frame
    pub fn extract(&self, magnitudes: &[f32]) -> [f32; PITCH_CLASSES] {
        let mut chroma = [0.0f32; PITCH_CLASSES];

        for &(bin, class, weight) in &self.bins {
            let Some(&magnitude) = magnitudes.get(bin) else {
                continue;
            };
            let energy = magnitude * weight;
            if energy <= 0.0 {
                continue;
            }
            chroma[class] += energy * self.center_weight;
            chroma[(class + 1) % PITCH_CLASSES] += energy * self.neighbor_weight;
            chroma[(class + PITCH_CLASSES - 1) % PITCH_CLASSES] += energy * self.neighbor_weight;
        }

        chroma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bin_split() {
        let sr = 44100.0;
        let bins = 1024;
        let bin_width = sr / 2.0 / bins as f32;
        let extractor = ChromaExtractor::new(&ChromaConfig::default(), bins, sr);

        let mut mags = vec![0.0f32; bins];
        let k = (440.0 / bin_width).round() as usize;
        mags[k] = 1.0;

        let chroma = extractor.extract(&mags);
        let total: f32 = chroma.iter().sum();
        assert!(total > 0.0);
        assert!((chroma[9] / total - 0.7).abs() < 1e-5);
        assert!((chroma[8] / total - 0.15).abs() < 1e-5);
        assert!((chroma[10] / total - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_bins_ignored() {
        let sr = 44100.0;
        let extractor = ChromaExtractor::new(&ChromaConfig::default(), 1024, sr);
        let mut mags = vec![0.0f32; 1024];
        mags[1] = 1.0; // ~21 Hz
        mags[1000] = 1.0; // ~21.5 kHz
        assert_eq!(extractor.extract(&mags), [0.0; 12]);
        assert!(extractor.mapped_bins() > 0);
    }

    #[test]
    fn test_wraps_around_octave() {
        let sr = 44100.0;
        let bins = 4096;
        let bin_width = sr / 2.0 / bins as f32;
        let extractor = ChromaExtractor::new(&ChromaConfig::default(), bins, sr);

        // B3 ≈ 246.94 Hz: neighbours are A# and C
        let mut mags = vec![0.0f32; bins];
        mags[(246.94 / bin_width).round() as usize] = 1.0;
        let chroma = extractor.extract(&mags);
        assert!(chroma[11] > chroma[0]);
        assert!(chroma[0] > 0.0);
        assert!((chroma[0] - chroma[10]).abs() < 1e-6);
    }
}
