//! Perceptual frequency bands and spectral shape descriptors
//!
//! Bass / mid / treble energies are A-weighted means of the normalised
//! magnitudes in each band (not raw sums), so band values stay on the same
//! 0..1 scale as the input regardless of how many bins a band spans.
//!
//! Band edges:
//! - Bass: f ≤ 250 Hz
//! - Mid: 250 Hz < f ≤ 4000 Hz
//! - Treble: 4000 Hz < f < Nyquist

use crate::preprocessing::weighting::a_weighting;

/// Upper edge of the bass band in Hz
pub const BASS_MAX_HZ: f32 = 250.0;

/// Upper edge of the mid band in Hz
pub const MID_MAX_HZ: f32 = 4000.0;

/// Fraction of spectral magnitude below the rolloff frequency
const ROLLOFF_FRACTION: f32 = 0.85;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Band energies in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    /// Bass band
    pub bass: f32,
    /// Mid band
    pub mid: f32,
    /// Treble band
    pub treble: f32,
}

/// Spectral shape descriptors, each normalised into [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralShape {
    /// Magnitude-weighted mean frequency / Nyquist
    pub centroid: f32,
    /// Magnitude-weighted standard deviation around the centroid / (Nyquist / 2)
    pub spread: f32,
    /// Frequency below which 85% of the magnitude lies / Nyquist
    pub rolloff: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Bass,
    Mid,
    Treble,
}

/// A-weighted band analyzer for a fixed bin count and sample rate
#[derive(Debug, Clone)]
pub struct SpectralBandAnalyzer {
    /// (band, weight) per bin; `None` for bins outside every band
    bins: Vec<Option<(Band, f32)>>,
    bin_width: f32,
    nyquist: f32,
}

impl SpectralBandAnalyzer {
    /// Precompute band membership and A-weights for `bins` bins at `sample_rate`
    pub fn new(bins: usize, sample_rate: f32) -> Self {
        let nyquist = sample_rate / 2.0;
        let bin_width = if bins > 0 { nyquist / bins as f32 } else { 0.0 };

        let bins = (0..bins)
            .map(|i| {
                let freq = i as f32 * bin_width;
                let band = if freq <= BASS_MAX_HZ {
                    Band::Bass
                } else if freq <= MID_MAX_HZ {
                    Band::Mid
                } else if freq < nyquist {
                    Band::Treble
                } else {
                    return None;
                };
                Some((band, a_weighting(freq)))
            })
            .collect();

        Self {
            bins,
            bin_width,
            nyquist,
        }
    }

    /// Width of one bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }

    /// A-weighted mean magnitude per band
    ///
    /// A band with no assigned weight (e.g. no bins below 250 Hz at a very
    /// coarse resolution) reports 0.
    pub fn analyze(&self, magnitudes: &[f32]) -> BandEnergies {
        let mut sums = [0.0f32; 3];
        let mut weights = [0.0f32; 3];

        for (slot, &magnitude) in self.bins.iter().zip(magnitudes) {
            if let Some((band, weight)) = slot {
                let idx = *band as usize;
                sums[idx] += weight * magnitude;
                weights[idx] += weight;
            }
        }

        let mean = |idx: usize| {
            if weights[idx] > EPSILON {
                (sums[idx] / weights[idx]).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        BandEnergies {
            bass: mean(Band::Bass as usize),
            mid: mean(Band::Mid as usize),
            treble: mean(Band::Treble as usize),
        }
    }

    /// Centroid, spread and rolloff of the magnitude spectrum
    pub fn shape(&self, magnitudes: &[f32]) -> SpectralShape {
        let total: f32 = magnitudes.iter().sum();
        if total <= EPSILON || self.nyquist <= 0.0 {
            return SpectralShape::default();
        }

        let centroid_hz = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| i as f32 * self.bin_width * m)
            .sum::<f32>()
            / total;

        let variance = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                let d = i as f32 * self.bin_width - centroid_hz;
                d * d * m
            })
            .sum::<f32>()
            / total;

        let target = total * ROLLOFF_FRACTION;
        let mut cumulative = 0.0f32;
        let mut rolloff_hz = 0.0f32;
        for (i, &m) in magnitudes.iter().enumerate() {
            cumulative += m;
            if cumulative >= target {
                rolloff_hz = i as f32 * self.bin_width;
                break;
            }
        }

        SpectralShape {
            centroid: (centroid_hz / self.nyquist).clamp(0.0, 1.0),
            spread: (variance.sqrt() / (self.nyquist / 2.0)).clamp(0.0, 1.0),
            rolloff: (rolloff_hz / self.nyquist).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_at(freq: f32, bins: usize, sample_rate: f32) -> Vec<f32> {
        let bin_width = sample_rate / 2.0 / bins as f32;
        let mut mags = vec![0.0f32; bins];
        mags[(freq / bin_width).round() as usize] = 1.0;
        mags
    }

    #[test]
    fn test_bands_in_unit_range() {
        let analyzer = SpectralBandAnalyzer::new(1024, 44100.0);
        let full = vec![1.0f32; 1024];
        let bands = analyzer.analyze(&full);
        assert!((bands.bass - 1.0).abs() < 1e-5);
        assert!((bands.mid - 1.0).abs() < 1e-5);
        assert!((bands.treble - 1.0).abs() < 1e-5);

        let silent = analyzer.analyze(&vec![0.0; 1024]);
        assert_eq!(silent, BandEnergies::default());
    }

    #[test]
    fn test_band_assignment() {
        let analyzer = SpectralBandAnalyzer::new(1024, 44100.0);

        let bass = analyzer.analyze(&tone_at(100.0, 1024, 44100.0));
        assert!(bass.bass > 0.0 && bass.mid == 0.0 && bass.treble == 0.0);

        let mid = analyzer.analyze(&tone_at(1000.0, 1024, 44100.0));
        assert!(mid.mid > 0.0 && mid.bass == 0.0 && mid.treble == 0.0);

        let treble = analyzer.analyze(&tone_at(8000.0, 1024, 44100.0));
        assert!(treble.treble > 0.0 && treble.bass == 0.0 && treble.mid == 0.0);
    }

    #[test]
    fn test_empty_band_reports_zero() {
        // 8 bins at 8 kHz: 500 Hz per bin, only DC (weight 0) falls in bass
        let analyzer = SpectralBandAnalyzer::new(8, 8000.0);
        let bands = analyzer.analyze(&[1.0; 8]);
        assert_eq!(bands.bass, 0.0);
        assert!(bands.mid > 0.0);
    }

    #[test]
    fn test_shape_of_single_tone() {
        let analyzer = SpectralBandAnalyzer::new(1024, 44100.0);
        let shape = analyzer.shape(&tone_at(11025.0, 1024, 44100.0));
        assert!((shape.centroid - 0.5).abs() < 0.01);
        assert!(shape.spread < 1e-3);
        assert!((shape.rolloff - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_shape_in_unit_range() {
        let analyzer = SpectralBandAnalyzer::new(256, 48000.0);
        let mags: Vec<f32> = (0..256).map(|i| ((i * 37) % 255) as f32 / 255.0).collect();
        let shape = analyzer.shape(&mags);
        for v in [shape.centroid, shape.spread, shape.rolloff] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
