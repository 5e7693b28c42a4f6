//! Mel-spaced triangular filterbank
//!
//! Filters are spaced evenly on the mel scale, `mel(f) = 1127·ln(1 + f/700)`,
//! between a lower edge (30 Hz by default) and Nyquist. Filter `b` ramps
//! linearly from bin point `b` up to its centre `b+1` and back down to `b+2`.

/// Hz → mel
pub fn hz_to_mel(freq: f32) -> f32 {
    1127.0 * (1.0 + freq / 700.0).ln()
}

/// mel → Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * ((mel / 1127.0).exp() - 1.0)
}

/// One triangular filter stored sparsely
#[derive(Debug, Clone)]
struct MelFilter {
    start: usize,
    weights: Vec<f32>,
    weight_sum: f32,
}

/// Triangular mel filterbank for a fixed bin count and sample rate
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
    sample_rate: f32,
}

impl MelFilterbank {
    /// Build `bands` filters between `min_frequency` and Nyquist for `bins` bins
    pub fn new(bands: usize, bins: usize, sample_rate: f32, min_frequency: f32) -> Self {
        let nyquist = sample_rate / 2.0;
        let bin_width = if bins > 0 { nyquist / bins as f32 } else { 1.0 };
        let last_bin = bins.saturating_sub(1);

        let mel_lo = hz_to_mel(min_frequency.min(nyquist));
        let mel_hi = hz_to_mel(nyquist);
        let step = (mel_hi - mel_lo) / (bands + 1) as f32;

        let points: Vec<usize> = (0..bands + 2)
            .map(|i| {
                let hz = mel_to_hz(mel_lo + step * i as f32);
                ((hz / bin_width).floor() as usize).min(last_bin)
            })
            .collect();

        let filters = (0..bands)
            .map(|b| {
                let (start, center, end) = (points[b], points[b + 1], points[b + 2]);
                let weights: Vec<f32> = (start..=end)
                    .map(|bin| {
                        if bin < center {
                            (bin - start) as f32 / (center - start) as f32
                        } else if bin == center {
                            1.0
                        } else {
                            (end - bin) as f32 / (end - center) as f32
                        }
                    })
                    .collect();
                let weight_sum = weights.iter().sum();
                MelFilter {
                    start,
                    weights,
                    weight_sum,
                }
            })
            .collect();

        log::debug!(
            "Built mel filterbank: {} bands, {} bins, {:.0} Hz - {:.0} Hz",
            bands,
            bins,
            min_frequency,
            nyquist
        );

        Self {
            filters,
            sample_rate,
        }
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if the bank has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Sample rate the bank was built for
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Weighted mean magnitude under each filter, written into `out`
    pub fn apply(&self, magnitudes: &[f32], out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.filters.iter().map(|filter| {
            if filter.weight_sum <= 0.0 {
                return 0.0;
            }
            let energy: f32 = filter
                .weights
                .iter()
                .zip(magnitudes.iter().skip(filter.start))
                .map(|(w, m)| w * m)
                .sum();
            energy / filter.weight_sum
        }));
    }
}
