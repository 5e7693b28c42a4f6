//! Spectral peak-picking pitch fallback
//!
//! Used when YIN finds no periodic structure. Picks the strongest magnitude
//! bin inside the pitch range and refines it with parabolic sub-bin
//! interpolation:
//!
//! ```text
//! δ = 0.5 · (m[k-1] - m[k+1]) / (m[k-1] - 2·m[k] + m[k+1])
//! f = (k + δ) · bin_width
//! ```
//!
//! Confidence is the peak height times its prominence over the band mean,
//! capped well below what YIN can report.

const EPSILON: f32 = 1e-10;

/// Fallback estimate from the magnitude spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Interpolated peak frequency in Hz
    pub frequency: f32,
    /// Peak confidence (0.0 to `cap`)
    pub confidence: f32,
}

/// Find the strongest spectral peak between `min_frequency` and `max_frequency`
///
/// # Arguments
///
/// * `magnitudes` - Normalised magnitudes (0.0-1.0), bin `k` centred at `k · bin_width`
/// * `bin_width` - Hz per bin
/// * `min_frequency`, `max_frequency` - Search range in Hz
/// * `cap` - Upper bound on the reported confidence
///
/// # Returns
///
/// `None` when the range holds no bins or no energy
pub fn find_spectral_peak(
    magnitudes: &[f32],
    bin_width: f32,
    min_frequency: f32,
    max_frequency: f32,
    cap: f32,
) -> Option<SpectralPeak> {
    if magnitudes.len() < 3 || bin_width <= 0.0 {
        return None;
    }

    let lo = ((min_frequency / bin_width).ceil() as usize).max(1);
    let hi = ((max_frequency / bin_width).floor() as usize).min(magnitudes.len() - 2);
    if lo > hi {
        return None;
    }

    let range = &magnitudes[lo..=hi];
    let (offset, &peak) = range
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    if peak <= EPSILON {
        return None;
    }

    let k = lo + offset;
    let (a, b, c) = (magnitudes[k - 1], magnitudes[k], magnitudes[k + 1]);
    let denominator = a - 2.0 * b + c;
    let delta = if denominator.abs() > EPSILON {
        (0.5 * (a - c) / denominator).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    let mean = range.iter().sum::<f32>() / range.len() as f32;
    let prominence = (1.0 - mean / peak).clamp(0.0, 1.0);

    Some(SpectralPeak {
        frequency: (k as f32 + delta) * bin_width,
        confidence: (peak * prominence).clamp(0.0, cap),
    })
}
