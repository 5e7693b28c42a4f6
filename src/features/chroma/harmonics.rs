//! Harmonic content estimate
//!
//! ```text
//! E(k)    = mean(m[k-1], m[k], m[k+1])
//! content = mean_{h=2..6} E(round(h·f0 / bin_width)) / E(round(f0 / bin_width)) · scale
//! ```
//!
//! Clamped to [0, 1]; 0 when the fundamental's energy is under the noise
//! floor or no harmonic falls below Nyquist.

/// Highest harmonic number inspected
const MAX_HARMONIC: usize = 6;

/// Mean magnitude over a ±1-bin window around `bin`
fn window_energy(magnitudes: &[f32], bin: usize) -> f32 {
    let lo = bin.saturating_sub(1);
    let hi = (bin + 1).min(magnitudes.len() - 1);
    let window = &magnitudes[lo..=hi];
    window.iter().sum::<f32>() / window.len() as f32
}

/// Overtone energy relative to the fundamental at `fundamental_hz`
///
/// # Arguments
///
/// * `magnitudes` - Normalised magnitudes (0.0-1.0)
/// * `fundamental_hz` - Detected fundamental (0 when unpitched)
/// * `bin_width` - Hz per bin
/// * `scale` - Fixed gain on the ratio
/// * `noise_floor` - Minimum fundamental energy to report anything
pub fn harmonic_content(
    magnitudes: &[f32],
    fundamental_hz: f32,
    bin_width: f32,
    scale: f32,
    noise_floor: f32,
) -> f32 {
    if magnitudes.is_empty() || fundamental_hz <= 0.0 || bin_width <= 0.0 {
        return 0.0;
    }

    let fundamental_bin = (fundamental_hz / bin_width).round() as usize;
    if fundamental_bin >= magnitudes.len() {
        return 0.0;
    }

    let fundamental = window_energy(magnitudes, fundamental_bin);
    if fundamental <= noise_floor {
        return 0.0;
    }

    let harmonics: Vec<f32> = (2..=MAX_HARMONIC)
        .map(|h| (h as f32 * fundamental_hz / bin_width).round() as usize)
        .take_while(|&bin| bin < magnitudes.len())
        .map(|bin| window_energy(magnitudes, bin))
        .collect();
    if harmonics.is_empty() {
        return 0.0;
    }

    let mean = harmonics.iter().sum::<f32>() / harmonics.len() as f32;
    (mean / fundamental * scale).clamp(0.0, 1.0)
}
