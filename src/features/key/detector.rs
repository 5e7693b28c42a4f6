//! Key detection algorithm
//!
//! Scores the pitch-class vector against every template by Pearson
//! correlation and keeps the best. Correlation is scale-invariant, so the
//! vector need not be normalised the same way as the profiles.

use super::{templates::KeyTemplates, KeyDetectionResult};
use crate::analysis::result::Key;

const EPSILON: f32 = 1e-10;

/// Minimum variance-to-energy ratio for a vector to carry a key
const MIN_CONTRAST: f32 = 1e-6;

/// Pearson correlation of two 12-element vectors
///
/// Returns 0 when either vector is constant.
pub fn pearson_correlation(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;

    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator <= EPSILON {
        0.0
    } else {
        (cov / denominator).clamp(-1.0, 1.0)
    }
}

/// Pitch-class contrast: variance over mean energy (0 for flat vectors)
///
/// Scale-invariant, like the correlation itself, so it separates a flat
/// vector from a shaped one regardless of level.
pub fn pitch_class_contrast(chroma: &[f32; 12]) -> f32 {
    let mean = chroma.iter().sum::<f32>() / 12.0;
    let energy = chroma.iter().map(|v| v * v).sum::<f32>() / 12.0;
    if energy <= EPSILON {
        return 0.0;
    }
    let variance = chroma.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 12.0;
    variance / energy
}

/// Best-correlated key for `chroma`
///
/// Returns `None` when the vector carries no pitch-class contrast (silence
/// or a flat spectrum). Ties keep the first key scanned (majors before
/// minors, C upward).
///
/// # Example
///
/// ```
/// use aura_dsp::analysis::result::Key;
/// use aura_dsp::features::key::{detect_key, templates::KK_MAJOR, KeyTemplates};
///
/// let result = detect_key(&KK_MAJOR, &KeyTemplates::new()).unwrap();
/// assert_eq!(result.key, Key::Major(0));
/// ```
pub fn detect_key(chroma: &[f32; 12], templates: &KeyTemplates) -> Option<KeyDetectionResult> {
    let contrast = pitch_class_contrast(chroma);
    if contrast < MIN_CONTRAST {
        log::trace!("No key: chroma contrast {:.2e}", contrast);
        return None;
    }

    let mut best: Option<KeyDetectionResult> = None;

    let candidates = templates
        .major
        .iter()
        .enumerate()
        .map(|(root, t)| (Key::Major(root as u32), t))
        .chain(
            templates
                .minor
                .iter()
                .enumerate()
                .map(|(root, t)| (Key::Minor(root as u32), t)),
        );

    for (key, template) in candidates {
        let correlation = pearson_correlation(chroma, template);
        if best.map_or(true, |b| correlation > b.correlation) {
            best = Some(KeyDetectionResult { key, correlation });
        }
    }

    let best = best?;
    if best.correlation == 0.0 {
        return None;
    }

    log::trace!("Key {} (r = {:.3})", best.key.name(), best.correlation);
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::key::templates::{KK_MAJOR, KK_MINOR};

    #[test]
    fn test_pearson_bounds() {
        assert!((pearson_correlation(&KK_MAJOR, &KK_MAJOR) - 1.0).abs() < 1e-5);
        let inverted: [f32; 12] = std::array::from_fn(|i| -KK_MAJOR[i]);
        assert!((pearson_correlation(&KK_MAJOR, &inverted) + 1.0).abs() < 1e-5);
        assert_eq!(pearson_correlation(&[0.5; 12], &KK_MAJOR), 0.0);
    }

    #[test]
    fn test_detects_rotated_profiles() {
        let templates = KeyTemplates::new();
        let d_major: [f32; 12] = std::array::from_fn(|i| KK_MAJOR[(i + 12 - 2) % 12]);
        assert_eq!(detect_key(&d_major, &templates).unwrap().key, Key::Major(2));

        let a_minor: [f32; 12] = std::array::from_fn(|i| KK_MINOR[(i + 12 - 9) % 12]);
        assert_eq!(detect_key(&a_minor, &templates).unwrap().key, Key::Minor(9));
    }

    #[test]
    fn test_c_major_triad() {
        let mut chroma = [0.0f32; 12];
        chroma[0] = 0.4;
        chroma[4] = 0.3;
        chroma[7] = 0.3;
        let result = detect_key(&chroma, &KeyTemplates::new()).unwrap();
        assert_eq!(result.key, Key::Major(0));
        assert!(result.correlation > 0.5);
    }

    #[test]
    fn test_flat_chroma_has_no_key() {
        assert!(detect_key(&[0.0; 12], &KeyTemplates::new()).is_none());
        assert!(detect_key(&[1.0 / 12.0; 12], &KeyTemplates::new()).is_none());
    }

    #[test]
    fn test_near_flat_chroma_has_no_key() {
        let mut chroma = [1.0 / 12.0; 12];
        chroma[0] += 1e-7;
        assert!(pitch_class_contrast(&chroma) < MIN_CONTRAST);
        assert!(detect_key(&chroma, &KeyTemplates::new()).is_none());

        // Same shape at any level still has no key
        let loud: [f32; 12] = std::array::from_fn(|i| chroma[i] * 1000.0);
        assert!(detect_key(&loud, &KeyTemplates::new()).is_none());
    }

    #[test]
    fn test_contrast_is_scale_invariant() {
        let mut chroma = [0.0f32; 12];
        chroma[0] = 0.4;
        chroma[4] = 0.3;
        chroma[7] = 0.3;
        let scaled: [f32; 12] = std::array::from_fn(|i| chroma[i] * 50.0);
        let a = pitch_class_contrast(&chroma);
        assert!(a > 0.5);
        assert!((a - pitch_class_contrast(&scaled)).abs() < 1e-4);
        assert_eq!(pitch_class_contrast(&[0.0; 12]), 0.0);
    }
}
