//! Chroma normalisation

use super::PITCH_CLASSES;

const EPSILON: f32 = 1e-10;

/// Scale `chroma` in place to sum to 1
///
/// A vector with no energy is left untouched.
pub fn normalize_l1(chroma: &mut [f32; PITCH_CLASSES]) {
    let sum: f32 = chroma.iter().sum();
    if sum <= EPSILON {
        return;
    }
    for value in chroma.iter_mut() {
        *value /= sum;
    }
}
