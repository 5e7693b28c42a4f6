//! A-weighting curve
//!
//! Approximates the ear's frequency-dependent loudness sensitivity (IEC 61672).
//! Used as a per-bin weight by the band analyzer and the chroma extractor.

const F1: f32 = 20.6;
const F2: f32 = 107.7;
const F3: f32 = 737.9;
const F4: f32 = 12194.0;

/// Linear A-weighting gain at `frequency` Hz
///
/// `w(f) = k·f⁴ / ((f²+20.6²)·sqrt((f²+107.7²)(f²+737.9²))·(f²+12194²))`, k = 12194².
///
/// Returns 0 for non-positive or non-finite frequencies. The curve peaks just
/// below 1 around 2.5 kHz and is ≈0.79 at 1 kHz.
pub fn a_weighting(frequency: f32) -> f32 {
    if !frequency.is_finite() || frequency <= 0.0 {
        return 0.0;
    }

    // f64 keeps f⁴ from losing precision at the top of the band
    let f2 = (frequency as f64).powi(2);
    let k = (F4 as f64).powi(2);
    let numerator = k * f2 * f2;
    let denominator = (f2 + (F1 as f64).powi(2))
        * ((f2 + (F2 as f64).powi(2)) * (f2 + (F3 as f64).powi(2))).sqrt()
        * (f2 + k);

    if denominator <= 0.0 {
        0.0
    } else {
        (numerator / denominator) as f32
    }
}
