//! Feature extraction modules
//!
//! One stateful analyzer per concern, each fed one frame at a time:
//! - Band energies and spectral shape
//! - Onset detection (mel-band flux ODF, per-band transients)
//! - Period estimation (tempo, confidence, beat phase)
//! - Pitch (YIN with spectral fallback)
//! - Chroma and harmonic content
//! - Key detection
//! - Timbre and musical context
//! - Drop detection

pub mod bands;
pub mod chroma;
pub mod drop;
pub mod key;
pub mod onset;
pub mod period;
pub mod pitch;
pub mod timbre;
