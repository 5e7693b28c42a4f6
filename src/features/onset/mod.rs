//! Onset detection modules
//!
//! - Mel filterbank
//! - Mel-band spectral flux onset detection function (ODF)
//! - Per-band adaptive transient detectors
//! - Robust statistics shared by the above

pub mod mel;
pub mod spectral_flux;
pub mod threshold;
pub mod transient;

pub use mel::MelFilterbank;
pub use spectral_flux::OnsetDetectionEngine;
pub use transient::{TransientBank, TransientDetector, TransientFlags};
