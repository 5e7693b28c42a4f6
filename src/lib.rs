//! # Aura DSP
//!
//! A real-time audio feature extraction engine. Once per analysis frame it
//! turns a magnitude spectrum and a waveform (both as bytes, the way browser
//! and hardware analysers deliver them) into a [`FeatureRecord`]: loudness,
//! band energies, transients, tempo, pitch, chroma, timbre and key.
//!
//! ## Features
//!
//! - **Dynamics**: A-weighted band energies with adaptive envelope normalisation
//! - **Onsets**: Mel-band median spectral flux and per-band adaptive transient detection
//! - **Tempo**: Autocorrelation over the onset history with confidence, subdivision and beat phase
//! - **Pitch**: YIN with spectral peak fallback, note naming and harmonic content
//! - **Harmony**: Smoothed chroma, Krumhansl-Kessler key/mode and tension
//! - **Drops**: Energy surge detection with cooldown and decay
//!
//! ## Quick Start
//!
//! ```
//! use aura_dsp::io::{AnalyserConfig, FrameAnalyser};
//! use aura_dsp::{EngineConfig, FeatureEngine};
//!
//! let sr = 44100.0;
//! let samples: Vec<f32> = (0..2048)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr).sin())
//!     .collect();
//!
//! let mut analyser = FrameAnalyser::new(AnalyserConfig::default())?;
//! let mut engine = FeatureEngine::new(EngineConfig::default())?;
//!
//! let frame = analyser.analyse(&samples, sr, 0.0)?;
//! let record = engine.step(&frame)?;
//!
//! println!("{} ({:.1} Hz)", record.melodic.note, record.melodic.frequency_hz);
//! # Ok::<(), aura_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! FrameInput → preprocessing → features → FeatureEngine::step → FeatureRecord
//! ```
//!
//! The engine runs on the caller's thread; [`EngineWorker`] wraps the same
//! engine on a background thread with channel message passing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod worker;

// Re-export main types
pub use analysis::engine::{AudioSource, FeatureEngine};
pub use analysis::result::{FeatureRecord, Key, Mode};
pub use config::EngineConfig;
pub use error::AnalysisError;
pub use io::frame::FrameInput;
pub use worker::EngineWorker;
