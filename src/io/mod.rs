//! Frame I/O modules
//!
//! The engine's input contract and the helpers that produce it from PCM:
//! - `FrameInput` and session shape validation
//! - `FrameAnalyser`: PCM window → byte magnitudes + byte waveform
//! - `SampleBuffer`: hop-based windowing of a PCM stream

pub mod analyser;
pub mod frame;
pub mod sample_buffer;

pub use analyser::{AnalyserConfig, FrameAnalyser};
pub use frame::{FrameInput, FrameShape};
pub use sample_buffer::SampleBuffer;
