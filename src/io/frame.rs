//! Per-frame input contract
//!
//! The capture/routing collaborator hands the engine one `FrameInput` per
//! analysis tick: byte magnitudes (0 = silent .. 255 = max), byte waveform
//! (128 = zero crossing), the capture sample rate and a timestamp.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One frame of raw analyser output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Frequency magnitudes, one byte per bin (power-of-two count)
    pub magnitudes: Vec<u8>,
    /// Time-domain samples, one byte each, 128 = zero
    pub waveform: Vec<u8>,
    /// Capture sample rate in Hz
    pub sample_rate: f32,
    /// Frame timestamp in seconds
    pub timestamp: f64,
}

/// Buffer lengths locked by the first frame of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    /// Number of magnitude bins (N)
    pub bins: usize,
    /// Number of waveform samples (M)
    pub samples: usize,
}

impl FrameInput {
    /// Create a frame from raw buffers
    pub fn new(magnitudes: Vec<u8>, waveform: Vec<u8>, sample_rate: f32, timestamp: f64) -> Self {
        Self {
            magnitudes,
            waveform,
            sample_rate,
            timestamp,
        }
    }

    /// Shape of this frame's buffers
    pub fn shape(&self) -> FrameShape {
        FrameShape {
            bins: self.magnitudes.len(),
            samples: self.waveform.len(),
        }
    }

    /// Check the frame on its own (without session context)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if:
    /// - the magnitude buffer is empty or not a power-of-two length
    /// - the waveform buffer is empty
    /// - the sample rate is not finite and positive
    /// - the timestamp is not finite
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.magnitudes.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Empty magnitude buffer (zero bin count)".to_string(),
            ));
        }

        if !self.magnitudes.len().is_power_of_two() {
            return Err(AnalysisError::InvalidInput(format!(
                "Magnitude bin count must be a power of two, got {}",
                self.magnitudes.len()
            )));
        }

        if self.waveform.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Empty waveform buffer".to_string(),
            ));
        }

        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }

        if !self.timestamp.is_finite() {
            return Err(AnalysisError::InvalidInput(
                "Non-finite frame timestamp".to_string(),
            ));
        }

        Ok(())
    }

    /// Check the frame against the shape locked for the current session
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if either buffer length differs.
    pub fn check_shape(&self, locked: FrameShape) -> Result<(), AnalysisError> {
        let shape = self.shape();
        if shape != locked {
            return Err(AnalysisError::InvalidInput(format!(
                "Buffer lengths changed mid-session: expected {} bins / {} samples, got {} / {}",
                locked.bins, locked.samples, shape.bins, shape.samples
            )));
        }
        Ok(())
    }

    /// Magnitudes scaled to [0, 1]
    pub fn normalized_magnitudes(&self) -> Vec<f32> {
        self.magnitudes.iter().map(|&m| m as f32 / 255.0).collect()
    }

    /// Waveform centred on 0 and scaled to roughly [-1, 1]
    pub fn centered_waveform(&self) -> Vec<f32> {
        self.waveform
            .iter()
            .map(|&s| (s as f32 - 128.0) / 128.0)
            .collect()
    }

    /// Width of one magnitude bin in Hz: (sample_rate / 2) / N
    pub fn bin_width(&self) -> f32 {
        if self.magnitudes.is_empty() {
            0.0
        } else {
            (self.sample_rate / 2.0) / self.magnitudes.len() as f32
        }
    }
}
