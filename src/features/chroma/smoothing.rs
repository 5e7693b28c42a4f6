//! Temporal chroma smoothing
//!
//! First-order exponential smoothing against the previous frame:
//!
//! ```text
//! s(t) = α · s(t-1) + (1 - α) · c(t)
//! ```

use super::PITCH_CLASSES;

/// Exponential smoother over 12-element chroma vectors
#[derive(Debug, Clone)]
pub struct ChromaSmoother {
    factor: f32,
    state: [f32; PITCH_CLASSES],
}

impl ChromaSmoother {
    /// Create a smoother with factor α (weight of the previous frame)
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            state: [0.0; PITCH_CLASSES],
        }
    }

    /// Current smoothed vector
    pub fn state(&self) -> [f32; PITCH_CLASSES] {
        self.state
    }

    /// Blend one frame into the state
    pub fn smooth(&mut self, frame: &[f32; PITCH_CLASSES]) -> [f32; PITCH_CLASSES] {
        let a = self.factor;
        for (s, &c) in self.state.iter_mut().zip(frame) {
            *s = a * *s + (1.0 - a) * c;
        }
        self.state
    }

    /// Blend in an empty frame
    pub fn decay(&mut self) -> [f32; PITCH_CLASSES] {
        self.smooth(&[0.0; PITCH_CLASSES])
    }

    /// Zero the state
    pub fn reset(&mut self) {
        self.state = [0.0; PITCH_CLASSES];
    }
}
