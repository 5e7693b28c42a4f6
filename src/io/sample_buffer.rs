//! Sample windowing and buffering utilities

/// Buffer for windowed PCM processing
///
/// Accumulates a mono stream and hands out overlapping windows of a fixed
/// size, advancing by `hop` samples per window.
#[derive(Debug)]
pub struct SampleBuffer {
    /// Buffer data
    data: Vec<f32>,
    /// Start of the next window
    position: usize,
}

impl SampleBuffer {
    /// Create a new sample buffer
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Add samples to buffer
    pub fn push(&mut self, samples: &[f32]) {
        self.data.extend_from_slice(samples);
    }

    /// Number of samples not yet consumed by `next_window`
    pub fn pending(&self) -> usize {
        self.data.len() - self.position
    }

    /// Get next window of samples, advancing by `hop`
    pub fn next_window(&mut self, window_size: usize, hop: usize) -> Option<&[f32]> {
        if window_size == 0 || self.position + window_size > self.data.len() {
            return None;
        }

        let start = self.position;
        self.position += hop.max(1);
        Some(&self.data[start..start + window_size])
    }

    /// Drop samples that no future window can reach
    pub fn compact(&mut self) {
        if self.position > 0 {
            let consumed = self.position.min(self.data.len());
            self.data.drain(..consumed);
            self.position -= consumed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_windows() {
        let mut buffer = SampleBuffer::new(16);
        buffer.push(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(buffer.next_window(4, 2), Some(&[0.0, 1.0, 2.0, 3.0][..]));
        assert_eq!(buffer.next_window(4, 2), Some(&[2.0, 3.0, 4.0, 5.0][..]));
        assert_eq!(buffer.next_window(4, 2), None);
    }

    #[test]
    fn test_compact_keeps_unread_samples() {
        let mut buffer = SampleBuffer::new(16);
        buffer.push(&[0.0, 1.0, 2.0, 3.0]);
        buffer.next_window(2, 2);
        buffer.compact();
        assert_eq!(buffer.pending(), 2);
        assert_eq!(buffer.next_window(2, 2), Some(&[2.0, 3.0][..]));
    }
}
