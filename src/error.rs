//! Error types for the feature extraction engine

use std::fmt;

/// Errors that can occur while configuring or driving the engine
///
/// Low-information input (silence, noise, no confident pitch or tempo) is not an
/// error: it produces degraded output instead. These variants cover genuinely
/// invalid frames and configurations.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid frame (empty buffers, bad bin count, bad sample rate, shape change)
    InvalidInput(String),

    /// Configuration rejected by `EngineConfig::validate`
    InvalidConfig(String),

    /// Processing error inside an analysis stage
    ProcessingError(String),

    /// The isolated worker thread is no longer reachable
    WorkerDisconnected(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::WorkerDisconnected(msg) => write!(f, "Worker disconnected: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
