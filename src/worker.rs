//! Isolated-worker deployment of the feature engine
//!
//! [`EngineWorker`] runs one [`FeatureEngine`] on a background thread. The
//! caller sends copies of each frame's buffers over a channel and receives
//! one `Result<FeatureRecord, AnalysisError>` per frame, in submission
//! order. Reset and source-switch commands travel on the same channel, so
//! they apply exactly between the frames sent before and after them.
//!
//! # Example
//!
//! ```
//! use aura_dsp::{EngineConfig, EngineWorker, FrameInput};
//!
//! let worker = EngineWorker::spawn(EngineConfig::default())?;
//! worker.submit(FrameInput::new(vec![0; 512], vec![128; 1024], 44100.0, 0.0))?;
//! let record = worker.recv()?;
//! assert_eq!(record.energy, 0.0);
//! worker.shutdown()?;
//! # Ok::<(), aura_dsp::AnalysisError>(())
//! ```

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::analysis::engine::{AudioSource, FeatureEngine};
use crate::analysis::result::FeatureRecord;
use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::io::frame::FrameInput;

/// Messages accepted by the worker thread
#[derive(Debug)]
enum Command {
    Frame(FrameInput),
    Reset,
    SwitchSource(AudioSource),
    Shutdown,
}

/// Per-frame result as delivered by the worker
pub type WorkerResult = Result<FeatureRecord, AnalysisError>;

/// Handle to a feature engine running on its own thread
#[derive(Debug)]
pub struct EngineWorker {
    commands: Sender<Command>,
    results: Receiver<WorkerResult>,
    thread: Option<JoinHandle<()>>,
}

impl EngineWorker {
    /// Build an engine and move it onto a new worker thread
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the configuration is
    /// rejected, or `AnalysisError::ProcessingError` if the thread cannot be
    /// spawned.
    pub fn spawn(config: EngineConfig) -> Result<Self, AnalysisError> {
        let engine = FeatureEngine::new(config)?;
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let thread = std::thread::Builder::new()
            .name("aura-dsp-engine".to_string())
            .spawn(move || run_worker(engine, command_rx, result_tx))
            .map_err(|e| AnalysisError::ProcessingError(format!("Failed to spawn worker: {}", e)))?;

        log::debug!("Engine worker started");

        Ok(Self {
            commands: command_tx,
            results: result_rx,
            thread: Some(thread),
        })
    }

    fn send(&self, command: Command) -> Result<(), AnalysisError> {
        self.commands
            .send(command)
            .map_err(|_| AnalysisError::WorkerDisconnected("Worker thread has stopped".to_string()))
    }

    /// Queue a frame for analysis
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::WorkerDisconnected` if the worker has stopped.
    pub fn submit(&self, frame: FrameInput) -> Result<(), AnalysisError> {
        self.send(Command::Frame(frame))
    }

    /// Queue a full engine reset
    pub fn reset(&self) -> Result<(), AnalysisError> {
        self.send(Command::Reset)
    }

    /// Queue a source switch (resets the engine if the source changed)
    pub fn switch_source(&self, source: AudioSource) -> Result<(), AnalysisError> {
        self.send(Command::SwitchSource(source))
    }

    /// Block until the next frame's result arrives
    ///
    /// # Errors
    ///
    /// Returns the frame's own error if the engine rejected it, or
    /// `AnalysisError::WorkerDisconnected` if the worker has stopped.
    pub fn recv(&self) -> WorkerResult {
        self.results
            .recv()
            .map_err(|_| AnalysisError::WorkerDisconnected("Result channel closed".to_string()))?
    }

    /// Wait at most `timeout` for the next result
    ///
    /// Returns `None` when nothing arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(AnalysisError::WorkerDisconnected(
                "Result channel closed".to_string(),
            ))),
        }
    }

    /// Next result if one is ready, without blocking
    pub fn try_recv(&self) -> Option<WorkerResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AnalysisError::WorkerDisconnected(
                "Result channel closed".to_string(),
            ))),
        }
    }

    /// Stop the worker and wait for its thread to exit
    ///
    /// Frames queued before the call are still analysed; their results stay
    /// unread.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if the worker thread panicked.
    pub fn shutdown(mut self) -> Result<(), AnalysisError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), AnalysisError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        // Send fails only if the thread already exited
        let _ = self.commands.send(Command::Shutdown);
        thread
            .join()
            .map_err(|_| AnalysisError::ProcessingError("Engine worker panicked".to_string()))?;

        log::debug!("Engine worker stopped");
        Ok(())
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("{}", e);
        }
    }
}

/// Worker loop: process commands in order until shutdown or disconnect
fn run_worker(mut engine: FeatureEngine, commands: Receiver<Command>, results: Sender<WorkerResult>) {
    for command in commands.iter() {
        match command {
            Command::Frame(frame) => {
                if results.send(engine.step(&frame)).is_err() {
                    log::debug!("Result receiver dropped, stopping worker");
                    break;
                }
            }
            Command::Reset => engine.reset(),
            Command::SwitchSource(source) => engine.switch_source(source),
            Command::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(level: u8, t: f64) -> FrameInput {
        FrameInput::new(vec![level; 512], vec![128; 1024], 44100.0, t)
    }

    #[test]
    fn test_results_arrive_in_order() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        for i in 0..10 {
            worker.submit(frame(60, i as f64 * 0.02)).unwrap();
        }
        for i in 0..10 {
            let record = worker.recv().unwrap();
            assert!((record.timestamp - i as f64 * 0.02).abs() < 1e-9);
        }
        worker.shutdown().unwrap();
    }

    #[test]
    fn test_invalid_frame_error_is_forwarded() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        worker
            .submit(FrameInput::new(vec![0; 300], vec![128; 1024], 44100.0, 0.0))
            .unwrap();
        assert!(matches!(worker.recv(), Err(AnalysisError::InvalidInput(_))));

        // The worker keeps going after a rejected frame
        worker.submit(frame(0, 0.1)).unwrap();
        assert!(worker.recv().is_ok());
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        assert!(worker.try_recv().is_none());
        assert!(worker.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_reset_between_frames() {
        let worker = EngineWorker::spawn(EngineConfig::default()).unwrap();
        worker.submit(frame(60, 0.0)).unwrap();
        worker.reset().unwrap();
        // Different shape is accepted after a reset
        worker
            .submit(FrameInput::new(vec![60; 256], vec![128; 512], 44100.0, 0.02))
            .unwrap();
        assert!(worker.recv().is_ok());
        assert!(worker.recv().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.pitch.window_size = 0;
        assert!(matches!(
            EngineWorker::spawn(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
