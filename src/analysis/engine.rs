//! The per-frame feature engine
//!
//! [`FeatureEngine`] owns every piece of analysis state for one audio
//! session and exposes a single `step(frame) -> FeatureRecord` call. Frame
//! data flows one way:
//!
//! ```text
//! bytes → magnitudes / waveform
//!       → bands, spectral shape, energy → envelopes, transients, ODF
//!       → {tempo, drop}  ∥  {pitch → chroma → timbre / context}
//! ```
//!
//! The first accepted frame locks the buffer lengths and sample rate. Frames
//! with different buffer lengths are rejected; a new sample rate starts a new
//! session.
//!
//! # Example
//!
//! ```
//! use aura_dsp::{EngineConfig, FeatureEngine, FrameInput};
//!
//! let mut engine = FeatureEngine::new(EngineConfig::default())?;
//! let frame = FrameInput::new(vec![0; 1024], vec![128; 2048], 44100.0, 0.0);
//! let record = engine.step(&frame)?;
//! assert_eq!(record.volume, 0.0);
//! assert_eq!(record.melodic.note, "N/A");
//! # Ok::<(), aura_dsp::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::result::{
    BandLevels, FeatureRecord, Melodic, Rhythmic, Spectral, Transients,
};
use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::features::bands::SpectralBandAnalyzer;
use crate::features::chroma::{harmonic_content, ChromaAnalyzer};
use crate::features::drop::DropDetector;
use crate::features::onset::{OnsetDetectionEngine, TransientBank, TransientFlags};
use crate::features::period::{TempoEstimate, TempoEstimator};
use crate::features::pitch::{note_name, PitchDetector};
use crate::features::timbre::{TimbreAnalyzer, TimbreInput};
use crate::io::frame::{FrameInput, FrameShape};
use crate::preprocessing::normalization::AdaptiveEnvelopeNormalizer;
use crate::preprocessing::silence::SilenceDetector;

/// Upstream audio source feeding the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    /// Decoded file playback
    File,
    /// Live microphone capture
    Microphone,
}

/// Analyzers whose construction depends on the session's shape and sample rate
#[derive(Debug, Clone)]
struct Session {
    shape: FrameShape,
    sample_rate: f32,
    bands: SpectralBandAnalyzer,
    onset: OnsetDetectionEngine,
    chroma: ChromaAnalyzer,
}

impl Session {
    fn new(config: &EngineConfig, frame: &FrameInput) -> Self {
        let shape = frame.shape();
        let sr = frame.sample_rate;
        log::debug!(
            "New session: {} bins, {} samples at {} Hz ({:.2} Hz/bin)",
            shape.bins,
            shape.samples,
            sr,
            frame.bin_width()
        );
        Self {
            shape,
            sample_rate: sr,
            bands: SpectralBandAnalyzer::new(shape.bins, sr),
            onset: OnsetDetectionEngine::new(&config.onset, shape.bins, sr),
            chroma: ChromaAnalyzer::new(&config.chroma, shape.bins, sr),
        }
    }
}

/// Envelope normalisers for the three bands and overall energy
#[derive(Debug, Clone)]
struct Envelopes {
    bass: AdaptiveEnvelopeNormalizer,
    mid: AdaptiveEnvelopeNormalizer,
    treble: AdaptiveEnvelopeNormalizer,
    energy: AdaptiveEnvelopeNormalizer,
}

impl Envelopes {
    fn new(config: &EngineConfig) -> Self {
        let env = config.envelope;
        Self {
            bass: AdaptiveEnvelopeNormalizer::new(env),
            mid: AdaptiveEnvelopeNormalizer::new(env),
            treble: AdaptiveEnvelopeNormalizer::new(env),
            energy: AdaptiveEnvelopeNormalizer::new(env),
        }
    }

    fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.treble.reset();
        self.energy.reset();
    }
}

/// Stateful feature extraction engine for one audio session
#[derive(Debug)]
pub struct FeatureEngine {
    config: EngineConfig,
    source: Option<AudioSource>,
    session: Option<Session>,
    silence: SilenceDetector,
    envelopes: Envelopes,
    transients: TransientBank,
    tempo: TempoEstimator,
    pitch: PitchDetector,
    timbre: TimbreAnalyzer,
    drop: DropDetector,
    frames: u64,
}

impl FeatureEngine {
    /// Create an engine from configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` if the configuration fails
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        Ok(Self {
            source: None,
            session: None,
            silence: SilenceDetector::new(config.silence),
            envelopes: Envelopes::new(&config),
            transients: TransientBank::new(&config.transients),
            tempo: TempoEstimator::new(config.tempo),
            pitch: PitchDetector::new(config.pitch),
            timbre: TimbreAnalyzer::new(config.timbre),
            drop: DropDetector::new(config.drop),
            frames: 0,
            config,
        })
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current audio source, if one has been set
    pub fn source(&self) -> Option<AudioSource> {
        self.source
    }

    /// Frames processed since the last reset
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Buffer lengths locked for the current session
    pub fn locked_shape(&self) -> Option<FrameShape> {
        self.session.as_ref().map(|s| s.shape)
    }

    /// Discard all session state
    ///
    /// Envelopes, transient histories, the ODF history and beat time, mel
    /// energies, chroma smoothing, note history and drop state all return to
    /// their initial values, and the next frame locks a new shape.
    pub fn reset(&mut self) {
        log::info!("Resetting engine after {} frames", self.frames);
        self.session = None;
        self.envelopes.reset();
        self.transients.reset();
        self.tempo.reset();
        self.timbre.reset();
        self.drop.reset();
        self.frames = 0;
    }

    /// Switch the upstream source, resetting all state if it changed
    pub fn switch_source(&mut self, source: AudioSource) {
        if self.source == Some(source) {
            return;
        }
        log::info!("Audio source {:?} -> {:?}", self.source, source);
        self.reset();
        self.source = Some(source);
    }

    /// Analyse one frame
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the frame fails
    /// [`FrameInput::validate`] or its buffer lengths differ from the
    /// session's. Rejected frames leave the engine state untouched.
    pub fn step(&mut self, frame: &FrameInput) -> Result<FeatureRecord, AnalysisError> {
        if let Err(e) = self.prepare_session(frame) {
            log::warn!("Rejecting frame at {:.3}s: {}", frame.timestamp, e);
            return Err(e);
        }

        let magnitudes = frame.normalized_magnitudes();
        let waveform = frame.centered_waveform();
        self.frames += 1;

        if self.silence.is_silent(&magnitudes) {
            return Ok(self.step_silent(frame.timestamp));
        }

        Ok(self.step_signal(frame, &magnitudes, &waveform))
    }

    /// Validate the frame and make sure a session exists for it
    fn prepare_session(&mut self, frame: &FrameInput) -> Result<(), AnalysisError> {
        frame.validate()?;

        match self.session.as_ref().map(|s| (s.sample_rate, s.shape)) {
            Some((sample_rate, _)) if sample_rate != frame.sample_rate => {
                log::info!(
                    "Sample rate changed {} -> {} Hz, starting a new session",
                    sample_rate,
                    frame.sample_rate
                );
                self.reset();
            }
            Some((_, shape)) => frame.check_shape(shape)?,
            None => {}
        }

        if self.session.is_none() {
            self.session = Some(Session::new(&self.config, frame));
        }
        Ok(())
    }

    fn step_silent(&mut self, timestamp: f64) -> FeatureRecord {
        self.tempo.observe(0.0, timestamp);
        let tempo = self.tempo.decay();
        let rhythmic = self.rhythmic(tempo, timestamp);

        self.transients.process(0.0, 0.0, 0.0, 0.0);
        let drop_intensity = self.drop.silence();

        let pitch_class = match self.session.as_mut() {
            Some(session) => {
                session.onset.zero_previous();
                session.chroma.decay()
            }
            None => [0.0; 12],
        };

        log::trace!("Silent frame at {:.3}s", timestamp);
        FeatureRecord::silent(timestamp, rhythmic, drop_intensity, pitch_class)
    }

    fn step_signal(&mut self, frame: &FrameInput, magnitudes: &[f32], waveform: &[f32]) -> FeatureRecord {
        let timestamp = frame.timestamp;
        let sample_rate = frame.sample_rate;
        let chroma_config = self.config.chroma;

        let Some(session) = self.session.as_mut() else {
            return FeatureRecord::default();
        };

        // Levels
        let volume = rms(waveform).clamp(0.0, 1.0);
        let raw_energy = rms(magnitudes).clamp(0.0, 1.0);
        let bands = session.bands.analyze(magnitudes);
        let shape = session.bands.shape(magnitudes);

        let dynamic_bands = BandLevels {
            bass: self.envelopes.bass.process(bands.bass),
            mid: self.envelopes.mid.process(bands.mid),
            treble: self.envelopes.treble.process(bands.treble),
        };
        let energy = self.envelopes.energy.process(raw_energy);

        // Onsets and rhythm
        let flags = self
            .transients
            .process(bands.bass, bands.mid, bands.treble, raw_energy);
        if flags.overall {
            self.tempo.mark_beat(timestamp);
        }

        let odf = session.onset.process(magnitudes);
        let flux = session.onset.display_flux(odf);

        self.tempo.observe(odf, timestamp);
        let tempo = self.tempo.detect_bpm();

        let drop_intensity = self.drop.process(energy, timestamp);

        // Pitch and harmony
        let pitch = self.pitch.detect(waveform, magnitudes, sample_rate);
        let harmonic = harmonic_content(
            magnitudes,
            pitch.frequency,
            frame.bin_width(),
            chroma_config.harmonic_scale,
            chroma_config.noise_floor,
        );
        let pitch_class = session.chroma.process(magnitudes);

        let (timbre, musical_context) = self.timbre.analyze(&TimbreInput {
            shape,
            flux,
            bass: bands.bass,
            harmonic_content: harmonic,
            pitch,
            chroma: &pitch_class,
        });

        let rhythmic = self.rhythmic(tempo, timestamp);

        log::trace!(
            "t={:.3}s vol={:.3} energy={:.3} odf={:.4} bpm={:.1} f0={:.1}",
            timestamp,
            volume,
            energy,
            odf,
            tempo.bpm,
            pitch.frequency
        );

        FeatureRecord {
            timestamp,
            volume,
            energy,
            bands: BandLevels {
                bass: bands.bass,
                mid: bands.mid,
                treble: bands.treble,
            },
            dynamic_bands,
            transients: transients_from(flags),
            drop_intensity,
            spectral: Spectral {
                centroid: shape.centroid,
                spread: shape.spread,
                flux,
                rolloff: shape.rolloff,
            },
            melodic: Melodic {
                frequency_hz: pitch.frequency,
                note: note_name(pitch.frequency),
                confidence: pitch.confidence,
                harmonic_content: harmonic,
                pitch_class,
            },
            rhythmic,
            timbre,
            musical_context,
        }
    }

    fn rhythmic(&self, tempo: TempoEstimate, timestamp: f64) -> Rhythmic {
        let confidence = (tempo.confidence * 100.0).clamp(0.0, 100.0);
        Rhythmic {
            bpm: tempo.bpm,
            confidence,
            beat_phase: self.tempo.beat_phase(timestamp),
            subdivision: tempo.subdivision,
            groove: confidence,
        }
    }
}

fn transients_from(flags: TransientFlags) -> Transients {
    Transients {
        bass: flags.bass,
        mid: flags.mid,
        treble: flags.treble,
        overall: flags.overall,
    }
}

fn rms(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::Mode;

    fn engine() -> FeatureEngine {
        FeatureEngine::new(EngineConfig::default()).unwrap()
    }

    fn silent_frame(t: f64) -> FrameInput {
        FrameInput::new(vec![0; 1024], vec![128; 2048], 44100.0, t)
    }

    fn flat_frame(level: u8, t: f64) -> FrameInput {
        FrameInput::new(vec![level; 1024], vec![128; 2048], 44100.0, t)
    }

    #[test]
    fn test_silence_gives_zeroed_record() {
        let mut engine = engine();
        for i in 0..50 {
            let record = engine.step(&silent_frame(i as f64 / 60.0)).unwrap();
            assert_eq!(record.volume, 0.0);
            assert_eq!(record.energy, 0.0);
            assert_eq!(record.transients, Transients::default());
            assert_eq!(record.rhythmic.bpm, 0.0);
            assert_eq!(record.melodic.note, "N/A");
            assert_eq!(record.musical_context.mode, Mode::Unknown);
        }
        assert_eq!(engine.frames_processed(), 50);
    }

    #[test]
    fn test_shape_locked_after_first_frame() {
        let mut engine = engine();
        engine.step(&silent_frame(0.0)).unwrap();
        assert_eq!(
            engine.locked_shape(),
            Some(FrameShape {
                bins: 1024,
                samples: 2048
            })
        );

        let other = FrameInput::new(vec![0; 512], vec![128; 2048], 44100.0, 0.1);
        assert!(matches!(engine.step(&other), Err(AnalysisError::InvalidInput(_))));

        // Still usable
        assert!(engine.step(&silent_frame(0.2)).is_ok());
    }

    #[test]
    fn test_sample_rate_change_starts_new_session() {
        let mut engine = engine();
        engine.step(&flat_frame(50, 0.0)).unwrap();
        engine.step(&flat_frame(50, 0.02)).unwrap();
        assert_eq!(engine.frames_processed(), 2);

        let frame = FrameInput::new(vec![50; 512], vec![128; 1024], 48000.0, 0.04);
        engine.step(&frame).unwrap();
        assert_eq!(engine.frames_processed(), 1);
        assert_eq!(engine.locked_shape().map(|s| s.bins), Some(512));
    }

    #[test]
    fn test_switch_source_resets_only_on_change() {
        let mut engine = engine();
        engine.switch_source(AudioSource::File);
        engine.step(&flat_frame(50, 0.0)).unwrap();
        engine.step(&flat_frame(50, 0.02)).unwrap();

        engine.switch_source(AudioSource::File);
        assert_eq!(engine.frames_processed(), 2);

        engine.switch_source(AudioSource::Microphone);
        assert_eq!(engine.frames_processed(), 0);
        assert_eq!(engine.locked_shape(), None);
        assert_eq!(engine.source(), Some(AudioSource::Microphone));
    }

    #[test]
    fn test_identical_frames_have_zero_flux() {
        let mut engine = engine();
        engine.step(&flat_frame(80, 0.0)).unwrap();
        let record = engine.step(&flat_frame(80, 0.02)).unwrap();
        assert_eq!(record.spectral.flux, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.tempo.min_bpm = 0.0;
        assert!(matches!(
            FeatureEngine::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
    }
}
