//! Configuration parameters for the feature extraction engine
//!
//! Every threshold, decay and window size used by the analyzers lives here.
//! One `EngineConfig` is passed at construction; there is no reconfiguration
//! mid-session.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Adaptive envelope (rolling min/max compressor) parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Blend rate toward a new extreme (default: 0.1)
    pub adaptive_rate: f32,
    /// Multiplicative growth of the floor while the signal stays above it (default: 0.002)
    pub min_decay: f32,
    /// Multiplicative decay of the ceiling while the signal stays below it (default: 0.001)
    pub max_decay: f32,
    /// Additive floor growth per frame (default: 0.02)
    pub min_threshold: f32,
    /// Initial floor (default: 0.1)
    pub initial_min: f32,
    /// Initial ceiling (default: 0.2)
    pub initial_max: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            adaptive_rate: 0.1,
            min_decay: 0.002,
            max_decay: 0.001,
            min_threshold: 0.02,
            initial_min: 0.1,
            initial_max: 0.2,
        }
    }
}

/// Spike detector parameters for one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientConfig {
    /// Static floor for the adaptive threshold
    pub threshold: f32,
    /// Multiplier applied to the history mean and to the running value
    pub multiplier: f32,
    /// Running value decay per frame (0-1)
    pub decay: f32,
}

/// Transient detector parameters for the four tracked signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransientBankConfig {
    /// Bass band
    pub bass: TransientConfig,
    /// Mid band
    pub mid: TransientConfig,
    /// Treble band
    pub treble: TransientConfig,
    /// Overall energy
    pub overall: TransientConfig,
    /// History ring length (default: 10)
    pub history_len: usize,
}

impl Default for TransientBankConfig {
    fn default() -> Self {
        Self {
            bass: TransientConfig {
                threshold: 0.08,
                multiplier: 1.8,
                decay: 0.85,
            },
            mid: TransientConfig {
                threshold: 0.1,
                multiplier: 1.6,
                decay: 0.86,
            },
            treble: TransientConfig {
                threshold: 0.06,
                multiplier: 1.5,
                decay: 0.82,
            },
            overall: TransientConfig {
                threshold: 0.12,
                multiplier: 1.7,
                decay: 0.88,
            },
            history_len: 10,
        }
    }
}

/// Mel filterbank and onset detection function parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetConfig {
    /// Number of triangular mel filters (default: 40)
    pub mel_bands: usize,
    /// Lowest filter edge in Hz (default: 30.0)
    pub min_frequency: f32,
    /// Scale applied to the ODF before clamping into `spectral.flux` (default: 10.0)
    pub flux_scale: f32,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            mel_bands: 40,
            min_frequency: 30.0,
            flux_scale: 10.0,
        }
    }
}

/// Tempo estimation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoConfig {
    /// ODF ring buffer capacity in analysis samples (default: 256)
    pub history_len: usize,
    /// ODF sampling rate in Hz, independent of the caller's frame rate (default: 43.0)
    pub analysis_rate: f32,
    /// Minimum BPM to consider (default: 60.0)
    pub min_bpm: f32,
    /// Maximum BPM to consider (default: 180.0)
    pub max_bpm: f32,
    /// Estimates below this confidence degrade to bpm = 0 (default: 0.1)
    pub min_confidence: f32,
    /// Per-frame decay of bpm/confidence during silence (default: 0.95)
    pub silence_decay: f32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            history_len: 256,
            analysis_rate: 43.0,
            min_bpm: 60.0,
            max_bpm: 180.0,
            min_confidence: 0.1,
            silence_decay: 0.95,
        }
    }
}

/// YIN pitch detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchConfig {
    /// Maximum number of waveform samples analysed (default: 4096)
    pub window_size: usize,
    /// Absolute threshold on the cumulative mean normalised difference (default: 0.15)
    pub threshold: f32,
    /// Lowest detectable fundamental in Hz (default: 80.0)
    pub min_frequency: f32,
    /// Highest detectable fundamental in Hz (default: 1000.0)
    pub max_frequency: f32,
    /// YIN results below this probability use the spectral fallback (default: 0.3)
    pub min_probability: f32,
    /// Confidence cap for the spectral fallback (default: 0.8)
    pub fallback_confidence_cap: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            window_size: 4096,
            threshold: 0.15,
            min_frequency: 80.0,
            max_frequency: 1000.0,
            min_probability: 0.3,
            fallback_confidence_cap: 0.8,
        }
    }
}

/// Chroma and harmonic content parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromaConfig {
    /// Lowest bin frequency mapped to a pitch class (default: 80.0)
    pub min_frequency: f32,
    /// Highest bin frequency mapped to a pitch class (default: 4000.0)
    pub max_frequency: f32,
    /// Share of a bin's weight given to its own class (default: 0.7)
    pub center_weight: f32,
    /// Share given to each neighbouring semitone (default: 0.15)
    pub neighbor_weight: f32,
    /// Exponential smoothing against the previous histogram (default: 0.85)
    pub smoothing: f32,
    /// Scale applied to the harmonic/fundamental energy ratio (default: 2.0)
    pub harmonic_scale: f32,
    /// Fundamental energy below which harmonic content is 0 (default: 0.01)
    pub noise_floor: f32,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            min_frequency: 80.0,
            max_frequency: 4000.0,
            center_weight: 0.7,
            neighbor_weight: 0.15,
            smoothing: 0.85,
            harmonic_scale: 2.0,
            noise_floor: 0.01,
        }
    }
}

/// Blend weights and thresholds for timbre and musical context
///
/// These are calibration knobs rather than physical constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimbreConfig {
    /// Gain applied to the normalised centroid before blending into brightness
    pub centroid_gain: f32,
    /// Brightness: weight of the scaled centroid (rolloff gets the rest)
    pub brightness_centroid_weight: f32,
    /// Warmth: weight of the bass band (inverted scaled centroid gets the rest)
    pub warmth_bass_weight: f32,
    /// Warmth: how much brightness pulls warmth down
    pub warmth_brightness_penalty: f32,
    /// Richness: weight of harmonic content (spread gets the rest)
    pub richness_harmonic_weight: f32,
    /// Clarity: weight of pitch confidence (narrowness gets the rest)
    pub clarity_confidence_weight: f32,
    /// Attack: weight of spectral flux (flux scaled by rolloff gets the rest)
    pub attack_flux_weight: f32,
    /// Harmonic complexity: weight of chroma entropy (harmonic content gets the rest)
    pub complexity_entropy_weight: f32,
    /// Tension: weight of spectral spread (dissonance proxy gets the rest)
    pub tension_spread_weight: f32,
    /// Pitch confidence required for `note_present` (default: 0.5)
    pub note_confidence: f32,
    /// Number of recent frames used for note stability (default: 8)
    pub stability_window: usize,
    /// Best key correlation below which mode is unknown (default: 0.3)
    pub min_key_correlation: f32,
}

impl Default for TimbreConfig {
    fn default() -> Self {
        Self {
            centroid_gain: 3.0,
            brightness_centroid_weight: 0.6,
            warmth_bass_weight: 0.7,
            warmth_brightness_penalty: 0.5,
            richness_harmonic_weight: 0.6,
            clarity_confidence_weight: 0.6,
            attack_flux_weight: 0.7,
            complexity_entropy_weight: 0.7,
            tension_spread_weight: 0.4,
            note_confidence: 0.5,
            stability_window: 8,
            min_key_correlation: 0.3,
        }
    }
}

/// Energy surge ("drop") detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropConfig {
    /// Minimum jump in normalised energy between frames (default: 0.5)
    pub threshold: f32,
    /// Minimum time between triggers in milliseconds (default: 500.0)
    pub cooldown_ms: f64,
    /// Intensity decay per frame (default: 0.95)
    pub decay: f32,
    /// Intensity below this snaps to 0 (default: 1e-3)
    pub epsilon: f32,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            cooldown_ms: 500.0,
            decay: 0.95,
            epsilon: 1e-3,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Envelope normaliser parameters (shared by every normalised signal)
    pub envelope: EnvelopeConfig,
    /// Transient detectors
    pub transients: TransientBankConfig,
    /// Mel filterbank / ODF
    pub onset: OnsetConfig,
    /// Tempo estimator
    pub tempo: TempoConfig,
    /// YIN pitch detector
    pub pitch: PitchConfig,
    /// Chroma analyzer
    pub chroma: ChromaConfig,
    /// Timbre analyzer
    pub timbre: TimbreConfig,
    /// Drop detector
    pub drop: DropConfig,
    /// Silence gate on the normalised peak magnitude
    pub silence: SilenceConfig,
}

/// Near-silence gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Frames whose peak normalised magnitude is below this are silent (default: 0.01)
    pub threshold: f32,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self { threshold: 0.01 }
    }
}

fn check(cond: bool, msg: &str) -> Result<(), AnalysisError> {
    if cond {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(msg.to_string()))
    }
}

fn unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

impl EngineConfig {
    /// Check every parameter for values the analyzers cannot work with
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let env = &self.envelope;
        check(unit(env.adaptive_rate), "envelope.adaptive_rate must be in [0, 1]")?;
        check(unit(env.max_decay), "envelope.max_decay must be in [0, 1]")?;
        check(env.min_decay >= 0.0, "envelope.min_decay must be >= 0")?;
        check(env.min_threshold >= 0.0, "envelope.min_threshold must be >= 0")?;
        check(
            env.initial_min >= 0.0 && env.initial_max > env.initial_min && env.initial_max <= 1.0,
            "envelope initial range must satisfy 0 <= min < max <= 1",
        )?;

        let tr = &self.transients;
        check(tr.history_len > 0, "transients.history_len must be > 0")?;
        for band in [tr.bass, tr.mid, tr.treble, tr.overall] {
            check(unit(band.decay), "transient decay must be in [0, 1]")?;
            check(band.multiplier > 0.0, "transient multiplier must be > 0")?;
            check(band.threshold >= 0.0, "transient threshold must be >= 0")?;
        }

        check(self.onset.mel_bands > 0, "onset.mel_bands must be > 0")?;
        check(self.onset.min_frequency >= 0.0, "onset.min_frequency must be >= 0")?;
        check(self.onset.flux_scale > 0.0, "onset.flux_scale must be > 0")?;

        let tempo = &self.tempo;
        check(tempo.history_len >= 8, "tempo.history_len must be >= 8")?;
        check(tempo.analysis_rate > 0.0, "tempo.analysis_rate must be > 0")?;
        check(
            tempo.min_bpm > 0.0 && tempo.min_bpm < tempo.max_bpm,
            "tempo BPM range must satisfy 0 < min_bpm < max_bpm",
        )?;
        check(unit(tempo.min_confidence), "tempo.min_confidence must be in [0, 1]")?;
        check(unit(tempo.silence_decay), "tempo.silence_decay must be in [0, 1]")?;

        let pitch = &self.pitch;
        check(pitch.window_size >= 64, "pitch.window_size must be >= 64")?;
        check(
            pitch.threshold > 0.0 && pitch.threshold < 1.0,
            "pitch.threshold must be in (0, 1)",
        )?;
        check(
            pitch.min_frequency > 0.0 && pitch.min_frequency < pitch.max_frequency,
            "pitch frequency range must satisfy 0 < min < max",
        )?;
        check(unit(pitch.min_probability), "pitch.min_probability must be in [0, 1]")?;
        check(
            unit(pitch.fallback_confidence_cap),
            "pitch.fallback_confidence_cap must be in [0, 1]",
        )?;

        let chroma = &self.chroma;
        check(
            chroma.min_frequency > 0.0 && chroma.min_frequency < chroma.max_frequency,
            "chroma frequency range must satisfy 0 < min < max",
        )?;
        check(
            chroma.center_weight >= 0.0
                && chroma.neighbor_weight >= 0.0
                && chroma.center_weight + 2.0 * chroma.neighbor_weight > 0.0,
            "chroma weights must be non-negative and not all zero",
        )?;
        check(unit(chroma.smoothing), "chroma.smoothing must be in [0, 1]")?;
        check(chroma.noise_floor >= 0.0, "chroma.noise_floor must be >= 0")?;

        check(self.timbre.stability_window > 0, "timbre.stability_window must be > 0")?;

        let drop = &self.drop;
        check(drop.threshold >= 0.0, "drop.threshold must be >= 0")?;
        check(drop.cooldown_ms >= 0.0, "drop.cooldown_ms must be >= 0")?;
        check(unit(drop.decay), "drop.decay must be in [0, 1]")?;

        check(unit(self.silence.threshold), "silence.threshold must be in [0, 1]")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.onset.mel_bands, 40);
        assert_eq!(config.tempo.history_len, 256);
        assert_eq!(config.pitch.window_size, 4096);
        assert!((config.pitch.threshold - 0.15).abs() < 1e-6);
        assert!((config.drop.cooldown_ms - 500.0).abs() < 1e-9);
        assert!((config.transients.bass.multiplier - 1.8).abs() < 1e-6);
        assert!((config.transients.overall.decay - 0.88).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = EngineConfig::default();
        config.onset.mel_bands = 0;
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.tempo.min_bpm = 200.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.chroma.smoothing = 1.5;
        assert!(config.validate().is_err());
    }
}
