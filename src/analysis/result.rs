//! Feature record types
//!
//! One [`FeatureRecord`] is produced per input frame. Ratio fields are in
//! [0, 1] unless their docs say otherwise.

use serde::{Deserialize, Serialize};

/// Pitch-class names with sharps, C first
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Key name in musical notation ("C", "F#", "Am", "C#m")
    ///
    /// # Example
    ///
    /// ```
    /// use aura_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(i) => NOTE_NAMES[*i as usize % 12].to_string(),
            Key::Minor(i) => format!("{}m", NOTE_NAMES[*i as usize % 12]),
        }
    }

    /// Tonic pitch class (0 = C ... 11 = B)
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => i % 12,
        }
    }

    /// Major or minor
    pub fn mode(&self) -> Mode {
        match self {
            Key::Major(_) => Mode::Major,
            Key::Minor(_) => Mode::Minor,
        }
    }
}

/// Tonal mode of the current material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Major key detected
    Major,
    /// Minor key detected
    Minor,
    /// No note present or key correlation too weak
    #[default]
    Unknown,
}

/// Bass / mid / treble levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandLevels {
    /// f ≤ 250 Hz
    pub bass: f32,
    /// 250 Hz < f ≤ 4 kHz
    pub mid: f32,
    /// f > 4 kHz
    pub treble: f32,
}

/// Transient flags for this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transients {
    /// Bass transient
    pub bass: bool,
    /// Mid transient
    pub mid: bool,
    /// Treble transient
    pub treble: bool,
    /// Overall energy transient (re-anchors beat phase)
    pub overall: bool,
}

/// Spectral shape descriptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectral {
    /// Centroid / Nyquist
    pub centroid: f32,
    /// Spread around the centroid / (Nyquist / 2)
    pub spread: f32,
    /// Scaled onset detection function
    pub flux: f32,
    /// 85% rolloff frequency / Nyquist
    pub rolloff: f32,
}

/// Pitch and harmony
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melodic {
    /// Fundamental in Hz (0 when unpitched)
    pub frequency_hz: f32,
    /// Nearest note ("A4"), or "N/A"
    pub note: String,
    /// Pitch confidence
    pub confidence: f32,
    /// Overtone energy relative to the fundamental
    pub harmonic_content: f32,
    /// Smoothed pitch-class distribution (C..B)
    pub pitch_class: [f32; 12],
}

impl Default for Melodic {
    fn default() -> Self {
        Self {
            frequency_hz: 0.0,
            note: "N/A".to_string(),
            confidence: 0.0,
            harmonic_content: 0.0,
            pitch_class: [0.0; 12],
        }
    }
}

/// Tempo and beat position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rhythmic {
    /// Tempo in BPM (0 without a confident estimate)
    pub bpm: f32,
    /// Tempo confidence, 0-100
    pub confidence: f32,
    /// Position inside the current beat
    pub beat_phase: f32,
    /// Pulses per beat (1, 2 or 4; 0 without tempo)
    pub subdivision: u8,
    /// Groove, 0-100
    pub groove: f32,
}

/// Timbre descriptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timbre {
    /// High-frequency emphasis
    pub brightness: f32,
    /// Low-frequency body
    pub warmth: f32,
    /// Overtone richness
    pub richness: f32,
    /// Pitch clarity
    pub clarity: f32,
    /// Onset sharpness
    pub attack: f32,
    /// Strongest pitch class (0 = C ... 11 = B)
    pub dominant_chroma: usize,
    /// Chroma entropy blended with harmonic content
    pub harmonic_complexity: f32,
}

/// Higher-level musical state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicalContext {
    /// A confident pitch is present
    pub note_present: bool,
    /// Share of recent frames holding the most common note
    pub note_stability: f32,
    /// Detected key, if any
    pub key: Option<Key>,
    /// Mode of the detected key
    pub mode: Mode,
    /// Heuristic harmonic tension
    pub tension: f32,
}

/// Everything the engine derives from one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Timestamp of the source frame in seconds
    pub timestamp: f64,
    /// Waveform RMS
    pub volume: f32,
    /// Envelope-normalised spectral energy
    pub energy: f32,
    /// A-weighted band levels
    pub bands: BandLevels,
    /// Envelope-normalised band levels
    pub dynamic_bands: BandLevels,
    /// Transient flags
    pub transients: Transients,
    /// Drop intensity
    pub drop_intensity: f32,
    /// Spectral shape
    pub spectral: Spectral,
    /// Pitch and harmony
    pub melodic: Melodic,
    /// Tempo and beat
    pub rhythmic: Rhythmic,
    /// Timbre
    pub timbre: Timbre,
    /// Musical context
    pub musical_context: MusicalContext,
}

impl FeatureRecord {
    /// Zeroed record for a silent frame
    ///
    /// Levels, transients and pitch are cleared; the caller supplies the
    /// decayed state that carries across silence.
    pub fn silent(
        timestamp: f64,
        rhythmic: Rhythmic,
        drop_intensity: f32,
        pitch_class: [f32; 12],
    ) -> Self {
        Self {
            timestamp,
            drop_intensity,
            rhythmic,
            melodic: Melodic {
                pitch_class,
                ..Melodic::default()
            },
            ..Self::default()
        }
    }
}
