//! Timbre descriptors and musical context
//!
//! Timbre values are weighted blends of per-frame spectral shape and melodic
//! measurements. The blend weights are calibration parameters carried in
//! [`TimbreConfig`], not physical constants:
//!
//! ```text
//! brightness = w·min(1, centroid·gain) + (1-w)·rolloff
//! warmth     = (w·bass + (1-w)·(1 - centroid·gain)) · (1 - penalty·brightness)
//! richness   = w·harmonic_content + (1-w)·spread
//! clarity    = w·pitch_confidence + (1-w)·(1 - spread)
//! attack     = w·flux + (1-w)·flux·rolloff
//! complexity = w·H(chroma)/ln 12 + (1-w)·harmonic_content
//! tension    = w·spread + (1-w)·(c[d-1] + c[d+1] + c[d+6])
//! ```
//!
//! where `d` is the dominant pitch class and `H` the chroma entropy. The
//! tension term counts energy a semitone and a tritone away from the
//! dominant class as dissonance.

use std::collections::VecDeque;

use crate::analysis::result::{Key, MusicalContext, Mode, Timbre};
use crate::config::TimbreConfig;
use crate::features::bands::SpectralShape;
use crate::features::chroma::{dominant_class, PITCH_CLASSES};
use crate::features::key::{detect_key, KeyTemplates};
use crate::features::pitch::{frequency_to_midi, PitchEstimate};

const EPSILON: f32 = 1e-10;

/// Per-frame measurements the timbre analyzer blends
#[derive(Debug, Clone, Copy)]
pub struct TimbreInput<'a> {
    /// Spectral centroid/spread/rolloff
    pub shape: SpectralShape,
    /// Display flux (0.0-1.0)
    pub flux: f32,
    /// A-weighted bass level (0.0-1.0)
    pub bass: f32,
    /// Harmonic content (0.0-1.0)
    pub harmonic_content: f32,
    /// This frame's pitch estimate
    pub pitch: PitchEstimate,
    /// Smoothed pitch-class vector
    pub chroma: &'a [f32; PITCH_CLASSES],
}

/// Timbre blend plus key/stability tracking
#[derive(Debug, Clone)]
pub struct TimbreAnalyzer {
    config: TimbreConfig,
    templates: KeyTemplates,
    /// Recent rounded MIDI notes (`None` for frames without a note)
    recent_notes: VecDeque<Option<i32>>,
}

impl TimbreAnalyzer {
    /// Create an analyzer from configuration
    pub fn new(config: TimbreConfig) -> Self {
        Self {
            recent_notes: VecDeque::with_capacity(config.stability_window),
            templates: KeyTemplates::new(),
            config,
        }
    }

    /// Compute timbre and musical context for one frame
    pub fn analyze(&mut self, input: &TimbreInput<'_>) -> (Timbre, MusicalContext) {
        let timbre = self.timbre(input);
        let context = self.context(input, timbre.dominant_chroma);
        (timbre, context)
    }

    fn timbre(&self, input: &TimbreInput<'_>) -> Timbre {
        let c = &self.config;
        let shape = input.shape;
        let centroid = (shape.centroid * c.centroid_gain).clamp(0.0, 1.0);

        let brightness = blend(c.brightness_centroid_weight, centroid, shape.rolloff);
        let warmth = blend(c.warmth_bass_weight, input.bass, 1.0 - centroid)
            * (1.0 - c.warmth_brightness_penalty * brightness);
        let richness = blend(c.richness_harmonic_weight, input.harmonic_content, shape.spread);
        let clarity = blend(
            c.clarity_confidence_weight,
            input.pitch.confidence,
            1.0 - shape.spread,
        );
        let attack = blend(c.attack_flux_weight, input.flux, input.flux * shape.rolloff);
        let harmonic_complexity = blend(
            c.complexity_entropy_weight,
            chroma_entropy(input.chroma),
            input.harmonic_content,
        );

        Timbre {
            brightness,
            warmth: warmth.clamp(0.0, 1.0),
            richness,
            clarity,
            attack,
            dominant_chroma: dominant_class(input.chroma),
            harmonic_complexity,
        }
    }

    fn context(&mut self, input: &TimbreInput<'_>, dominant: usize) -> MusicalContext {
        let pitch = input.pitch;
        let note_present = pitch.frequency > 0.0 && pitch.confidence >= self.config.note_confidence;

        let note = if note_present {
            frequency_to_midi(pitch.frequency).map(|m| m.round() as i32)
        } else {
            None
        };
        if self.recent_notes.len() >= self.config.stability_window.max(1) {
            self.recent_notes.pop_front();
        }
        self.recent_notes.push_back(note);

        let (key, mode) = if note_present {
            match detect_key(input.chroma, &self.templates) {
                Some(result) if result.correlation >= self.config.min_key_correlation => {
                    (Some(result.key), result.key.mode())
                }
                _ => (None, Mode::Unknown),
            }
        } else {
            (None, Mode::Unknown)
        };

        let chroma = input.chroma;
        let dissonance = chroma[(dominant + 1) % PITCH_CLASSES]
            + chroma[(dominant + PITCH_CLASSES - 1) % PITCH_CLASSES]
            + chroma[(dominant + 6) % PITCH_CLASSES];
        let tension = blend(self.config.tension_spread_weight, input.shape.spread, dissonance);

        MusicalContext {
            note_present,
            note_stability: self.note_stability(),
            key,
            mode,
            tension,
        }
    }

    /// Share of the recent window held by its most frequent note
    fn note_stability(&self) -> f32 {
        if self.recent_notes.is_empty() {
            return 0.0;
        }

        let notes: Vec<i32> = self.recent_notes.iter().flatten().copied().collect();
        let most_frequent = notes
            .iter()
            .map(|n| notes.iter().filter(|&m| m == n).count())
            .max()
            .unwrap_or(0);

        most_frequent as f32 / self.recent_notes.len() as f32
    }

    /// Key the analyzer would report for `chroma` regardless of note presence
    pub fn estimate_key(&self, chroma: &[f32; PITCH_CLASSES]) -> Option<Key> {
        detect_key(chroma, &self.templates)
            .filter(|r| r.correlation >= self.config.min_key_correlation)
            .map(|r| r.key)
    }

    /// Forget the note history
    pub fn reset(&mut self) {
        self.recent_notes.clear();
    }
}

/// `w·a + (1-w)·b`, clamped to [0, 1]
fn blend(weight: f32, a: f32, b: f32) -> f32 {
    (weight * a + (1.0 - weight) * b).clamp(0.0, 1.0)
}

/// Shannon entropy of the chroma vector normalised by ln 12 (0.0-1.0)
fn chroma_entropy(chroma: &[f32; PITCH_CLASSES]) -> f32 {
    let sum: f32 = chroma.iter().sum();
    if sum <= EPSILON {
        return 0.0;
    }

    let entropy: f32 = chroma
        .iter()
        .map(|&v| v / sum)
        .filter(|&p| p > EPSILON)
        .map(|p| -p * p.ln())
        .sum();

    (entropy / (PITCH_CLASSES as f32).ln()).clamp(0.0, 1.0)
}
