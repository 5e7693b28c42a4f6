//! Integration tests for the feature engine

use aura_dsp::io::{AnalyserConfig, FrameAnalyser};
use aura_dsp::{
    AnalysisError, AudioSource, EngineConfig, EngineWorker, FeatureEngine, FeatureRecord,
    FrameInput, Mode,
};

const SAMPLE_RATE: f32 = 44100.0;
const FFT_SIZE: usize = 2048;

/// Analysis rate used by the default tempo estimator
const ANALYSIS_RATE: f64 = 43.0;

fn engine() -> FeatureEngine {
    FeatureEngine::new(EngineConfig::default()).expect("default config is valid")
}

/// Synthesise `seconds` of mono audio from a per-sample function
fn synth(seconds: f32, f: impl Fn(f32) -> f32) -> Vec<f32> {
    (0..(seconds * SAMPLE_RATE) as usize)
        .map(|i| f(i as f32 / SAMPLE_RATE))
        .collect()
}

/// Run PCM through the analyser with a fixed hop, one frame per hop
fn analyse_stream(samples: &[f32], hop: usize) -> Vec<FrameInput> {
    let mut analyser = FrameAnalyser::new(AnalyserConfig::default()).expect("valid analyser config");
    let mut frames = Vec::new();
    let mut start = 0;
    while start + FFT_SIZE <= samples.len() {
        let timestamp = (start + FFT_SIZE) as f64 / SAMPLE_RATE as f64;
        frames.push(
            analyser
                .analyse(&samples[start..start + FFT_SIZE], SAMPLE_RATE, timestamp)
                .expect("window has fft_size samples"),
        );
        start += hop;
    }
    frames
}

fn run(engine: &mut FeatureEngine, frames: &[FrameInput]) -> Vec<FeatureRecord> {
    frames
        .iter()
        .map(|f| engine.step(f).expect("frame should be accepted"))
        .collect()
}

/// Flat spectrum at `level`, centred waveform, at analysis slot `i`
fn flat_frame(level: u8, i: usize) -> FrameInput {
    FrameInput::new(
        vec![level; FFT_SIZE / 2],
        vec![128; FFT_SIZE],
        SAMPLE_RATE,
        i as f64 / ANALYSIS_RATE,
    )
}

/// Click track directly in frame form: quiet floor with a broadband click every `period` slots
fn click_frames(count: usize, period: usize) -> Vec<FrameInput> {
    (0..count)
        .map(|i| flat_frame(if i % period == 0 { 200 } else { 10 }, i))
        .collect()
}

fn assert_unit(value: f32, what: &str) {
    assert!(
        (0.0..=1.0).contains(&value),
        "{} out of [0, 1]: {}",
        what,
        value
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_stay_in_unit_range() {
        // Tone + noise-like chirp + clicks: exercises every band
        let samples = synth(2.0, |t| {
            let click = if (t * 4.0).fract() < 0.005 { 0.9 } else { 0.0 };
            0.3 * (2.0 * std::f32::consts::PI * 110.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * (500.0 + 3000.0 * t) * t).sin()
                + click
        });
        let frames = analyse_stream(&samples, 1024);
        let mut engine = engine();

        for record in run(&mut engine, &frames) {
            for (value, what) in [
                (record.bands.bass, "bands.bass"),
                (record.bands.mid, "bands.mid"),
                (record.bands.treble, "bands.treble"),
                (record.dynamic_bands.bass, "dynamic_bands.bass"),
                (record.dynamic_bands.mid, "dynamic_bands.mid"),
                (record.dynamic_bands.treble, "dynamic_bands.treble"),
                (record.spectral.centroid, "spectral.centroid"),
                (record.spectral.spread, "spectral.spread"),
                (record.spectral.flux, "spectral.flux"),
                (record.spectral.rolloff, "spectral.rolloff"),
                (record.volume, "volume"),
                (record.energy, "energy"),
                (record.drop_intensity, "drop_intensity"),
                (record.rhythmic.beat_phase, "rhythmic.beat_phase"),
            ] {
                assert_unit(value, what);
            }
            assert!((0.0..=100.0).contains(&record.rhythmic.confidence));
            assert!(record.timbre.dominant_chroma < 12);
        }
    }

    #[test]
    fn test_identical_frames_give_zero_flux() {
        let mut engine = engine();
        let frame = flat_frame(90, 0);
        engine.step(&frame).expect("valid frame");
        let record = engine.step(&flat_frame(90, 1)).expect("valid frame");
        assert_eq!(record.spectral.flux, 0.0);
    }

    #[test]
    fn test_click_track_tempo() {
        let period = 21;
        let mut engine = engine();
        let records = run(&mut engine, &click_frames(320, period));
        let last = records.last().expect("frames were processed");

        let expected = 60.0 * ANALYSIS_RATE as f32 / period as f32;
        assert!(
            (last.rhythmic.bpm - expected).abs() / expected < 0.02,
            "expected {:.2} BPM, got {:.2}",
            expected,
            last.rhythmic.bpm
        );
        assert!(
            last.rhythmic.confidence > 70.0,
            "confidence too low: {:.1}",
            last.rhythmic.confidence
        );
        assert_eq!(last.rhythmic.groove, last.rhythmic.confidence);

        // Clicks fire the overall transient, which anchors beat phase
        assert!(records.iter().any(|r| r.transients.overall));
        let click = &records[21 * 14];
        assert!(click.transients.overall);
        assert!(click.rhythmic.beat_phase < 1e-3);
    }

    #[test]
    fn test_tempo_is_independent_of_frame_rate() {
        // Same clicks, but the host runs the engine at ~2.3x the analysis rate
        let period_s = 21.0 / ANALYSIS_RATE;
        let fps = 100.0;
        let frames: Vec<FrameInput> = (0..800)
            .map(|i| {
                let t = i as f64 / fps;
                let phase = (t / period_s).fract();
                let level = if phase < 1.0 / (period_s * fps) { 200 } else { 10 };
                FrameInput::new(vec![level; FFT_SIZE / 2], vec![128; FFT_SIZE], SAMPLE_RATE, t)
            })
            .collect();

        let mut engine = engine();
        let last = run(&mut engine, &frames).pop().expect("frames were processed");
        let expected = 60.0 / period_s as f32;
        assert!(
            (last.rhythmic.bpm - expected).abs() / expected < 0.05,
            "expected ~{:.1} BPM, got {:.1}",
            expected,
            last.rhythmic.bpm
        );
    }

    #[test]
    fn test_sine_440_pitch_and_chroma() {
        let samples = synth(1.5, |t| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin());
        let frames = analyse_stream(&samples, 1024);
        let mut engine = engine();
        let records = run(&mut engine, &frames);
        let last = records.last().expect("frames were processed");

        let melodic = &last.melodic;
        assert!(
            (melodic.frequency_hz - 440.0).abs() / 440.0 < 0.01,
            "expected ~440 Hz, got {:.2}",
            melodic.frequency_hz
        );
        assert!(melodic.confidence > 0.7, "confidence {:.3}", melodic.confidence);
        assert_eq!(melodic.note, "A4");
        assert_eq!(last.timbre.dominant_chroma, 9);

        let peak = melodic
            .pitch_class
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i);
        assert_eq!(peak, Some(9));

        assert!(last.musical_context.note_present);
        assert!(last.musical_context.note_stability > 0.99);
    }

    #[test]
    fn test_energy_surge_triggers_drop() {
        let mut engine = engine();
        let frame_s = 1.0 / 60.0;
        let frame = |level: u8, i: usize| {
            FrameInput::new(
                vec![level; FFT_SIZE / 2],
                vec![128; FFT_SIZE],
                SAMPLE_RATE,
                i as f64 * frame_s,
            )
        };

        for i in 0..90 {
            let record = engine.step(&frame(10, i)).expect("valid frame");
            assert_eq!(record.drop_intensity, 0.0);
        }

        let first = engine.step(&frame(200, 90)).expect("valid frame");
        assert!(first.drop_intensity > 0.5, "got {}", first.drop_intensity);

        let mut last = first.drop_intensity;
        let mut reached_zero = false;
        for i in 91..400 {
            let intensity = engine.step(&frame(200, i)).expect("valid frame").drop_intensity;
            assert!(intensity <= last, "intensity rose: {} -> {}", last, intensity);
            last = intensity;
            if intensity == 0.0 {
                reached_zero = true;
                break;
            }
        }
        assert!(reached_zero, "drop intensity never decayed to 0");
    }

    #[test]
    fn test_all_zero_input() {
        let mut engine = engine();
        let frame = |i: usize| {
            FrameInput::new(vec![0; 1024], vec![128; 2048], SAMPLE_RATE, i as f64 / 60.0)
        };

        for i in 0..120 {
            let record = engine.step(&frame(i)).expect("valid frame");
            assert_eq!(record.volume, 0.0);
            assert_eq!(record.energy, 0.0);
            assert!(!record.transients.bass);
            assert!(!record.transients.mid);
            assert!(!record.transients.treble);
            assert!(!record.transients.overall);
            assert_eq!(record.rhythmic.bpm, 0.0);
            assert_eq!(record.melodic.note, "N/A");
            assert_eq!(record.musical_context.mode, Mode::Unknown);
        }
    }

    #[test]
    fn test_bpm_decays_through_silence() {
        let mut engine = engine();
        let records = run(&mut engine, &click_frames(300, 21));
        let locked = records.last().expect("frames were processed").rhythmic.bpm;
        assert!(locked > 100.0);

        let mut last = locked;
        for i in 300..500 {
            let record = engine.step(&flat_frame(0, i)).expect("valid frame");
            assert!(record.rhythmic.bpm <= last);
            last = record.rhythmic.bpm;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let mut engine = engine();

        let not_pow2 = FrameInput::new(vec![0; 1000], vec![128; 2048], SAMPLE_RATE, 0.0);
        assert!(matches!(engine.step(&not_pow2), Err(AnalysisError::InvalidInput(_))));

        let empty = FrameInput::new(vec![], vec![128; 2048], SAMPLE_RATE, 0.0);
        assert!(matches!(engine.step(&empty), Err(AnalysisError::InvalidInput(_))));

        let bad_rate = FrameInput::new(vec![0; 1024], vec![128; 2048], 0.0, 0.0);
        assert!(matches!(engine.step(&bad_rate), Err(AnalysisError::InvalidInput(_))));

        let nan_rate = FrameInput::new(vec![0; 1024], vec![128; 2048], f32::NAN, 0.0);
        assert!(matches!(engine.step(&nan_rate), Err(AnalysisError::InvalidInput(_))));

        engine.step(&flat_frame(20, 0)).expect("valid frame");
        let resized = FrameInput::new(vec![20; 512], vec![128; 2048], SAMPLE_RATE, 0.1);
        assert!(matches!(engine.step(&resized), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_source_switch_resets_state() {
        let mut engine = engine();
        engine.switch_source(AudioSource::File);
        let records = run(&mut engine, &click_frames(300, 21));
        assert!(records.last().expect("frames were processed").rhythmic.bpm > 0.0);

        engine.switch_source(AudioSource::Microphone);
        let record = engine.step(&flat_frame(10, 0)).expect("valid frame");
        assert_eq!(record.rhythmic.bpm, 0.0);
        assert_eq!(record.drop_intensity, 0.0);
        assert_eq!(engine.frames_processed(), 1);
    }

    #[test]
    fn test_worker_matches_direct_engine() {
        let samples = synth(0.5, |t| 0.4 * (2.0 * std::f32::consts::PI * 330.0 * t).sin());
        let frames = analyse_stream(&samples, 1024);

        let mut direct = engine();
        let expected = run(&mut direct, &frames);

        let worker = EngineWorker::spawn(EngineConfig::default()).expect("worker starts");
        for frame in &frames {
            worker.submit(frame.clone()).expect("worker is running");
        }
        for want in &expected {
            let got = worker.recv().expect("result for every frame");
            assert_eq!(&got, want);
        }
        worker.shutdown().expect("clean shutdown");
    }

    #[test]
    fn test_record_json_round_trip() {
        let samples = synth(0.2, |t| 0.4 * (2.0 * std::f32::consts::PI * 220.0 * t).sin());
        let frames = analyse_stream(&samples, 1024);
        let mut engine = engine();
        let record = run(&mut engine, &frames).pop().expect("frames were processed");

        let json = serde_json::to_string(&record).expect("record serializes");
        let back: FeatureRecord = serde_json::from_str(&json).expect("record deserializes");
        assert_eq!(back, record);
    }
}
