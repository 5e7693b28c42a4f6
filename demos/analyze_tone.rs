//! Analyse a synthetic tone over a click track and print one JSON record per
//! frame.
//!
//! ```text
//! RUST_LOG=debug cargo run --example analyze_tone -- [frequency_hz] [bpm]
//! ```

use aura_dsp::io::{AnalyserConfig, FrameAnalyser, SampleBuffer};
use aura_dsp::{AnalysisError, AudioSource, EngineConfig, FeatureEngine};

const SAMPLE_RATE: f32 = 44100.0;
const HOP: usize = 1024;
const SECONDS: f32 = 8.0;

fn main() -> Result<(), AnalysisError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let frequency: f32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(440.0);
    let bpm: f32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(120.0);
    let beat = 60.0 / bpm;

    log::info!("Synthesising {:.1} Hz over {:.1} BPM clicks", frequency, bpm);

    let samples: Vec<f32> = (0..(SECONDS * SAMPLE_RATE) as usize)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            let since_beat = t % beat;
            let click = if since_beat < 0.01 {
                0.8 * (1.0 - since_beat / 0.01) * (2.0 * std::f32::consts::PI * 3000.0 * t).sin()
            } else {
                0.0
            };
            0.3 * (2.0 * std::f32::consts::PI * frequency * t).sin() + click
        })
        .collect();

    let mut analyser = FrameAnalyser::new(AnalyserConfig::default())?;
    let mut engine = FeatureEngine::new(EngineConfig::default())?;
    engine.switch_source(AudioSource::File);

    let window = analyser.fft_size();
    let mut buffer = SampleBuffer::new(samples.len());
    buffer.push(&samples);

    let mut consumed = 0usize;
    while let Some(pcm) = buffer.next_window(window, HOP) {
        let timestamp = (consumed + window) as f64 / SAMPLE_RATE as f64;
        let frame = analyser.analyse(pcm, SAMPLE_RATE, timestamp)?;
        let record = engine.step(&frame)?;
        consumed += HOP;

        match serde_json::to_string(&record) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                return Err(AnalysisError::ProcessingError(format!(
                    "Failed to serialize record: {}",
                    e
                )))
            }
        }
    }

    log::info!("Analysed {} frames", engine.frames_processed());
    Ok(())
}
