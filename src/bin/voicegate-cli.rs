use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use std::fs::File;
use std::io::BufReader;

use voicegate::config::{Aggressiveness, Config, FrameDuration, SampleRate};
use voicegate::logging;
use voicegate::stream::{SegmentEvent, SegmenterPolicy, SpeechSegmenter};
use voicegate::wav::read_mono_pcm;

fn main() -> Result<()> {
    logging::init();
    let params = Params::parse();

    let file = File::open(&params.audio_path)
        .with_context(|| format!("failed to open '{}'", params.audio_path))?;
    let (samples, spec) = read_mono_pcm(BufReader::new(file))?;

    let sample_rate = SampleRate::from_hz(spec.sample_rate)
        .context("WAV reader accepted a rate the detector does not support")?;
    let mode = Aggressiveness::from_level(params.mode)
        .with_context(|| format!("unsupported aggressiveness level {}", params.mode))?;

    let policy = SegmenterPolicy {
        frame_duration: params.frame.into(),
        min_speech_ms: params.min_speech_ms,
        min_silence_ms: params.min_silence_ms,
    };
    let mut segmenter = SpeechSegmenter::new(Config { sample_rate, mode }, policy);

    let mut events = Vec::new();
    segmenter.push(&samples, &mut events)?;
    segmenter.finish(&mut events);

    match params.output_type {
        OutputType::Text => print_text(&events),
        OutputType::Json => println!("{}", serde_json::to_string_pretty(&events)?),
    }

    Ok(())
}

fn print_text(events: &[SegmentEvent]) {
    for event in events {
        match event {
            SegmentEvent::SpeechStart { start_ms } => {
                println!("speech start  {:>8.2}s", *start_ms as f64 / 1_000.0);
            }
            SegmentEvent::SpeechEnd {
                start_ms,
                duration_ms,
            } => {
                println!(
                    "speech end    {:>8.2}s  ({:.2}s long)",
                    (*start_ms + *duration_ms) as f64 / 1_000.0,
                    *duration_ms as f64 / 1_000.0
                );
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "voicegate")]
#[command(about = "Detect speech segments in a WAV file")]
struct Params {
    #[arg(short = 'a', long = "audio")]
    pub audio_path: String,

    /// Aggressiveness: 0 (permissive) through 3 (strict).
    #[arg(short = 'm', long = "mode", default_value_t = 0)]
    pub mode: u8,

    #[arg(short = 'f', long = "frame", value_enum, default_value_t = FrameArg::Ms30)]
    pub frame: FrameArg,

    #[arg(long = "min-speech-ms", default_value_t = 250)]
    pub min_speech_ms: u32,

    #[arg(long = "min-silence-ms", default_value_t = 100)]
    pub min_silence_ms: u32,

    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Text
    )]
    pub output_type: OutputType,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FrameArg {
    #[value(name = "10")]
    Ms10,
    #[value(name = "20")]
    Ms20,
    #[value(name = "30")]
    Ms30,
}

impl From<FrameArg> for FrameDuration {
    fn from(value: FrameArg) -> Self {
        match value {
            FrameArg::Ms10 => FrameDuration::Ms10,
            FrameArg::Ms20 => FrameDuration::Ms20,
            FrameArg::Ms30 => FrameDuration::Ms30,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputType {
    Text,
    Json,
}
