use anyhow::{Context, Result};
use hound::{WavReader, WavSpec};
use std::io::{Read, Seek};

use crate::config::SampleRate;

/// Load WAV audio from a reader and return raw 16-bit PCM samples.
///
/// Format requirements:
/// - Mono (1 channel)
/// - 16-bit integer samples
/// - One of the detector's supported sample rates
///
/// The detector works on raw fixed-point samples, so unlike typical ASR
/// front ends nothing is normalized to floating point here.
pub fn read_mono_pcm<R>(reader: R) -> Result<(Vec<i16>, WavSpec)>
where
    R: Read + Seek,
{
    let mut reader = WavReader::new(reader).context("failed to read WAV data from reader")?;
    let spec = reader.spec();

    if spec.channels != 1 {
        anyhow::bail!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        );
    }

    if spec.bits_per_sample != 16 {
        anyhow::bail!(
            "expected 16-bit PCM, got {} bits per sample",
            spec.bits_per_sample
        );
    }

    if SampleRate::from_hz(spec.sample_rate).is_none() {
        anyhow::bail!(
            "unsupported sample rate {} Hz (expected 8000, 16000, 32000 or 48000)",
            spec.sample_rate
        );
    }

    let mut samples = Vec::new();
    for sample in reader.samples::<i16>() {
        samples.push(sample?);
    }

    Ok((samples, spec))
}
