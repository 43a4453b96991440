//! Sample-rate conversion down to the detector's internal 8 kHz.
//!
//! Only the enumerated input rates are supported, each with a fixed
//! cascade:
//!
//! - 8 kHz: passed through untouched
//! - 16 kHz: one half-band decimation
//! - 32 kHz: two half-band decimations
//! - 48 kHz: half-band to 24 kHz, fractional 3:2 to 16 kHz, half-band to
//!   8 kHz
//!
//! Every stage carries its delay-line state across calls, so a stream
//! resampled in arbitrary chunks is bit-identical to the same stream
//! resampled in one call. Unsupported rates never reach this module; they
//! are rejected when the configuration is built.

mod fractional;
mod halfband;

pub use fractional::FractionalDecimator;
pub use halfband::HalfbandDecimator;

use crate::config::SampleRate;

/// The full conversion pipeline for one configured input rate.
#[derive(Debug, Clone)]
pub enum Downsampler {
    /// 8 kHz input needs no conditioning.
    PassThrough,
    /// 16 kHz input: one half-band stage.
    By2(HalfbandDecimator),
    /// 32 kHz input: two half-band stages.
    By4 {
        to_16k: HalfbandDecimator,
        to_8k: HalfbandDecimator,
    },
    /// 48 kHz input: half-band, fractional 3:2, half-band.
    From48k {
        to_24k: HalfbandDecimator,
        to_16k: FractionalDecimator,
        to_8k: HalfbandDecimator,
        scratch: Vec<i16>,
    },
}

impl Downsampler {
    /// Build the cascade for a supported input rate.
    pub fn for_rate(rate: SampleRate) -> Self {
        match rate {
            SampleRate::Hz8000 => Self::PassThrough,
            SampleRate::Hz16000 => Self::By2(HalfbandDecimator::new()),
            SampleRate::Hz32000 => Self::By4 {
                to_16k: HalfbandDecimator::new(),
                to_8k: HalfbandDecimator::new(),
            },
            SampleRate::Hz48000 => Self::From48k {
                to_24k: HalfbandDecimator::new(),
                to_16k: FractionalDecimator::new(),
                to_8k: HalfbandDecimator::new(),
                scratch: Vec::new(),
            },
        }
    }

    /// Clear all stage delay lines back to their initial state.
    pub fn reset(&mut self) {
        match self {
            Self::PassThrough => {}
            Self::By2(stage) => stage.reset(),
            Self::By4 { to_16k, to_8k } => {
                to_16k.reset();
                to_8k.reset();
            }
            Self::From48k {
                to_24k,
                to_16k,
                to_8k,
                scratch,
            } => {
                to_24k.reset();
                to_16k.reset();
                to_8k.reset();
                scratch.clear();
            }
        }
    }

    /// Convert `input` at the configured rate, appending 8 kHz samples to
    /// `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        match self {
            Self::PassThrough => output.extend_from_slice(input),
            Self::By2(stage) => stage.process(input, output),
            Self::By4 { to_16k, to_8k } => {
                let mut intermediate = Vec::with_capacity(input.len() / 2);
                to_16k.process(input, &mut intermediate);
                to_8k.process(&intermediate, output);
            }
            Self::From48k {
                to_24k,
                to_16k,
                to_8k,
                scratch,
            } => {
                scratch.clear();
                to_24k.process(input, scratch);
                let mut at_16k = Vec::with_capacity(scratch.len() * 2 / 3 + 2);
                to_16k.process(scratch, &mut at_16k);
                to_8k.process(&at_16k, output);
            }
        }
    }
}
