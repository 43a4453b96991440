use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sample rates the detector accepts on its input side.
///
/// Internally every rate is conditioned down to 8 kHz before analysis, so
/// this set is closed: it enumerates exactly the conversions the resampler
/// cascade implements. Anything else is rejected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleRate {
    #[serde(rename = "8000")]
    Hz8000,
    #[serde(rename = "16000")]
    Hz16000,
    #[serde(rename = "32000")]
    Hz32000,
    #[serde(rename = "48000")]
    Hz48000,
}

impl SampleRate {
    /// Map a raw rate in Hz onto the supported set.
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            8_000 => Some(Self::Hz8000),
            16_000 => Some(Self::Hz16000),
            32_000 => Some(Self::Hz32000),
            48_000 => Some(Self::Hz48000),
            _ => None,
        }
    }

    /// The rate in Hz.
    pub fn hz(self) -> u32 {
        match self {
            Self::Hz8000 => 8_000,
            Self::Hz16000 => 16_000,
            Self::Hz32000 => 32_000,
            Self::Hz48000 => 48_000,
        }
    }

    /// Number of input samples in one frame of the given duration.
    pub fn samples_per_frame(self, duration: FrameDuration) -> usize {
        (self.hz() as usize / 100) * duration.tens_of_ms()
    }

    /// Classify a raw frame length as one of the three supported durations.
    pub(crate) fn duration_for_len(self, len: usize) -> Option<FrameDuration> {
        let per_10ms = self.hz() as usize / 100;
        if len == 0 || len % per_10ms != 0 {
            return None;
        }
        match len / per_10ms {
            1 => Some(FrameDuration::Ms10),
            2 => Some(FrameDuration::Ms20),
            3 => Some(FrameDuration::Ms30),
            _ => None,
        }
    }
}

/// Supported frame durations.
///
/// The classifier's decision thresholds are tuned per duration, so the
/// duration is recovered from each frame's length rather than fixed at
/// configuration time. Callers may freely mix durations on one detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameDuration {
    Ms10,
    Ms20,
    Ms30,
}

impl FrameDuration {
    /// Duration in milliseconds.
    pub fn ms(self) -> u32 {
        self.tens_of_ms() as u32 * 10
    }

    fn tens_of_ms(self) -> usize {
        match self {
            Self::Ms10 => 1,
            Self::Ms20 => 2,
            Self::Ms30 => 3,
        }
    }

    /// Index into the per-duration threshold tables.
    pub(crate) fn index(self) -> usize {
        self.tens_of_ms() - 1
    }
}

/// Detector aggressiveness.
///
/// Higher modes use stricter likelihood thresholds and shorter hangover,
/// trading missed speech for fewer false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    Quality,
    LowBitrate,
    Aggressive,
    VeryAggressive,
}

impl Aggressiveness {
    /// Map a raw mode level (0..=3) onto the supported set.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Quality),
            1 => Some(Self::LowBitrate),
            2 => Some(Self::Aggressive),
            3 => Some(Self::VeryAggressive),
            _ => None,
        }
    }

    /// The raw mode level (0..=3).
    pub fn level(self) -> u8 {
        match self {
            Self::Quality => 0,
            Self::LowBitrate => 1,
            Self::Aggressive => 2,
            Self::VeryAggressive => 3,
        }
    }
}

/// Per-detector configuration: input sample rate plus aggressiveness mode.
///
/// `Config` is made of closed enums, so a constructed value is always valid.
/// [`Config::new`] is the fallible entry point for raw numbers coming from
/// CLIs, config files, or FFI-ish callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub sample_rate: SampleRate,
    pub mode: Aggressiveness,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Hz16000,
            mode: Aggressiveness::Quality,
        }
    }
}

impl Config {
    /// Validate a raw `(rate, mode level)` pair.
    ///
    /// This is the configuration-time check: unsupported values fail here,
    /// once, instead of on every frame.
    pub fn new(sample_rate_hz: u32, mode_level: u8) -> Result<Self> {
        let sample_rate = SampleRate::from_hz(sample_rate_hz).ok_or_else(|| {
            Error::invalid_configuration(format!(
                "unsupported sample rate {sample_rate_hz} Hz (expected 8000, 16000, 32000 or 48000)"
            ))
        })?;

        let mode = Aggressiveness::from_level(mode_level).ok_or_else(|| {
            Error::invalid_configuration(format!(
                "unsupported aggressiveness level {mode_level} (expected 0..=3)"
            ))
        })?;

        Ok(Self { sample_rate, mode })
    }
}
