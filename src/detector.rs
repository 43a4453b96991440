//! High-level frame-by-frame voice activity detection.
//!
//! `Detector` owns everything one audio stream needs: the resampler delay
//! lines, the filterbank state, the adaptive mixtures, and the hangover
//! counter. Per frame it runs
//!
//! resample -> filterbank -> score -> raw decision -> adapt -> hangover
//!
//! and hands back a single boolean. There is no global state anywhere:
//! detectors for independent streams can live on independent threads, and
//! `&mut self` makes per-instance serialization a compile-time fact.

use tracing::trace;

use crate::classifier::GmmClassifier;
use crate::config::Config;
use crate::decision::{Hangover, raw_decision};
use crate::error::{Error, Result};
use crate::filterbank::FilterBank;
use crate::model::Thresholds;
use crate::resample::Downsampler;

/// A per-stream voice activity detector.
///
/// Construct one per independent audio stream, feed it frames of 10, 20,
/// or 30 ms at the configured rate, and read back a speech/non-speech
/// verdict per frame. Dropping the detector releases all owned state.
#[derive(Debug)]
pub struct Detector {
    config: Config,
    downsampler: Downsampler,
    filterbank: FilterBank,
    classifier: GmmClassifier,
    hangover: Hangover,
    /// Reused 8 kHz frame buffer.
    conditioned: Vec<i16>,
    frame_index: u64,
}

impl Detector {
    /// Create a detector for a validated configuration.
    ///
    /// The classifier starts from the built-in model tables and the
    /// reported state starts as NON_SPEECH.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            downsampler: Downsampler::for_rate(config.sample_rate),
            filterbank: FilterBank::new(),
            classifier: GmmClassifier::new(),
            hangover: Hangover::new(),
            conditioned: Vec::with_capacity(240),
            frame_index: 0,
        }
    }

    /// The configuration this detector was created with.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Classify one frame of 16-bit PCM at the configured rate.
    ///
    /// Returns `true` when the frame is reported as speech (including
    /// frames held by hangover). Fails only with
    /// [`Error::FrameSizeMismatch`]; in that case no internal state has
    /// been touched. Frame *content* is never an error.
    pub fn process(&mut self, frame: &[i16]) -> Result<bool> {
        let rate = self.config.sample_rate;
        let duration = rate
            .duration_for_len(frame.len())
            .ok_or(Error::FrameSizeMismatch {
                got: frame.len(),
                rate: rate.hz(),
            })?;

        self.conditioned.clear();
        self.downsampler.process(frame, &mut self.conditioned);

        let features = self.filterbank.analyze(&self.conditioned);
        let thresholds = Thresholds::for_mode(self.config.mode, duration.index());

        // Near-silent frames get a NON_SPEECH score and leave the model
        // untouched; adapting on them would erode the noise floor.
        let raw = if features.has_signal() {
            let score = self.classifier.score(&features);
            let raw = raw_decision(&score, &thresholds);
            self.classifier.adapt(&features, &score, raw);
            raw
        } else {
            false
        };

        let reported = self.hangover.smooth(raw, &thresholds);

        trace!(
            frame = self.frame_index,
            raw,
            reported,
            total_energy = features.total_energy,
            "frame classified"
        );
        self.frame_index += 1;

        Ok(reported)
    }

    /// Restore the adaptive state to that of a freshly created detector
    /// with the same configuration.
    ///
    /// Clears the mixtures back to the built-in tables, empties the
    /// hangover counter, and flushes all resampler and filterbank delay
    /// lines. The configuration itself is kept.
    pub fn reset(&mut self) {
        self.downsampler.reset();
        self.filterbank = FilterBank::new();
        self.classifier = GmmClassifier::new();
        self.hangover = Hangover::new();
        self.conditioned.clear();
        self.frame_index = 0;
    }
}
