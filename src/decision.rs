//! Raw decision thresholds and hangover smoothing.
//!
//! The classifier's likelihood ratios are turned into a raw per-frame
//! verdict by two tests: any single band clearing a local threshold, or
//! the spectrum-weighted sum clearing a global one. The raw verdict then
//! runs through a hangover counter so short dips inside an utterance do
//! not chatter the reported state back to NON_SPEECH.

use crate::classifier::Score;
use crate::model::{MAX_SPEECH_FRAMES, Thresholds};

/// Raw per-frame decision, before smoothing.
pub(crate) fn raw_decision(score: &Score, thresholds: &Thresholds) -> bool {
    let local = score
        .ratios
        .iter()
        .any(|&ratio| (ratio as i32) * 4 > thresholds.local as i32);

    local || score.weighted_sum >= thresholds.global as i32
}

/// Hysteresis state for the reported decision.
///
/// Starts (and resets to) NON_SPEECH with an empty counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Hangover {
    /// Remaining frames to keep reporting SPEECH after raw speech stops.
    remaining: i16,
    /// Length of the current run of consecutive raw speech frames,
    /// capped at `MAX_SPEECH_FRAMES`.
    speech_run: i16,
}

impl Hangover {
    pub(crate) fn new() -> Self {
        Self {
            remaining: 0,
            speech_run: 0,
        }
    }

    /// Fold one raw decision into the smoothed, reported decision.
    ///
    /// Every raw speech frame re-arms the counter: with the short value
    /// for isolated frames, with the long value once the run proves
    /// sustained. Raw non-speech frames drain the counter and only flip
    /// the report once it is empty.
    pub(crate) fn smooth(&mut self, raw_speech: bool, thresholds: &Thresholds) -> bool {
        if raw_speech {
            self.speech_run += 1;
            if self.speech_run > MAX_SPEECH_FRAMES {
                self.speech_run = MAX_SPEECH_FRAMES;
                self.remaining = thresholds.hangover_long;
            } else {
                self.remaining = thresholds.hangover_short;
            }
            return true;
        }

        self.speech_run = 0;
        if self.remaining > 0 {
            self.remaining -= 1;
            return true;
        }
        false
    }
}
