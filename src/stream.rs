//! Streaming speech segmentation on top of the frame detector.
//!
//! `Detector` wants exact 10/20/30 ms frames; capture pipelines deliver
//! whatever chunk size their ring buffer produces. `SpeechSegmenter`
//! bridges the two: it buffers arbitrary chunks, slices them into frames,
//! and debounces the per-frame decisions into utterance-level
//! [`SegmentEvent`]s with millisecond timestamps.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, FrameDuration};
use crate::detector::Detector;
use crate::error::Result;

/// Debounce policy for turning frame decisions into segments.
///
/// Durations are in milliseconds; they are rounded up to whole frames of
/// the configured duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterPolicy {
    /// Frame duration fed to the detector.
    pub frame_duration: FrameDuration,
    /// Speech must persist this long before a segment opens.
    pub min_speech_ms: u32,
    /// Silence must persist this long before a segment closes.
    pub min_silence_ms: u32,
}

impl Default for SegmenterPolicy {
    fn default() -> Self {
        Self {
            frame_duration: FrameDuration::Ms30,
            min_speech_ms: 250,
            min_silence_ms: 100,
        }
    }
}

/// Utterance boundaries emitted by the segmenter.
///
/// Timestamps count milliseconds of audio pushed since construction (or
/// the last [`SpeechSegmenter::reset`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SegmentEvent {
    SpeechStart {
        start_ms: u64,
    },
    SpeechEnd {
        start_ms: u64,
        duration_ms: u64,
    },
}

/// Debounced segment state machine, driven one frame decision at a time.
///
/// Kept separate from the audio plumbing so the transition logic is
/// directly testable.
#[derive(Debug, Clone, Copy)]
struct SegmentTracker {
    min_speech_ms: u64,
    min_silence_ms: u64,
    /// Open segment start, once debounced.
    segment_start: Option<u64>,
    /// First frame of the current candidate speech run.
    speech_since: Option<u64>,
    /// First frame of the current candidate silence run inside a segment.
    silence_since: Option<u64>,
}

impl SegmentTracker {
    fn new(min_speech_ms: u64, min_silence_ms: u64) -> Self {
        Self {
            min_speech_ms,
            min_silence_ms,
            segment_start: None,
            speech_since: None,
            silence_since: None,
        }
    }

    /// Advance by one frame decision covering `[at_ms, at_ms + frame_ms)`.
    fn advance(
        &mut self,
        is_speech: bool,
        at_ms: u64,
        frame_ms: u64,
        events: &mut Vec<SegmentEvent>,
    ) {
        let end_ms = at_ms + frame_ms;

        match (self.segment_start, is_speech) {
            (None, true) => {
                let since = *self.speech_since.get_or_insert(at_ms);
                if end_ms - since >= self.min_speech_ms {
                    self.segment_start = Some(since);
                    self.speech_since = None;
                    events.push(SegmentEvent::SpeechStart { start_ms: since });
                }
            }
            (None, false) => {
                self.speech_since = None;
            }
            (Some(start), false) => {
                let since = *self.silence_since.get_or_insert(at_ms);
                if end_ms - since >= self.min_silence_ms {
                    events.push(SegmentEvent::SpeechEnd {
                        start_ms: start,
                        duration_ms: since - start,
                    });
                    self.segment_start = None;
                    self.silence_since = None;
                }
            }
            (Some(_), true) => {
                self.silence_since = None;
            }
        }
    }

    /// Close any open segment at end-of-stream.
    fn finish(&mut self, at_ms: u64, events: &mut Vec<SegmentEvent>) {
        if let Some(start) = self.segment_start.take() {
            let end = self.silence_since.take().unwrap_or(at_ms);
            events.push(SegmentEvent::SpeechEnd {
                start_ms: start,
                duration_ms: end - start,
            });
        }
        self.speech_since = None;
    }
}

/// Streaming adapter that feeds a [`Detector`] from arbitrary chunks and
/// reports debounced speech segments.
pub struct SpeechSegmenter {
    detector: Detector,
    policy: SegmenterPolicy,
    tracker: SegmentTracker,
    frame_len: usize,
    frame_ms: u64,
    buffer: Vec<i16>,
    clock_ms: u64,
}

impl SpeechSegmenter {
    pub fn new(config: Config, policy: SegmenterPolicy) -> Self {
        let frame_len = config.sample_rate.samples_per_frame(policy.frame_duration);
        Self {
            detector: Detector::new(config),
            policy,
            tracker: SegmentTracker::new(policy.min_speech_ms as u64, policy.min_silence_ms as u64),
            frame_len,
            frame_ms: policy.frame_duration.ms() as u64,
            buffer: Vec::with_capacity(frame_len * 2),
            clock_ms: 0,
        }
    }

    /// The policy this segmenter was created with.
    pub fn policy(&self) -> SegmenterPolicy {
        self.policy
    }

    /// Milliseconds of audio consumed in whole frames so far.
    pub fn position_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Push a chunk of samples, appending any resulting events.
    ///
    /// Chunks may be any length; leftover samples shorter than one frame
    /// stay buffered for the next call.
    pub fn push(&mut self, samples: &[i16], events: &mut Vec<SegmentEvent>) -> Result<()> {
        self.buffer.extend_from_slice(samples);

        let mut offset = 0;
        while self.buffer.len() - offset >= self.frame_len {
            let frame = &self.buffer[offset..offset + self.frame_len];
            let is_speech = self.detector.process(frame)?;

            self.tracker
                .advance(is_speech, self.clock_ms, self.frame_ms, events);

            self.clock_ms += self.frame_ms;
            offset += self.frame_len;
        }
        self.buffer.drain(..offset);

        if !events.is_empty() {
            debug!(events = events.len(), position_ms = self.clock_ms, "segments updated");
        }
        Ok(())
    }

    /// Signal end-of-stream: closes any open segment.
    ///
    /// A trailing partial frame is discarded; the detector never sees
    /// audio it cannot classify whole.
    pub fn finish(&mut self, events: &mut Vec<SegmentEvent>) {
        self.buffer.clear();
        self.tracker.finish(self.clock_ms, events);
    }

    /// Drop all buffered audio, adaptive state, and the stream clock,
    /// keeping the configuration and policy.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.tracker = SegmentTracker::new(
            self.policy.min_speech_ms as u64,
            self.policy.min_silence_ms as u64,
        );
        self.buffer.clear();
        self.clock_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SegmentTracker {
        SegmentTracker::new(90, 60)
    }

    fn drive(tracker: &mut SegmentTracker, decisions: &[bool]) -> Vec<SegmentEvent> {
        let mut events = Vec::new();
        for (i, &d) in decisions.iter().enumerate() {
            tracker.advance(d, i as u64 * 30, 30, &mut events);
        }
        events
    }

    #[test]
    fn short_blips_are_debounced_away() {
        let mut t = tracker();
        // Two isolated 30 ms speech frames never reach the 90 ms gate.
        let events = drive(&mut t, &[false, true, false, false, true, false, false]);
        assert!(events.is_empty());
    }

    #[test]
    fn sustained_speech_opens_a_segment_at_its_onset() {
        let mut t = tracker();
        let events = drive(&mut t, &[false, false, true, true, true]);
        assert_eq!(events, vec![SegmentEvent::SpeechStart { start_ms: 60 }]);
    }

    #[test]
    fn sustained_silence_closes_with_the_speech_duration() {
        let mut t = tracker();
        let events = drive(
            &mut t,
            &[true, true, true, true, false, false, true, true, true],
        );
        // Segment opens at 0 (after 90 ms of speech, backdated to onset),
        // closes after 60 ms of silence starting at 120 ms, then a second
        // sustained run opens a new segment at its own onset.
        assert_eq!(
            events,
            vec![
                SegmentEvent::SpeechStart { start_ms: 0 },
                SegmentEvent::SpeechEnd {
                    start_ms: 0,
                    duration_ms: 120
                },
                SegmentEvent::SpeechStart { start_ms: 180 },
            ]
        );
    }

    #[test]
    fn silence_blips_inside_speech_do_not_close() {
        let mut t = tracker();
        let events = drive(
            &mut t,
            &[true, true, true, false, true, true, false, true],
        );
        assert_eq!(events, vec![SegmentEvent::SpeechStart { start_ms: 0 }]);
    }

    #[test]
    fn finish_closes_an_open_segment() {
        let mut t = tracker();
        let mut events = drive(&mut t, &[true, true, true, true]);
        t.finish(120, &mut events);
        assert_eq!(
            events,
            vec![
                SegmentEvent::SpeechStart { start_ms: 0 },
                SegmentEvent::SpeechEnd {
                    start_ms: 0,
                    duration_ms: 120
                },
            ]
        );
    }

    #[test]
    fn segmenter_emits_nothing_on_silence() {
        let config = Config::default();
        let mut segmenter = SpeechSegmenter::new(config, SegmenterPolicy::default());

        let mut events = Vec::new();
        let silence = vec![0i16; 16_000]; // one second at 16 kHz
        segmenter.push(&silence, &mut events).unwrap();
        segmenter.finish(&mut events);
        assert!(events.is_empty());
        // 1000 ms arrived, 990 ms fit into whole 30 ms frames.
        assert_eq!(segmenter.position_ms(), 990);
    }

    #[test]
    fn odd_chunk_sizes_accumulate_into_frames() {
        let config = Config::default();
        let mut segmenter = SpeechSegmenter::new(config, SegmenterPolicy::default());

        let mut events = Vec::new();
        for _ in 0..100 {
            segmenter.push(&[0i16; 77], &mut events).unwrap();
        }
        // 7700 samples = 16 whole 480-sample frames and change.
        assert_eq!(segmenter.position_ms(), 480);
    }
}
