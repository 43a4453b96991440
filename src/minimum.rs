//! Per-band minimum tracking over a sliding ~1 second window.
//!
//! The classifier corrects its noise means toward the quietest recent
//! feature values, which makes the noise model follow the real noise floor
//! instead of absorbing speech energy. This module keeps, per band, the 16
//! smallest feature values seen over the last 100 frames and reports a
//! median of the smallest few, smoothed asymmetrically (fast to fall,
//! slow to rise).

use crate::model::NUM_BANDS;

/// Values older than this many frames fall out of the window.
const MAX_AGE: i16 = 100;

/// Number of retained candidate minima per band.
const SLOTS: usize = 16;

/// Sentinel larger than any real Q4 feature value.
const EMPTY_VALUE: i16 = 10_000;

/// Smoothing factor when the median moves down, Q15 (0.2).
const SMOOTHING_DOWN_Q15: i32 = 6_553;

/// Smoothing factor when the median moves up, Q15 (0.99).
const SMOOTHING_UP_Q15: i32 = 32_439;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MinimumTracker {
    /// Ascending candidate minima per band.
    smallest: [[i16; SLOTS]; NUM_BANDS],
    /// Age in frames of each candidate.
    age: [[i16; SLOTS]; NUM_BANDS],
    /// Smoothed median per band, Q4.
    smoothed: [i16; NUM_BANDS],
}

impl MinimumTracker {
    pub(crate) fn new() -> Self {
        Self {
            smallest: [[EMPTY_VALUE; SLOTS]; NUM_BANDS],
            age: [[0; SLOTS]; NUM_BANDS],
            smoothed: [1_600; NUM_BANDS],
        }
    }

    /// Feed one feature value for `band` and get the smoothed recent
    /// minimum back, Q4. `frame_count` is the number of adapted frames so
    /// far; it gates the median until enough history exists.
    pub(crate) fn track(&mut self, feature: i16, band: usize, frame_count: u32) -> i16 {
        let smallest = &mut self.smallest[band];
        let age = &mut self.age[band];

        // Age every candidate; evict the ones that fell out of the window,
        // keeping the list sorted by shifting larger values down.
        for i in 0..SLOTS {
            if age[i] != MAX_AGE {
                age[i] += 1;
            } else {
                for j in i..SLOTS - 1 {
                    smallest[j] = smallest[j + 1];
                    age[j] = age[j + 1];
                }
                age[SLOTS - 1] = MAX_AGE + 1;
                smallest[SLOTS - 1] = EMPTY_VALUE;
            }
        }

        // Insert the new value if it beats any retained candidate.
        if let Some(position) = smallest.iter().position(|&v| feature < v) {
            for i in (position + 1..SLOTS).rev() {
                smallest[i] = smallest[i - 1];
                age[i] = age[i - 1];
            }
            smallest[position] = feature;
            age[position] = 1;
        }

        // Median of the smallest candidates, once enough frames exist.
        let current_median = if frame_count > 2 {
            smallest[2]
        } else if frame_count > 0 {
            smallest[0]
        } else {
            1_600
        };

        // Asymmetric smoothing: drop quickly toward a lower noise floor,
        // climb slowly when the floor rises.
        let alpha = if frame_count == 0 {
            0
        } else if current_median < self.smoothed[band] {
            SMOOTHING_DOWN_Q15
        } else {
            SMOOTHING_UP_Q15
        };

        let mut acc = (alpha + 1) * self.smoothed[band] as i32;
        acc += (i16::MAX as i32 - alpha) * current_median as i32;
        acc += 16_384;
        self.smoothed[band] = (acc >> 15) as i16;

        self.smoothed[band]
    }
}
