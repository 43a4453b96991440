//! Polyphase 3:2 fractional decimation.

use crate::fixed;

/// Number of taps in each polyphase filter.
const TAPS: usize = 8;

/// Interpolation coefficients for the two output phases, Q15.
///
/// The rows are mirror images: together they resample three input samples
/// into two with unity passband gain.
const PHASE_COEFS: [[i32; TAPS]; 2] = [
    [778, -2_050, 1_087, 23_285, 12_903, -3_783, 441, 222],
    [222, 441, -3_783, 12_903, 23_285, 1_087, -2_050, 778],
];

/// Stateful fractional decimator producing two output samples per three
/// inputs (e.g. 24 kHz to 16 kHz).
///
/// Keeps an eight-sample FIR history plus up to two unconsumed input
/// samples between calls, so the output for a stream is the same no matter
/// how the calls are chunked.
#[derive(Debug, Clone)]
pub struct FractionalDecimator {
    /// FIR history plus any partial input group awaiting more samples.
    /// Length stays within `TAPS - 2 ..= TAPS` between calls.
    tail: Vec<i16>,
}

impl Default for FractionalDecimator {
    fn default() -> Self {
        Self::new()
    }
}

impl FractionalDecimator {
    pub fn new() -> Self {
        // Prime the delay line with silence, as if the stream had been
        // preceded by zeros.
        Self {
            tail: vec![0; TAPS],
        }
    }

    /// Clear filter memory back to the freshly-constructed state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Resample `input` at a 2/3 rate, appending to `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        let mut buf = std::mem::take(&mut self.tail);
        buf.extend_from_slice(input);

        // Each group consumes three samples and reads a nine-sample
        // window from its start (phase 1 is offset by one).
        let groups = if buf.len() > TAPS {
            (buf.len() - (TAPS - 2)) / 3
        } else {
            0
        };

        for group in 0..groups {
            let window = &buf[group * 3..];
            output.push(fir(&window[..TAPS], &PHASE_COEFS[0]));
            output.push(fir(&window[1..=TAPS], &PHASE_COEFS[1]));
        }

        buf.drain(..groups * 3);
        self.tail = buf;
    }
}

/// One Q15 FIR tap-sum with rounding, saturated to a 16-bit sample.
fn fir(window: &[i16], coefficients: &[i32; TAPS]) -> i16 {
    let mut acc: i64 = 1 << 14;
    for (sample, coefficient) in window.iter().zip(coefficients) {
        acc += *sample as i64 * *coefficient as i64;
    }
    fixed::saturate_i16((acc >> 15) as i32)
}
