//! All-pass half-band decimation by two.

use crate::fixed;

/// All-pass coefficients for the two polyphase branches, Q13 (0.64, 0.17).
const ALL_PASS_Q13: [i32; 2] = [5_243, 1_392];

/// Stateful 2:1 decimator built from a complementary all-pass pair.
///
/// Even input samples drive the upper branch, odd samples the lower; the
/// branch sums form the half-rate output. The two filter taps live across
/// calls, and a trailing unpaired sample is carried into the next call, so
/// chunking never changes the output:
///
/// feeding a stream in one call or in arbitrary slices produces
/// bit-identical results.
#[derive(Debug, Clone, Default)]
pub struct HalfbandDecimator {
    state_upper: i32,
    state_lower: i32,
    carry: Option<i16>,
}

impl HalfbandDecimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear filter memory back to the freshly-constructed state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decimate `input` by two, appending to `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        let mut pending = self.carry.take();
        let mut samples = input.iter().copied();

        loop {
            let even = match pending.take() {
                Some(sample) => sample,
                None => match samples.next() {
                    Some(sample) => sample,
                    None => break,
                },
            };
            let odd = match samples.next() {
                Some(sample) => sample,
                None => {
                    self.carry = Some(even);
                    break;
                }
            };

            // Upper all-pass branch, coefficients Q13, state Q0.
            let upper = fixed::saturate_i16(
                ((self.state_upper >> 1) + ((ALL_PASS_Q13[0] * even as i32) >> 14)) as i32,
            );
            self.state_upper = even as i32 - ((ALL_PASS_Q13[0] * upper as i32) >> 12);

            // Lower all-pass branch.
            let lower = fixed::saturate_i16(
                ((self.state_lower >> 1) + ((ALL_PASS_Q13[1] * odd as i32) >> 14)) as i32,
            );
            self.state_lower = odd as i32 - ((ALL_PASS_Q13[1] * lower as i32) >> 12);

            output.push(upper.saturating_add(lower));
        }
    }
}
