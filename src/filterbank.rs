//! Sub-band log-energy feature extraction.
//!
//! Each 8 kHz frame is split into six contiguous bands by a cascade of
//! all-pass half-band filters, each split halving the bandwidth and the
//! sample count:
//!
//! ```text
//! 0-4000 ─┬─ 2000-4000 ─┬─ 3000-4000   band 5
//!         │             └─ 2000-3000   band 4
//!         └─ 0-2000 ─┬─ 1000-2000      band 3
//!                    └─ 0-1000 ─┬─ 500-1000    band 2
//!                               └─ 0-500 ─┬─ 250-500   band 1
//!                                         └─ 80-250    band 0 (high-passed)
//! ```
//!
//! Per band we compute a log-energy feature in Q4 via the fixed-point
//! kernel. Everything here is integer arithmetic with persistent filter
//! delay lines, so a given (state, frame) pair always produces the same
//! features bit for bit.

use crate::fixed;
use crate::model::{MIN_ENERGY, NUM_BANDS};

/// Largest 8 kHz frame the filterbank accepts (30 ms).
pub(crate) const MAX_FRAME_LEN_8K: usize = 240;

/// All-pass split coefficients, upper and lower branch, Q15 (0.64, 0.17).
const ALL_PASS_Q15: [i32; 2] = [20_972, 5_571];

/// 80 Hz high-pass, zero and pole coefficients, Q14.
const HP_ZERO_Q14: [i32; 3] = [6_631, -13_262, 6_631];
const HP_POLE_Q14: [i32; 3] = [16_384, -7_756, 5_620];

/// `160 * log10(2)` in Q9: converts a base-2 log into dB in Q4.
const LOG_CONST_Q9: i64 = 24_660;

/// Integer part of `log2` for a value normalized to 15 bits: 14 in Q10.
const LOG_ENERGY_INT_PART_Q10: i64 = 14_336;

/// Per-band offsets compensating for the halving applied at each split,
/// Q4 dB.
const BAND_OFFSET_Q4: [i16; NUM_BANDS] = [368, 368, 272, 176, 176, 176];

/// Per-band feature vector plus the frame's coarse energy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Features {
    /// Log-energy per band, Q4.
    pub bands: [i16; NUM_BANDS],
    /// Saturating total-energy indicator; compared against `MIN_ENERGY`
    /// to skip scoring and adaptation on near-silent frames.
    pub total_energy: i16,
}

impl Features {
    pub(crate) fn has_signal(&self) -> bool {
        self.total_energy > MIN_ENERGY
    }
}

/// Filter state for the split cascade and the 80 Hz high-pass.
///
/// One instance per detector; the delay lines carry over between frames so
/// band edges stay continuous across frame boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FilterBank {
    upper_state: [i16; 5],
    lower_state: [i16; 5],
    hp_state: [i16; 4],
}

impl FilterBank {
    pub(crate) fn new() -> Self {
        Self {
            upper_state: [0; 5],
            lower_state: [0; 5],
            hp_state: [0; 4],
        }
    }

    /// Extract the six band features from an 8 kHz frame of 80, 160 or
    /// 240 samples. Callers guarantee the length; the detector validates
    /// frames before any state is touched.
    pub(crate) fn analyze(&mut self, frame: &[i16]) -> Features {
        debug_assert!(matches!(frame.len(), 80 | 160 | 240));

        let mut features = Features {
            bands: [0; NUM_BANDS],
            total_energy: 0,
        };

        let mut wide_a = [0i16; MAX_FRAME_LEN_8K / 2];
        let mut wide_b = [0i16; MAX_FRAME_LEN_8K / 2];
        let mut narrow_a = [0i16; MAX_FRAME_LEN_8K / 4];
        let mut narrow_b = [0i16; MAX_FRAME_LEN_8K / 4];

        // Split at 2000 Hz: upper half into wide_a, lower into wide_b.
        let half = frame.len() / 2;
        split(
            frame,
            &mut self.upper_state[0],
            &mut self.lower_state[0],
            &mut wide_a[..half],
            &mut wide_b[..half],
        );

        // Upper branch: split 2000-4000 at 3000 Hz.
        let quarter = half / 2;
        split(
            &wide_a[..half],
            &mut self.upper_state[1],
            &mut self.lower_state[1],
            &mut narrow_a[..quarter],
            &mut narrow_b[..quarter],
        );
        log_energy(
            &narrow_a[..quarter],
            BAND_OFFSET_Q4[5],
            &mut features.total_energy,
            &mut features.bands[5],
        );
        log_energy(
            &narrow_b[..quarter],
            BAND_OFFSET_Q4[4],
            &mut features.total_energy,
            &mut features.bands[4],
        );

        // Lower branch: split 0-2000 at 1000 Hz.
        split(
            &wide_b[..half],
            &mut self.upper_state[2],
            &mut self.lower_state[2],
            &mut narrow_a[..quarter],
            &mut narrow_b[..quarter],
        );
        log_energy(
            &narrow_a[..quarter],
            BAND_OFFSET_Q4[3],
            &mut features.total_energy,
            &mut features.bands[3],
        );

        // Split 0-1000 at 500 Hz.
        let eighth = quarter / 2;
        split(
            &narrow_b[..quarter],
            &mut self.upper_state[3],
            &mut self.lower_state[3],
            &mut wide_a[..eighth],
            &mut wide_b[..eighth],
        );
        log_energy(
            &wide_a[..eighth],
            BAND_OFFSET_Q4[2],
            &mut features.total_energy,
            &mut features.bands[2],
        );

        // Split 0-500 at 250 Hz.
        let sixteenth = eighth / 2;
        split(
            &wide_b[..eighth],
            &mut self.upper_state[4],
            &mut self.lower_state[4],
            &mut narrow_a[..sixteenth],
            &mut narrow_b[..sixteenth],
        );
        log_energy(
            &narrow_a[..sixteenth],
            BAND_OFFSET_Q4[1],
            &mut features.total_energy,
            &mut features.bands[1],
        );

        // Remove 0-80 Hz from the lowest band before measuring it.
        high_pass(&narrow_b[..sixteenth], &mut self.hp_state, &mut wide_a[..sixteenth]);
        log_energy(
            &wide_a[..sixteenth],
            BAND_OFFSET_Q4[0],
            &mut features.total_energy,
            &mut features.bands[0],
        );

        features
    }
}

/// One all-pass branch of a half-band split, decimating by two.
///
/// Reads every second sample of `input` starting at `offset`; the output
/// is in Q(-1) (half amplitude), which the band offsets compensate for.
fn all_pass_decimate(
    input: &[i16],
    offset: usize,
    coefficient: i32,
    state: &mut i16,
    output: &mut [i16],
) {
    let mut state32 = (*state as i64) << 16;

    for (n, out) in output.iter_mut().enumerate() {
        let sample = input[offset + 2 * n] as i64;
        let filtered = state32 + coefficient as i64 * sample;
        let value = fixed::saturate_i16((filtered >> 16) as i32);
        *out = value;
        state32 = (((sample << 14) - coefficient as i64 * value as i64) << 1).clamp(
            i32::MIN as i64,
            i32::MAX as i64,
        );
    }

    *state = (state32 >> 16) as i16;
}

/// Split `input` into high and low half-bands, each decimated by two.
fn split(
    input: &[i16],
    upper_state: &mut i16,
    lower_state: &mut i16,
    high_out: &mut [i16],
    low_out: &mut [i16],
) {
    all_pass_decimate(input, 0, ALL_PASS_Q15[0], upper_state, high_out);
    all_pass_decimate(input, 1, ALL_PASS_Q15[1], lower_state, low_out);

    // The sum and difference of the two all-pass branches form the
    // low-pass and high-pass halves.
    for (high, low) in high_out.iter_mut().zip(low_out.iter_mut()) {
        let branch_high = *high;
        *high = branch_high.saturating_sub(*low);
        *low = low.saturating_add(branch_high);
    }
}

/// Second-order 80 Hz high-pass, coefficients in Q14.
fn high_pass(input: &[i16], state: &mut [i16; 4], output: &mut [i16]) {
    for (n, out) in output.iter_mut().enumerate() {
        let sample = input[n];

        // All-zero section.
        let mut acc = HP_ZERO_Q14[0] as i64 * sample as i64;
        acc += HP_ZERO_Q14[1] as i64 * state[0] as i64;
        acc += HP_ZERO_Q14[2] as i64 * state[1] as i64;
        state[1] = state[0];
        state[0] = sample;

        // All-pole section.
        acc -= HP_POLE_Q14[1] as i64 * state[2] as i64;
        acc -= HP_POLE_Q14[2] as i64 * state[3] as i64;
        state[3] = state[2];
        state[2] = fixed::saturate_i16((acc >> 14) as i32);
        *out = state[2];
    }
}

/// Log-energy of one band in Q4, offset-compensated, and a saturating
/// update of the frame's total-energy indicator.
fn log_energy(band: &[i16], offset: i16, total_energy: &mut i16, feature: &mut i16) {
    let (energy_i32, band_shift) = fixed::energy(band);
    let mut energy = energy_i32 as u32;

    if energy == 0 {
        *feature = offset;
        return;
    }

    // Normalize the mantissa to 15 bits and fold the adjustment into the
    // total shift count, so `energy * 2^total_shift` is the true energy.
    let normalizing = 17 - fixed::norm_u32(energy) as i32;
    let total_shift = band_shift + normalizing;
    if normalizing < 0 {
        energy <<= -normalizing;
    } else {
        energy >>= normalizing;
    }

    // log2(energy) in Q10: 14 for the normalized leading bit plus the
    // fractional bits folded down from Q15.
    let log2_energy = LOG_ENERGY_INT_PART_Q10 + ((energy & 0x3FFF) >> 4) as i64;

    // 10*log10(true energy) in Q4.
    let db_q4 = ((LOG_CONST_Q9 * log2_energy) >> 19) + ((total_shift as i64 * LOG_CONST_Q9) >> 9);
    let db_q4 = db_q4.max(0);

    *feature = fixed::saturate_i16(db_q4 as i32).saturating_add(offset);

    // Accumulate a coarse energy indicator until it clears the silence
    // gate; exact magnitude past the gate is irrelevant.
    if *total_energy <= MIN_ENERGY {
        if total_shift >= 0 {
            // Normalized energy is above the gate by construction.
            *total_energy += MIN_ENERGY + 1;
        } else {
            let shift = (-total_shift).min(15) as u32;
            *total_energy = total_energy.saturating_add((energy >> shift) as i16);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, period: usize, amplitude: i16) -> Vec<i16> {
        // Square-ish tone; exact shape is irrelevant, determinism is not.
        (0..len)
            .map(|i| {
                if (i / period) % 2 == 0 {
                    amplitude
                } else {
                    -amplitude
                }
            })
            .collect()
    }

    #[test]
    fn silence_yields_offset_features_and_no_energy() {
        let mut bank = FilterBank::new();
        let features = bank.analyze(&[0; 240]);
        assert_eq!(features.bands, BAND_OFFSET_Q4);
        assert_eq!(features.total_energy, 0);
        assert!(!features.has_signal());
    }

    #[test]
    fn identical_state_and_frame_give_identical_features() {
        let frame = tone(240, 7, 2_500);
        let mut bank_a = FilterBank::new();
        let mut bank_b = FilterBank::new();
        for _ in 0..5 {
            let fa = bank_a.analyze(&frame);
            let fb = bank_b.analyze(&frame);
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn louder_input_raises_every_band() {
        let quiet_frame = tone(240, 9, 300);
        let loud_frame = tone(240, 9, 9_000);

        let quiet = FilterBank::new().analyze(&quiet_frame);
        let loud = FilterBank::new().analyze(&loud_frame);

        for band in 0..NUM_BANDS {
            assert!(
                loud.bands[band] > quiet.bands[band],
                "band {band}: {} <= {}",
                loud.bands[band],
                quiet.bands[band]
            );
        }
        assert!(loud.has_signal());
    }

    #[test]
    fn low_tone_lands_in_low_bands() {
        // ~100 Hz square wave at 8 kHz: period of 80 samples.
        let frame = tone(240, 40, 5_000);
        let features = FilterBank::new().analyze(&frame);

        let low = features.bands[0] as i32 - BAND_OFFSET_Q4[0] as i32;
        let high = features.bands[5] as i32 - BAND_OFFSET_Q4[5] as i32;
        assert!(
            low > high,
            "expected low-band dominance, got low={low} high={high}"
        );
    }

    #[test]
    fn all_frame_lengths_are_accepted() {
        let mut bank = FilterBank::new();
        for len in [80, 160, 240] {
            let frame = tone(len, 5, 1_000);
            let features = bank.analyze(&frame);
            assert!(features.has_signal());
        }
    }
}
