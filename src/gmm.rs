//! Single-Gaussian likelihood evaluation in fixed point.

use crate::fixed;

/// Largest exponent `(x - m)^2 / (2 s^2)` (Q10) that still produces a
/// non-zero probability. Anything beyond this underflows Q10 anyway.
const COMP_VAR: i32 = 22_005;

/// `log2(e)` in Q12, used to turn the natural exponent into a power of two.
const LOG2_EXP_Q12: i32 = 5_909;

/// Evaluate `(1 / s) * exp(-(x - m)^2 / (2 s^2))` for one Gaussian.
///
/// Arguments are `input` in Q4, `mean` and `std` in Q7; the return value is
/// in Q20. Also writes `delta = (x - m) / s^2` in Q11, which the caller
/// reuses as the gradient term when adapting the mixture.
///
/// `std` must be at least the model floor; the division helpers clamp on
/// anything pathological rather than raising.
pub(crate) fn gaussian_probability(input: i16, mean: i16, std: i16, delta: &mut i16) -> i32 {
    // 1 / s in Q10: (1 in Q17, plus half the denominator for rounding)
    // divided by the Q7 std.
    let inv_std = fixed::div_i32_i16(131_072 + (std as i32 >> 1), std);

    // 1 / s^2 in Q14, via the Q8 square of the Q10 reciprocal.
    let inv_std_q8 = inv_std as i32 >> 2;
    let inv_std2 = (inv_std_q8 * inv_std_q8) >> 2;

    // x - m in Q7.
    let diff = ((input as i32) << 3) - mean as i32;

    // delta = (x - m) / s^2 in Q11: (Q14 * Q7) >> 10.
    let delta32 = (inv_std2 * diff) >> 10;
    *delta = fixed::saturate_i16(delta32);

    // Exponent (x - m)^2 / (2 s^2) in Q10: (Q11 * Q7) >> 8, with the
    // division by two folded into one extra shift.
    let exponent = (delta32 * diff) >> 9;

    let mut exp_value: i32 = 0;
    if exponent < COMP_VAR {
        // Convert to a base-2 exponent: t = log2(e) * exponent, Q10.
        let t = (LOG2_EXP_Q12 * exponent) >> 12;

        // exp2(-t) in Q10: the mantissa is 1.frac packed into bits 10..0,
        // shifted down by the integer part of t.
        let mantissa = 0x0400 | (-t & 0x03FF);
        let shift = ((t - 1) >> 10) + 1;
        exp_value = mantissa >> shift;
    }

    // (1 / s) * exp(...) in Q20 = Q10 * Q10.
    inv_std as i32 * exp_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_peaks_at_the_mean() {
        let mut delta = 0;
        // input Q4 chosen so input << 3 == mean exactly.
        let at_mean = gaussian_probability(800, 6_400, 512, &mut delta);
        assert_eq!(delta, 0);

        let mut delta_off = 0;
        let off_mean = gaussian_probability(830, 6_400, 512, &mut delta_off);
        assert!(at_mean > off_mean);
        assert!(delta_off > 0);
    }

    #[test]
    fn probability_at_mean_is_the_reciprocal_std() {
        let mut delta = 0;
        let p = gaussian_probability(800, 6_400, 512, &mut delta);
        // exp(0) == 1.0 in Q10 is 1024; the result is inv_std * 1024.
        let inv_std = (131_072 + (512 >> 1)) / 512;
        assert_eq!(p, inv_std * 1_024);
    }

    #[test]
    fn far_tails_underflow_to_zero() {
        let mut delta = 0;
        let p = gaussian_probability(2_000, 4_000, 384, &mut delta);
        assert_eq!(p, 0);
        // The gradient term is still reported for the adaptation step.
        assert!(delta != 0);
    }

    #[test]
    fn wider_gaussians_have_fatter_tails() {
        let mut d = 0;
        let narrow = gaussian_probability(900, 6_400, 400, &mut d);
        let wide = gaussian_probability(900, 6_400, 1_400, &mut d);
        assert!(wide > narrow);
    }

    #[test]
    fn delta_sign_tracks_the_side_of_the_mean() {
        let mut below = 0;
        gaussian_probability(700, 6_400, 512, &mut below);
        let mut above = 0;
        gaussian_probability(900, 6_400, 512, &mut above);
        assert!(below < 0);
        assert!(above > 0);
    }
}
