//! Two-class adaptive Gaussian mixture classifier.
//!
//! Each of the six band features is modeled by two Gaussians per class
//! (speech and noise). Scoring produces per-band log likelihood ratios and
//! a spectrum-weighted global sum; adaptation nudges means and standard
//! deviations toward the current frame with exponential decay, keeps the
//! two classes from collapsing onto each other, and corrects the noise
//! model toward the tracked noise floor.
//!
//! Scoring is pure; all mutation happens in [`GmmClassifier::adapt`], which
//! the detector calls with the frame's *raw* decision (pre-hangover).

use crate::filterbank::Features;
use crate::fixed;
use crate::gmm::gaussian_probability;
use crate::minimum::MinimumTracker;
use crate::model::{
    self, BACK_ETA_Q8, MAX_SPEECH_MEAN_START, MAXIMUM_NOISE, MAXIMUM_SPEECH, MIN_STD,
    MINIMUM_DIFFERENCE, MINIMUM_MEAN, NOISE_UPDATE_Q15, NUM_BANDS, NUM_GAUSSIANS,
    SPECTRUM_WEIGHT, SPEECH_UPDATE_Q15, TABLE_SIZE,
};

/// Everything `score` learns about one frame.
///
/// Besides the likelihood ratios the decision core consumes, this carries
/// the per-component posteriors and gradient terms that `adapt` needs, so
/// the Gaussians are evaluated exactly once per frame.
#[derive(Debug, Clone, Default)]
pub(crate) struct Score {
    /// Per-band log likelihood ratio (log2 speech/noise), integer bits.
    pub(crate) ratios: [i16; NUM_BANDS],
    /// Spectrum-weighted sum of the per-band ratios.
    pub(crate) weighted_sum: i32,
    /// Per-component `(x - m) / s^2` under the noise class, Q11.
    pub(crate) delta_noise: [i16; TABLE_SIZE],
    /// Per-component `(x - m) / s^2` under the speech class, Q11.
    pub(crate) delta_speech: [i16; TABLE_SIZE],
    /// Per-component posterior within the noise class, Q14.
    pub(crate) posterior_noise: [i16; TABLE_SIZE],
    /// Per-component posterior within the speech class, Q14.
    pub(crate) posterior_speech: [i16; TABLE_SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GmmClassifier {
    noise_means: [i16; TABLE_SIZE],
    speech_means: [i16; TABLE_SIZE],
    noise_stds: [i16; TABLE_SIZE],
    speech_stds: [i16; TABLE_SIZE],
    minimum: MinimumTracker,
    /// Frames that actually carried signal and adapted the model.
    frame_count: u32,
}

impl GmmClassifier {
    /// A classifier initialized from the built-in model tables.
    ///
    /// Starting from tuned parameters instead of a flat prior avoids a
    /// cold-start burst of misclassifications while the mixtures settle.
    pub(crate) fn new() -> Self {
        Self {
            noise_means: model::NOISE_MEANS,
            speech_means: model::SPEECH_MEANS,
            noise_stds: model::NOISE_STDS,
            speech_stds: model::SPEECH_STDS,
            minimum: MinimumTracker::new(),
            frame_count: 0,
        }
    }

    /// Score one feature vector against both mixtures.
    pub(crate) fn score(&self, features: &Features) -> Score {
        let mut score = Score {
            ratios: [0; NUM_BANDS],
            weighted_sum: 0,
            delta_noise: [0; TABLE_SIZE],
            delta_speech: [0; TABLE_SIZE],
            posterior_noise: [0; TABLE_SIZE],
            posterior_speech: [0; TABLE_SIZE],
        };

        for band in 0..NUM_BANDS {
            let feature = features.bands[band];

            let mut noise_prob = [0i32; NUM_GAUSSIANS];
            let mut speech_prob = [0i32; NUM_GAUSSIANS];
            let mut noise_total: i32 = 0;
            let mut speech_total: i32 = 0;

            for k in 0..NUM_GAUSSIANS {
                let g = band + k * NUM_BANDS;

                // Weighted likelihood under each class, Q27 = Q7 * Q20.
                let p = gaussian_probability(
                    feature,
                    self.noise_means[g],
                    self.noise_stds[g],
                    &mut score.delta_noise[g],
                );
                noise_prob[k] = model::NOISE_WEIGHTS[g] as i32 * p;
                noise_total += noise_prob[k];

                let p = gaussian_probability(
                    feature,
                    self.speech_means[g],
                    self.speech_stds[g],
                    &mut score.delta_speech[g],
                );
                speech_prob[k] = model::SPEECH_WEIGHTS[g] as i32 * p;
                speech_total += speech_prob[k];
            }

            // log2(speech/noise) approximated by the difference in
            // normalization shifts; the dropped fractional parts are
            // independent and cancel on average.
            let shifts_noise = if noise_total == 0 {
                31
            } else {
                fixed::norm_i32(noise_total)
            };
            let shifts_speech = if speech_total == 0 {
                31
            } else {
                fixed::norm_i32(speech_total)
            };
            let ratio = shifts_noise - shifts_speech;

            score.ratios[band] = ratio;
            score.weighted_sum += ratio as i32 * SPECTRUM_WEIGHT[band] as i32;

            // Posterior of the first component within each class, Q14.
            // Used as the per-component responsibility when adapting.
            let noise_norm = (noise_total >> 12) as i16;
            if noise_norm > 0 {
                let scaled = ((noise_prob[0] as u32 & 0xFFFF_F000) << 2) as i32;
                score.posterior_noise[band] = fixed::div_i32_i16(scaled, noise_norm);
                score.posterior_noise[band + NUM_BANDS] = 16_384 - score.posterior_noise[band];
            } else {
                // Vanishing noise likelihood: attribute the frame to the
                // first component outright.
                score.posterior_noise[band] = 16_384;
            }

            let speech_norm = (speech_total >> 12) as i16;
            if speech_norm > 0 {
                let scaled = ((speech_prob[0] as u32 & 0xFFFF_F000) << 2) as i32;
                score.posterior_speech[band] = fixed::div_i32_i16(scaled, speech_norm);
                score.posterior_speech[band + NUM_BANDS] = 16_384 - score.posterior_speech[band];
            }
        }

        score
    }

    /// Adapt the mixtures toward `features`, attributing the frame to the
    /// class chosen by the raw (pre-hangover) decision.
    pub(crate) fn adapt(&mut self, features: &Features, score: &Score, is_speech: bool) {
        let mut speech_ceiling = MAX_SPEECH_MEAN_START;

        for band in 0..NUM_BANDS {
            let feature = features.bands[band];

            // Quietest recent value in this band, Q4; the anchor for the
            // long-term noise floor correction.
            let floor = self.minimum.track(feature, band, self.frame_count);

            let noise_weighted = weighted_mean(&mut self.noise_means, band, 0, &model::NOISE_WEIGHTS);
            let noise_mean_q8 = (noise_weighted >> 6) as i16;

            for k in 0..NUM_GAUSSIANS {
                let g = band + k * NUM_BANDS;

                let noise_mean = self.noise_means[g];
                let speech_mean = self.speech_means[g];

                // Noise mean: gradient step only on non-speech frames.
                let mut updated = noise_mean;
                if !is_speech {
                    // (Q14 * Q11) >> 11 = Q14, then Q14 * Q15 >> 22 = Q7.
                    let step =
                        (score.posterior_noise[g] as i32 * score.delta_noise[g] as i32) >> 11;
                    updated = noise_mean
                        .saturating_add(((step * NOISE_UPDATE_Q15 as i32) >> 22) as i16);
                }

                // Long-term correction toward the tracked floor, Q8 terms.
                let floor_pull = ((floor as i32) << 4) - noise_mean_q8 as i32;
                let mut corrected = updated
                    .saturating_add(fixed::saturate_i16((floor_pull * BACK_ETA_Q8 as i32) >> 9));

                corrected = corrected.clamp(
                    MINIMUM_MEAN[k],
                    ((72 + k as i32 - band as i32) << 7) as i16,
                );
                self.noise_means[g] = corrected;

                if is_speech {
                    // Speech mean: gradient step with rounding.
                    let step =
                        (score.posterior_speech[g] as i32 * score.delta_speech[g] as i32) >> 11;
                    let step_q8 = ((step * SPEECH_UPDATE_Q15 as i32) >> 21) as i16;
                    let mut mean = speech_mean.saturating_add((step_q8 + 1) >> 1);
                    mean = mean.min(speech_ceiling + 640);
                    self.speech_means[g] = mean;

                    // 0.1 learning rate in the divisor; a further /4 is
                    // folded into the final shift.
                    self.speech_stds[g] = adapt_std(StdUpdate {
                        std: self.speech_stds[g],
                        feature,
                        mean: speech_mean,
                        delta: score.delta_speech[g],
                        responsibility: score.posterior_speech[g] as i32 >> 2,
                        pre_shift: 4,
                        denom_scale: 10,
                        post_shift: 8,
                        rounding: 128,
                    });
                } else {
                    self.noise_stds[g] = adapt_std(StdUpdate {
                        std: self.noise_stds[g],
                        feature,
                        mean: noise_mean,
                        delta: score.delta_noise[g],
                        responsibility: (score.posterior_noise[g] as i32 + 2) >> 2,
                        pre_shift: 14,
                        denom_scale: 1,
                        post_shift: 6,
                        rounding: 32,
                    });
                }
            }

            // Keep the class means separated: if the weighted means get too
            // close, push speech up (fast) and noise down (slow).
            let mut noise_weighted =
                weighted_mean(&mut self.noise_means, band, 0, &model::NOISE_WEIGHTS);
            let mut speech_weighted =
                weighted_mean(&mut self.speech_means, band, 0, &model::SPEECH_WEIGHTS);

            let separation = ((speech_weighted >> 9) - (noise_weighted >> 9)) as i16;
            if separation < MINIMUM_DIFFERENCE[band] {
                let shortfall = MINIMUM_DIFFERENCE[band] - separation;

                // ~0.8 of the shortfall onto speech, ~0.2 off noise, Q7.
                let speech_push = ((13 * shortfall as i32) >> 2) as i16;
                let noise_push = ((3 * shortfall as i32) >> 2) as i16;

                speech_weighted =
                    weighted_mean(&mut self.speech_means, band, speech_push, &model::SPEECH_WEIGHTS);
                noise_weighted =
                    weighted_mean(&mut self.noise_means, band, -noise_push, &model::NOISE_WEIGHTS);
            }

            // Absolute ceilings per band.
            speech_ceiling = MAXIMUM_SPEECH[band];
            let speech_q7 = (speech_weighted >> 7) as i16;
            if speech_q7 > speech_ceiling {
                let excess = speech_q7 - speech_ceiling;
                for k in 0..NUM_GAUSSIANS {
                    self.speech_means[band + k * NUM_BANDS] -= excess;
                }
            }

            let noise_q7 = (noise_weighted >> 7) as i16;
            if noise_q7 > MAXIMUM_NOISE[band] {
                let excess = noise_q7 - MAXIMUM_NOISE[band];
                for k in 0..NUM_GAUSSIANS {
                    self.noise_means[band + k * NUM_BANDS] -= excess;
                }
            }
        }

        self.frame_count += 1;
    }
}

/// Weighted mean of one band's components, Q14, optionally shifting every
/// component by `offset` (Q7) first.
fn weighted_mean(
    means: &mut [i16; TABLE_SIZE],
    band: usize,
    offset: i16,
    weights: &[i16; TABLE_SIZE],
) -> i32 {
    let mut acc: i32 = 0;
    for k in 0..NUM_GAUSSIANS {
        let g = band + k * NUM_BANDS;
        means[g] = means[g].saturating_add(offset);
        acc += means[g] as i32 * weights[g] as i32;
    }
    acc
}

/// Division preserving the numerator's sign, saturated to 16 bits.
fn signed_div(numerator: i32, denominator: i16) -> i16 {
    if numerator > 0 {
        fixed::div_i32_i16(numerator, denominator)
    } else {
        -fixed::div_i32_i16(-numerator, denominator)
    }
}

/// Inputs to one standard deviation update.
struct StdUpdate {
    std: i16,
    feature: i16,
    mean: i16,
    /// Gradient term `(x - m) / s^2` from scoring, Q11.
    delta: i16,
    /// Component responsibility, folded down from Q14.
    responsibility: i32,
    /// Shift applied to the Q24 weighted gradient before dividing.
    pre_shift: u32,
    /// Extra factor on the divisor (slows the speech update by 10x).
    denom_scale: i32,
    /// Shift turning the quotient into a Q7 step.
    post_shift: u32,
    /// Rounding term added before the final shift.
    rounding: i32,
}

/// Shared shape of the two standard deviation updates.
///
/// Forms the variance gradient `responsibility * (delta * (x - m) - 1)`,
/// converts it into a Q7 step, and floors the result at `MIN_STD`.
fn adapt_std(update: StdUpdate) -> i16 {
    // x - m in Q4 (mean folded down from Q7 with rounding).
    let centered = update.feature as i32 - ((update.mean as i32 + 4) >> 3);

    // delta * (x - m) - 1 in Q12.
    let grad = ((update.delta as i32 * centered) >> 3) - 4_096;

    // Responsibility-weighted gradient, Q24; widened so a saturated delta
    // cannot overflow the product.
    let weighted = update.responsibility as i64 * grad as i64;
    let shifted = (weighted >> update.pre_shift).clamp(i32::MIN as i64, i32::MAX as i64) as i32;

    let denominator = fixed::saturate_i16((update.std as i32).saturating_mul(update.denom_scale));
    let step = signed_div(shifted, denominator) as i32 + update.rounding;

    let adapted = update.std.saturating_add((step >> update.post_shift) as i16);
    adapted.max(MIN_STD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filterbank::Features;

    fn features(bands: [i16; NUM_BANDS]) -> Features {
        Features {
            bands,
            total_energy: MIN_ENERGY_PLUS,
        }
    }

    const MIN_ENERGY_PLUS: i16 = model::MIN_ENERGY + 1;

    /// Features sitting exactly on the initial noise means (Q7 -> Q4).
    fn noise_like() -> Features {
        let mut bands = [0i16; NUM_BANDS];
        for band in 0..NUM_BANDS {
            bands[band] = model::NOISE_MEANS[band] >> 3;
        }
        features(bands)
    }

    /// Features sitting exactly on the initial speech means (Q7 -> Q4).
    fn speech_like() -> Features {
        let mut bands = [0i16; NUM_BANDS];
        for band in 0..NUM_BANDS {
            bands[band] = model::SPEECH_MEANS[band] >> 3;
        }
        features(bands)
    }

    #[test]
    fn noise_like_features_score_toward_noise() {
        let classifier = GmmClassifier::new();
        let score = classifier.score(&noise_like());
        assert!(
            score.weighted_sum <= 0,
            "weighted sum {} should favor noise",
            score.weighted_sum
        );
    }

    #[test]
    fn speech_like_features_score_toward_speech() {
        let classifier = GmmClassifier::new();
        let score = classifier.score(&speech_like());
        assert!(
            score.weighted_sum > 0,
            "weighted sum {} should favor speech",
            score.weighted_sum
        );
    }

    #[test]
    fn scoring_is_pure() {
        let classifier = GmmClassifier::new();
        let first = classifier.score(&speech_like());
        let second = classifier.score(&speech_like());
        assert_eq!(first.ratios, second.ratios);
        assert_eq!(first.weighted_sum, second.weighted_sum);
    }

    #[test]
    fn posteriors_within_a_class_sum_to_one() {
        let classifier = GmmClassifier::new();
        let score = classifier.score(&noise_like());
        for band in 0..NUM_BANDS {
            let total =
                score.posterior_noise[band] as i32 + score.posterior_noise[band + NUM_BANDS] as i32;
            assert_eq!(total, 16_384, "band {band}");
        }
    }

    #[test]
    fn adaptation_moves_the_attributed_class_only() {
        let mut classifier = GmmClassifier::new();
        let feats = speech_like();
        let score = classifier.score(&feats);

        let noise_before = classifier.noise_stds;
        let speech_before = classifier.speech_stds;

        classifier.adapt(&feats, &score, true);

        // Speech stds moved; noise stds were left alone by the speech
        // branch (noise means still get the floor correction).
        assert_eq!(classifier.noise_stds, noise_before);
        assert_ne!(classifier.speech_stds, speech_before);
    }

    #[test]
    fn stds_never_drop_below_the_floor() {
        let mut classifier = GmmClassifier::new();
        let feats = noise_like();
        for _ in 0..500 {
            let score = classifier.score(&feats);
            classifier.adapt(&feats, &score, false);
        }
        for g in 0..TABLE_SIZE {
            assert!(classifier.noise_stds[g] >= MIN_STD, "component {g}");
            assert!(classifier.speech_stds[g] >= MIN_STD, "component {g}");
        }
    }

    #[test]
    fn classes_stay_separated_under_sustained_noise() {
        let mut classifier = GmmClassifier::new();
        let feats = noise_like();
        for _ in 0..300 {
            let score = classifier.score(&feats);
            classifier.adapt(&feats, &score, false);
        }
        for band in 0..NUM_BANDS {
            let noise =
                weighted_mean(&mut classifier.noise_means, band, 0, &model::NOISE_WEIGHTS);
            let speech =
                weighted_mean(&mut classifier.speech_means, band, 0, &model::SPEECH_WEIGHTS);
            // Truncation in the separation push can undershoot the target
            // by a couple of Q5 steps; what matters is no collapse.
            let separation = ((speech >> 9) - (noise >> 9)) as i16;
            assert!(
                separation >= MINIMUM_DIFFERENCE[band] - 4,
                "band {band}: separation {separation}"
            );
        }
    }

    #[test]
    fn fresh_classifiers_are_bit_identical() {
        assert_eq!(GmmClassifier::new(), GmmClassifier::new());
    }
}
