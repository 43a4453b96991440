//! Built-in model parameters and decision thresholds.
//!
//! These are tuned constants, not derived quantities: the initial Gaussian
//! mixtures, the adaptation rates, the drift limits, and the per-mode
//! decision thresholds were all fitted offline against large labeled
//! corpora. They are carried here as a plain data table; the classifier's
//! behavior is calibrated against these exact values.
//!
//! Flattened mixture tables are indexed `band + component * NUM_BANDS`,
//! i.e. component-major blocks of six bands each.

use crate::config::Aggressiveness;

/// Number of frequency sub-bands in the feature vector.
pub(crate) const NUM_BANDS: usize = 6;

/// Number of Gaussian components per class and band.
pub(crate) const NUM_GAUSSIANS: usize = 2;

/// Size of one flattened per-class mixture table.
pub(crate) const TABLE_SIZE: usize = NUM_BANDS * NUM_GAUSSIANS;

/// Frames with total energy at or below this are treated as silence: they
/// get a NON_SPEECH score and skip model adaptation entirely.
pub(crate) const MIN_ENERGY: i16 = 10;

/// Floor for every standard deviation, Q7. Keeps likelihoods finite when a
/// mixture collapses onto a very stable signal.
pub(crate) const MIN_STD: i16 = 384;

/// Consecutive raw speech frames before the long hangover applies.
pub(crate) const MAX_SPEECH_FRAMES: i16 = 6;

/// Upper bound used while nudging speech means upward, Q7.
pub(crate) const MAX_SPEECH_MEAN_START: i16 = 12_800;

/// Per-band weights applied to the local log likelihood ratios when
/// forming the global decision statistic.
pub(crate) const SPECTRUM_WEIGHT: [i16; NUM_BANDS] = [6, 8, 10, 12, 14, 16];

/// Noise mean adaptation rate, Q15.
pub(crate) const NOISE_UPDATE_Q15: i16 = 655;

/// Speech mean adaptation rate, Q15.
pub(crate) const SPEECH_UPDATE_Q15: i16 = 6_554;

/// Long-term noise floor correction rate, Q8.
pub(crate) const BACK_ETA_Q8: i16 = 154;

/// Minimum separation between the class means per band, Q5.
pub(crate) const MINIMUM_DIFFERENCE: [i16; NUM_BANDS] = [544, 544, 576, 576, 576, 576];

/// Ceiling on the weighted speech mean per band, Q7.
pub(crate) const MAXIMUM_SPEECH: [i16; NUM_BANDS] =
    [11_392, 11_392, 11_520, 11_520, 11_520, 11_520];

/// Ceiling on the weighted noise mean per band, Q7.
pub(crate) const MAXIMUM_NOISE: [i16; NUM_BANDS] = [9_216, 9_088, 8_960, 8_832, 8_704, 8_576];

/// Floor on the noise means, per component, Q7.
pub(crate) const MINIMUM_MEAN: [i16; NUM_GAUSSIANS] = [640, 768];

/// Mixture weights for the noise class, Q7.
pub(crate) const NOISE_WEIGHTS: [i16; TABLE_SIZE] =
    [34, 62, 72, 66, 53, 25, 94, 66, 56, 62, 75, 103];

/// Mixture weights for the speech class, Q7.
pub(crate) const SPEECH_WEIGHTS: [i16; TABLE_SIZE] =
    [48, 82, 45, 87, 50, 47, 80, 46, 83, 41, 78, 81];

/// Initial noise means, Q7.
pub(crate) const NOISE_MEANS: [i16; TABLE_SIZE] = [
    6_738, 4_892, 7_065, 6_715, 6_771, 3_369, 7_646, 3_863, 7_820, 7_266, 5_020, 4_362,
];

/// Initial speech means, Q7.
pub(crate) const SPEECH_MEANS: [i16; TABLE_SIZE] = [
    8_306, 10_085, 10_078, 11_823, 11_843, 6_309, 9_473, 9_571, 10_879, 7_581, 8_180, 7_483,
];

/// Initial noise standard deviations, Q7.
pub(crate) const NOISE_STDS: [i16; TABLE_SIZE] = [
    378, 1_064, 493, 582, 688, 593, 474, 697, 475, 688, 421, 455,
];

/// Initial speech standard deviations, Q7.
pub(crate) const SPEECH_STDS: [i16; TABLE_SIZE] = [
    555, 505, 567, 524, 585, 1_231, 509, 828, 492, 1_540, 1_079, 850,
];

/// Decision thresholds and hangover lengths for one (mode, duration) pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Thresholds {
    /// A single band whose quadrupled log likelihood ratio exceeds this
    /// proposes SPEECH on its own.
    pub local: i16,
    /// The spectrum-weighted ratio sum must reach this for the global test.
    pub global: i16,
    /// Hangover applied after a short burst of raw speech frames.
    pub hangover_short: i16,
    /// Hangover applied after `MAX_SPEECH_FRAMES` consecutive raw speech
    /// frames.
    pub hangover_long: i16,
}

// Threshold rows are indexed by frame duration: [10 ms, 20 ms, 30 ms].
const LOCAL_THRESHOLDS: [[i16; 3]; 4] = [
    [24, 21, 24],
    [37, 32, 37],
    [82, 78, 82],
    [94, 94, 94],
];

const GLOBAL_THRESHOLDS: [[i16; 3]; 4] = [
    [57, 48, 57],
    [100, 80, 100],
    [285, 260, 285],
    [1_100, 1_050, 1_100],
];

const HANGOVER_SHORT: [[i16; 3]; 4] = [
    [8, 4, 3],
    [8, 4, 3],
    [6, 3, 2],
    [6, 3, 2],
];

const HANGOVER_LONG: [[i16; 3]; 4] = [
    [14, 7, 5],
    [14, 7, 5],
    [9, 5, 3],
    [9, 5, 3],
];

impl Thresholds {
    /// Look up the tuned thresholds for a mode and frame-duration index.
    pub(crate) fn for_mode(mode: Aggressiveness, duration_index: usize) -> Self {
        let row = mode.level() as usize;
        Self {
            local: LOCAL_THRESHOLDS[row][duration_index],
            global: GLOBAL_THRESHOLDS[row][duration_index],
            hangover_short: HANGOVER_SHORT[row][duration_index],
            hangover_long: HANGOVER_LONG[row][duration_index],
        }
    }
}
