use std::f64::consts::PI;

use voicegate::config::{Aggressiveness, Config, SampleRate};
use voicegate::detector::Detector;
use voicegate::error::Error;

/// A harmonic-rich periodic signal with energy spread over the speech
/// bands, loud enough to sit in the speech model's range.
fn voice_like(len: usize, sample_rate: u32) -> Vec<i16> {
    let harmonics = [320.0, 720.0, 1_400.0, 2_300.0];
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let sum: f64 = harmonics
                .iter()
                .map(|f| (2.0 * PI * f * t).sin() * 2_500.0)
                .sum();
            sum as i16
        })
        .collect()
}

/// Deterministic pseudo-random samples for state-equality checks.
fn noise(len: usize, seed: &mut u32) -> Vec<i16> {
    (0..len)
        .map(|_| {
            *seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((*seed >> 16) & 0x3FFF) as i16 - 8_192
        })
        .collect()
}

fn quality_detector(rate: SampleRate) -> Detector {
    Detector::new(Config {
        sample_rate: rate,
        mode: Aggressiveness::Quality,
    })
}

#[test]
fn create_accepts_every_supported_pair() {
    for hz in [8_000, 16_000, 32_000, 48_000] {
        for level in 0..=3 {
            let config = Config::new(hz, level)
                .unwrap_or_else(|e| panic!("{hz} Hz level {level}: {e}"));
            let mut detector = Detector::new(config);
            let frame = vec![0i16; (hz as usize / 100) * 3];
            assert!(detector.process(&frame).is_ok());
        }
    }
}

#[test]
fn create_rejects_unsupported_pairs() {
    for hz in [0, 11_025, 22_050, 44_100, 96_000] {
        assert!(
            matches!(
                Config::new(hz, 0),
                Err(Error::InvalidConfiguration { .. })
            ),
            "{hz} Hz"
        );
    }
    for level in 4..=10 {
        assert!(
            matches!(
                Config::new(16_000, level),
                Err(Error::InvalidConfiguration { .. })
            ),
            "level {level}"
        );
    }
}

#[test]
fn silence_converges_to_non_speech_and_stays() {
    for rate in [SampleRate::Hz8000, SampleRate::Hz48000] {
        let mut detector = quality_detector(rate);
        let frame = vec![0i16; rate.hz() as usize * 3 / 100];
        for i in 0..100 {
            let speech = detector.process(&frame).unwrap();
            assert!(!speech, "{rate:?}: silence flagged as speech at frame {i}");
        }
    }
}

#[test]
fn voice_like_tone_is_detected_within_a_bounded_onset() {
    for rate in [SampleRate::Hz8000, SampleRate::Hz16000, SampleRate::Hz32000] {
        let mut detector = quality_detector(rate);
        let frame_len = rate.hz() as usize * 3 / 100;
        let signal = voice_like(frame_len * 40, rate.hz());

        let onset = signal
            .chunks(frame_len)
            .position(|frame| detector.process(frame).unwrap());

        let onset = onset.unwrap_or_else(|| panic!("{rate:?}: tone never detected"));
        assert!(onset <= 20, "{rate:?}: onset after {onset} frames");
    }
}

#[test]
fn hangover_holds_speech_after_the_signal_cuts() {
    let rate = SampleRate::Hz8000;
    let mut detector = quality_detector(rate);
    let frame_len = 240;
    let signal = voice_like(frame_len * 100, rate.hz());

    // Drive until the detector has reported speech for a sustained run,
    // so the hangover counter is fully armed.
    let mut consecutive = 0;
    for frame in signal.chunks(frame_len) {
        if detector.process(frame).unwrap() {
            consecutive += 1;
            if consecutive >= 10 {
                break;
            }
        } else {
            consecutive = 0;
        }
    }
    assert!(consecutive >= 10, "tone never produced sustained speech");

    // Zero frames carry no energy, so every raw decision is now
    // NON_SPEECH; only hangover can keep the report up.
    let zeros = vec![0i16; frame_len];
    let mut held = 0;
    loop {
        if detector.process(&zeros).unwrap() {
            held += 1;
            assert!(held <= 20, "hangover never drained");
        } else {
            break;
        }
    }
    assert!(held >= 1, "no hangover after sustained speech");

    // Once drained, silence stays silent.
    for _ in 0..50 {
        assert!(!detector.process(&zeros).unwrap());
    }
}

#[test]
fn reset_matches_a_freshly_created_detector() {
    let config = Config {
        sample_rate: SampleRate::Hz16000,
        mode: Aggressiveness::Aggressive,
    };
    let frame_len = 480;

    // Drift the adaptive state with a mix of noise and tone.
    let mut used = Detector::new(config);
    let mut seed = 0x2a2a_2a2a;
    for _ in 0..30 {
        used.process(&noise(frame_len, &mut seed)).unwrap();
    }
    for frame in voice_like(frame_len * 20, 16_000).chunks(frame_len) {
        used.process(frame).unwrap();
    }
    used.reset();

    // After reset, the decision sequence must be bit-identical to a
    // fresh detector's on any input.
    let mut fresh = Detector::new(config);
    let mut probe_seed = 0x1357_9bdf;
    for i in 0..60 {
        let frame = noise(frame_len, &mut probe_seed);
        assert_eq!(
            used.process(&frame).unwrap(),
            fresh.process(&frame).unwrap(),
            "diverged at frame {i}"
        );
    }
}

#[test]
fn wrong_frame_length_fails_and_leaves_state_unchanged() {
    let config = Config {
        sample_rate: SampleRate::Hz8000,
        mode: Aggressiveness::Quality,
    };
    let mut probed = Detector::new(config);
    let mut control = Detector::new(config);

    let mut seed = 0xdead_beef;
    for _ in 0..10 {
        let frame = noise(240, &mut seed);
        probed.process(&frame).unwrap();
        control.process(&frame).unwrap();
    }

    let err = probed.process(&noise(100, &mut seed)).unwrap_err();
    assert_eq!(
        err,
        Error::FrameSizeMismatch {
            got: 100,
            rate: 8_000
        }
    );

    // The rejected call must not have advanced any state: both detectors
    // keep producing identical decisions.
    let mut tail_seed = 0x0bad_cafe;
    for i in 0..40 {
        let frame = noise(240, &mut tail_seed);
        assert_eq!(
            probed.process(&frame).unwrap(),
            control.process(&frame).unwrap(),
            "diverged at frame {i}"
        );
    }
}

#[test]
fn detectors_on_different_streams_are_independent() {
    let mut a = quality_detector(SampleRate::Hz8000);
    let mut b = quality_detector(SampleRate::Hz8000);

    // Drive `a` hard; `b` must behave exactly like a fresh instance.
    for frame in voice_like(240 * 30, 8_000).chunks(240) {
        a.process(frame).unwrap();
    }

    let mut fresh = quality_detector(SampleRate::Hz8000);
    let mut seed = 0x600d_f00d;
    for _ in 0..30 {
        let frame = noise(240, &mut seed);
        assert_eq!(b.process(&frame).unwrap(), fresh.process(&frame).unwrap());
    }
}
