// Copyright (c) 2024 Mike Tsao

use cadenza::{prelude::*, transforms::BiQuadKind};
use float_cmp::approx_eq;
use more_asserts::{assert_gt, assert_lt};

const SR: SampleRate = SampleRate(8000);

fn rms(samples: &[f64]) -> f64 {
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

// Gain then clip isn't clip then gain.
#[test]
fn chain_order_matters() {
    let quiet = Signal::sine(500.0, 160) * 0.1;
    let boost_then_clip = (&quiet * (Gain::new(20.0) * Clip::new(0.5)))
        .realize(SR)
        .unwrap();
    let clip_then_boost = (&quiet * (Clip::new(0.5) * Gain::new(20.0)))
        .realize(SR)
        .unwrap();
    assert_ne!(boost_then_clip, clip_then_boost);
    assert!(approx_eq!(f64, boost_then_clip.peak(), 0.5, epsilon = 1e-12));
    assert!(approx_eq!(f64, clip_then_boost.peak(), 1.0, epsilon = 1e-9));
}

// A low-pass keeps a low tone and kills a high one.
#[test]
fn filters_separate_frequencies() {
    let low = Signal::sine(100.0, 4000);
    let high = Signal::sine(3000.0, 4000);
    let lpf = BiQuad::new(BiQuadKind::LowPass, 500.0, core::f64::consts::FRAC_1_SQRT_2);

    let low_out = (&low * lpf.clone()).realize(SR).unwrap();
    let high_out = (&high * lpf).realize(SR).unwrap();
    let settled = 1000..4000;
    assert_gt!(rms(&low_out.channel(0).unwrap()[settled.clone()]), 0.6);
    assert_lt!(rms(&high_out.channel(0).unwrap()[settled]), 0.05);
}

// Panning a tone and folding it back to mono loses nothing at hard right.
#[test]
fn pan_then_mono() {
    let s = Signal::step(10) * Pan::new(100.0) * Mono;
    let b = s.realize(SR).unwrap();
    assert!(b.is_mono());
    assert!(b
        .channel(0)
        .unwrap()
        .iter()
        .all(|s| approx_eq!(f64, *s, 1.0, epsilon = 1e-12)));
}

// Combine writes into a stereo host, growing it to fit.
#[test]
fn combine_into_a_host() {
    let host = Signal::silence(100) * Repan::new([Some(0), Some(0)]);
    let insert = Signal::step(150);
    let s = host.combine(1, TimeSpan::from_start(20), &insert);
    let b = s.realize(SR).unwrap();
    assert_eq!(b.num_channels(), 2);
    assert_eq!(b.len(), 170);
    assert!(b.channel(0).unwrap().iter().all(|s| *s == 0.0));
    let right = b.channel(1).unwrap();
    assert!(right[..20].iter().all(|s| *s == 0.0));
    assert!(right[20..].iter().all(|s| *s == 1.0));
}

// A crossfade overlaps two clips and keeps the total length honest.
#[test]
fn crossfade_between_notes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let a = Signal::square(200.0, 400);
    let b = Signal::triangle(300.0, 400);
    let faded = (&a | CrossFade::new(100) | &b).realize(SR).unwrap();
    assert_eq!(faded.len(), 700);

    let plain = (&a | &b).realize(SR).unwrap();
    assert_eq!(plain.len(), 800);
    assert_eq!(
        &faded.channel(0).unwrap()[..300],
        &plain.channel(0).unwrap()[..300]
    );
}

// Stretching by two halves the length; an envelope then shapes it.
#[test]
fn time_and_envelope() {
    let s = Signal::sine(100.0, 800) * Stretch::rate(2.0) * Adsr::new(50, 50, 0.5, 100);
    let b = s.realize(SR).unwrap();
    assert_eq!(b.len(), 400);
    let c = b.channel(0).unwrap();
    assert_eq!(c[0], 0.0);
    assert!(approx_eq!(f64, *c.last().unwrap(), 0.0, epsilon = 0.02));
}

// Convolving with a unit impulse passes audio through unchanged.
#[test]
fn convolution_with_an_impulse_is_identity() {
    let tone = Signal::sawtooth(110.0, 300);
    let dry = tone.realize(SR).unwrap();
    let wet = (&tone * Convolution::from_samples(vec![1.0]))
        .realize(SR)
        .unwrap();
    assert_eq!(dry, wet);
}

// Curves drive parameters over time: a rising gain and a pitch glide.
#[test]
fn curves_drive_transforms_and_oscillators() {
    let swell = Signal::step(100) * Amplitude::new(Curve::line(0.0, 1.0, 100));
    let b = swell.realize(SR).unwrap();
    let c = b.channel(0).unwrap();
    assert_eq!(c[0], 0.0);
    assert!(approx_eq!(f64, c[50], 0.5, epsilon = 1e-12));

    let glide = Signal::sine(Curve::line(200.0, 400.0, 800), 800);
    let g = glide.realize(SR).unwrap();
    assert_eq!(g.len(), 800);
    assert_lt!(g.peak(), 1.0 + 1e-12);
}
