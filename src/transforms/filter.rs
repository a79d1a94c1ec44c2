// Copyright (c) 2024 Mike Tsao

//! Linear filters. Every filter here reduces to a set of feedforward (`b`)
//! and feedback (`a`) coefficients fed through the same difference equation,
//! so most of the work is in computing coefficients for the buffer's sample
//! rate.

use crate::{
    audio::SampleBuffer,
    error::{Error, Result},
    traits::Transform,
    types::{Decibels, FrequencyHz, SampleRate},
};
use core::f64::consts::PI;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

// y[n] = (sum b[i] x[n-i] - sum_{j>0} a[j] y[n-j]) / a[0]
fn lfilter(b: &[f64], a: &[f64], x: &[f64]) -> Vec<f64> {
    let a0 = a[0];
    let mut y = Vec::with_capacity(x.len());
    for n in 0..x.len() {
        let feedforward: f64 = b
            .iter()
            .take(n + 1)
            .enumerate()
            .map(|(i, bi)| bi * x[n - i])
            .sum();
        let feedback: f64 = a
            .iter()
            .take(n + 1)
            .enumerate()
            .skip(1)
            .map(|(j, aj)| aj * y[n - j])
            .sum();
        y.push((feedforward - feedback) / a0);
    }
    y
}

fn filter_buffer(b: &[f64], a: &[f64], buffer: &mut SampleBuffer) -> Result<()> {
    if b.is_empty() || a.is_empty() {
        return Err(Error::invalid_argument("a filter needs coefficients"));
    }
    if a[0] == 0.0 || !a[0].is_finite() {
        return Err(Error::invalid_argument(format!(
            "the first feedback coefficient must be nonzero, got {}",
            a[0]
        )));
    }
    for channel in buffer.channels_mut() {
        *channel = lfilter(b, a, channel);
    }
    Ok(())
}

fn check_frequency(what: &str, frequency: f64, sample_rate: SampleRate) -> Result<()> {
    let nyquist = sample_rate.0 as f64 / 2.0;
    if frequency > 0.0 && frequency < nyquist {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "{what} {frequency} Hz must be between 0 and {nyquist} Hz"
        )))
    }
}

/// A finite impulse response filter. Coefficients are normalized to sum to
/// one, so the filter has unity gain at DC. Output is trimmed to the input's
/// length.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fir {
    h: Vec<f64>,
}
impl Fir {
    #[allow(missing_docs)]
    pub fn new(coefficients: &[f64]) -> Result<Self> {
        let total: f64 = coefficients.iter().sum();
        if coefficients.is_empty() || total == 0.0 || !total.is_finite() {
            return Err(Error::invalid_argument(
                "FIR coefficients must have a finite nonzero sum",
            ));
        }
        Ok(Self {
            h: coefficients.iter().map(|c| c / total).collect(),
        })
    }

    /// The normalized coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.h
    }
}
impl Transform for Fir {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        filter_buffer(&self.h, &[1.0], buffer)
    }

    fn name(&self) -> &'static str {
        "Fir"
    }
}

/// Averages each sample with the `width - 1` before it. A crude low-pass
/// that doesn't care about sample rate.
#[derive(Clone, Debug)]
pub struct MovingAverage(Fir);
impl MovingAverage {
    #[allow(missing_docs)]
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::invalid_argument("moving average width must be positive"));
        }
        Ok(Self(Fir::new(&vec![1.0; width])?))
    }
}
impl Transform for MovingAverage {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        self.0.apply(buffer)
    }

    fn name(&self) -> &'static str {
        "MovingAverage"
    }
}

/// A general infinite impulse response filter. Both coefficient lists are
/// divided by the first feedback coefficient.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Iir {
    b: Vec<f64>,
    a: Vec<f64>,
}
impl Iir {
    #[allow(missing_docs)]
    pub fn new(feedforward: &[f64], feedback: &[f64]) -> Result<Self> {
        let Some(a0) = feedback.first().copied() else {
            return Err(Error::invalid_argument("IIR needs feedback coefficients"));
        };
        if feedforward.is_empty() {
            return Err(Error::invalid_argument("IIR needs feedforward coefficients"));
        }
        if a0 == 0.0 || !a0.is_finite() {
            return Err(Error::invalid_argument(format!(
                "the first feedback coefficient must be nonzero, got {a0}"
            )));
        }
        Ok(Self {
            b: feedforward.iter().map(|c| c / a0).collect(),
            a: feedback.iter().map(|c| c / a0).collect(),
        })
    }
}
impl Transform for Iir {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        filter_buffer(&self.b, &self.a, buffer)
    }

    fn name(&self) -> &'static str {
        "Iir"
    }
}

// Filters whose coefficients depend on the sample rate.
trait Coefficients {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)>;
}

macro_rules! impl_filter_transform {
    ($($t:ident),* $(,)?) => {
        $(
            impl Transform for $t {
                fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
                    let (b, a) = self.coefficients(buffer.sample_rate())?;
                    filter_buffer(&b, &a, buffer)
                }

                fn name(&self) -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

// beta = (1 - tan(Fc/2)) / (1 + tan(Fc/2)), the pole of a first-order
// section with cutoff Fc radians/sample.
fn first_order_beta(cutoff: f64, sample_rate: SampleRate) -> f64 {
    let fc = 2.0 * PI * cutoff / sample_rate.0 as f64;
    let t = (fc / 2.0).tan();
    (1.0 - t) / (1.0 + t)
}

// (tan(B/2), cos(Fc)) for a band between `lower` and `upper`.
fn band_intermediates(lower: f64, upper: f64, sample_rate: SampleRate) -> (f64, f64) {
    let sr = sample_rate.0 as f64;
    let bandwidth = 2.0 * PI * (upper - lower) / sr;
    let center = 2.0 * PI * (lower + upper) / 2.0 / sr;
    ((bandwidth / 2.0).tan(), center.cos())
}

fn check_band(lower: f64, upper: f64, sample_rate: SampleRate) -> Result<()> {
    check_frequency("lower edge", lower, sample_rate)?;
    check_frequency("upper edge", upper, sample_rate)?;
    if lower >= upper {
        return Err(Error::invalid_argument(format!(
            "band {lower}..{upper} Hz is empty"
        )));
    }
    Ok(())
}

/// First-order low-pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleLowPass {
    cutoff: FrequencyHz,
}
impl SimpleLowPass {
    #[allow(missing_docs)]
    pub fn new(cutoff: impl Into<FrequencyHz>) -> Self {
        Self {
            cutoff: cutoff.into(),
        }
    }
}
impl Coefficients for SimpleLowPass {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_frequency("cutoff", self.cutoff.0, sample_rate)?;
        let beta = first_order_beta(self.cutoff.0, sample_rate);
        Ok((
            vec![(1.0 - beta) / 2.0, (1.0 - beta) / 2.0],
            vec![1.0, -beta],
        ))
    }
}

/// First-order high-pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleHighPass {
    cutoff: FrequencyHz,
}
impl SimpleHighPass {
    #[allow(missing_docs)]
    pub fn new(cutoff: impl Into<FrequencyHz>) -> Self {
        Self {
            cutoff: cutoff.into(),
        }
    }
}
impl Coefficients for SimpleHighPass {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_frequency("cutoff", self.cutoff.0, sample_rate)?;
        let beta = first_order_beta(self.cutoff.0, sample_rate);
        Ok((
            vec![(1.0 + beta) / 2.0, -(1.0 + beta) / 2.0],
            vec![1.0, -beta],
        ))
    }
}

/// First-order low shelf: frequencies below the cutoff are scaled by `gain`
/// (linear), and the rest pass unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleLowShelf {
    cutoff: FrequencyHz,
    gain: f64,
}
impl SimpleLowShelf {
    /// `gain` is linear.
    pub fn new(cutoff: impl Into<FrequencyHz>, gain: f64) -> Self {
        Self {
            cutoff: cutoff.into(),
            gain,
        }
    }

    /// Gain given in decibels.
    pub fn new_db(cutoff: impl Into<FrequencyHz>, db: f64) -> Self {
        Self::new(cutoff, Decibels(db).to_amplitude())
    }
}
impl Coefficients for SimpleLowShelf {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_frequency("cutoff", self.cutoff.0, sample_rate)?;
        let beta = first_order_beta(self.cutoff.0, sample_rate);
        let g = self.gain;
        Ok((
            vec![
                (1.0 + g + (1.0 - g) * beta) / 2.0,
                -(1.0 - g + (1.0 + g) * beta) / 2.0,
            ],
            vec![1.0, -beta],
        ))
    }
}

/// First-order high shelf: frequencies above the cutoff are scaled by `gain`
/// (linear), and the rest pass unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleHighShelf {
    cutoff: FrequencyHz,
    gain: f64,
}
impl SimpleHighShelf {
    /// `gain` is linear.
    pub fn new(cutoff: impl Into<FrequencyHz>, gain: f64) -> Self {
        Self {
            cutoff: cutoff.into(),
            gain,
        }
    }

    /// Gain given in decibels.
    pub fn new_db(cutoff: impl Into<FrequencyHz>, db: f64) -> Self {
        Self::new(cutoff, Decibels(db).to_amplitude())
    }
}
impl Coefficients for SimpleHighShelf {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_frequency("cutoff", self.cutoff.0, sample_rate)?;
        let beta = first_order_beta(self.cutoff.0, sample_rate);
        let g = self.gain;
        Ok((
            vec![
                (1.0 + g + (g - 1.0) * beta) / 2.0,
                (1.0 - g - (1.0 + g) * beta) / 2.0,
            ],
            vec![1.0, -beta],
        ))
    }
}

/// Second-order band-pass between two edge frequencies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleBandPass {
    lower: FrequencyHz,
    upper: FrequencyHz,
}
impl SimpleBandPass {
    #[allow(missing_docs)]
    pub fn new(lower: impl Into<FrequencyHz>, upper: impl Into<FrequencyHz>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }
}
impl Coefficients for SimpleBandPass {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_band(self.lower.0, self.upper.0, sample_rate)?;
        let (t, center_cos) = band_intermediates(self.lower.0, self.upper.0, sample_rate);
        Ok((
            vec![t, 0.0, -t],
            vec![1.0 + t, -2.0 * center_cos, 1.0 - t],
        ))
    }
}

/// Second-order band-stop between two edge frequencies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleBandStop {
    lower: FrequencyHz,
    upper: FrequencyHz,
}
impl SimpleBandStop {
    #[allow(missing_docs)]
    pub fn new(lower: impl Into<FrequencyHz>, upper: impl Into<FrequencyHz>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }
}
impl Coefficients for SimpleBandStop {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_band(self.lower.0, self.upper.0, sample_rate)?;
        let (t, center_cos) = band_intermediates(self.lower.0, self.upper.0, sample_rate);
        Ok((
            vec![1.0, -2.0 * center_cos, 1.0],
            vec![1.0 + t, -2.0 * center_cos, 1.0 - t],
        ))
    }
}

/// A band-stop that only dips to `gain` (linear) instead of cutting fully.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleNotch {
    lower: FrequencyHz,
    upper: FrequencyHz,
    gain: f64,
}
impl SimpleNotch {
    /// `gain` is linear.
    pub fn new(lower: impl Into<FrequencyHz>, upper: impl Into<FrequencyHz>, gain: f64) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
            gain,
        }
    }

    /// Gain given in decibels.
    pub fn new_db(lower: impl Into<FrequencyHz>, upper: impl Into<FrequencyHz>, db: f64) -> Self {
        Self::new(lower, upper, Decibels(db).to_amplitude())
    }
}
impl Coefficients for SimpleNotch {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_band(self.lower.0, self.upper.0, sample_rate)?;
        let (t, center_cos) = band_intermediates(self.lower.0, self.upper.0, sample_rate);
        Ok((
            vec![1.0 + self.gain * t, -2.0 * center_cos, 1.0 - self.gain * t],
            vec![1.0 + t, -2.0 * center_cos, 1.0 - t],
        ))
    }
}

/// The response shapes [BiQuad] knows.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BiQuadKind {
    /// Passes frequencies below the cutoff.
    #[default]
    LowPass,
    /// Passes frequencies above the cutoff.
    HighPass,
    /// Passes a band around the cutoff.
    BandPass,
}

#[derive(Clone, Debug)]
struct CoefficientSet {
    a0: f64,
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
}

/// A 12dB/octave filter from Robert Bristow-Johnson's audio EQ cookbook.
/// For [BiQuadKind::BandPass], `cutoff` is the center frequency and the peak
/// gain is 0 dB.
///
/// <https://en.wikipedia.org/wiki/Digital_biquad_filter>
#[derive(Clone, Debug, Builder, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case")]
pub struct BiQuad {
    /// Which response.
    kind: BiQuadKind,
    /// Cutoff, or center frequency for a band-pass.
    #[derivative(Default(value = "1000.0.into()"))]
    #[builder(setter(into))]
    cutoff: FrequencyHz,
    /// Resonance. Higher is sharper.
    #[derivative(Default(value = "core::f64::consts::FRAC_1_SQRT_2"))]
    q: f64,
}
impl BiQuad {
    #[allow(missing_docs)]
    pub fn new(kind: BiQuadKind, cutoff: impl Into<FrequencyHz>, q: f64) -> Self {
        Self {
            kind,
            cutoff: cutoff.into(),
            q,
        }
    }

    // Excerpted from the cookbook:
    //
    // Q (the EE kind of definition, except for peakingEQ in which A*Q is the
    // classic EE Q.)
    fn rbj_intermediates_q(sample_rate: SampleRate, cutoff: f64, q: f64) -> (f64, f64) {
        let w0 = 2.0f64 * PI * cutoff / sample_rate.0 as f64;
        let w0cos = w0.cos();
        let w0sin = w0.sin();
        let alpha = w0sin / (2.0 * q.max(f64::EPSILON));
        (w0cos, alpha)
    }

    fn coefficient_set(&self, sample_rate: SampleRate) -> CoefficientSet {
        let (w0cos, alpha) = Self::rbj_intermediates_q(sample_rate, self.cutoff.0, self.q);
        match self.kind {
            BiQuadKind::LowPass => CoefficientSet {
                a0: 1.0 + alpha,
                a1: -2.0f64 * w0cos,
                a2: 1.0 - alpha,
                b0: (1.0 - w0cos) / 2.0f64,
                b1: (1.0 - w0cos),
                b2: (1.0 - w0cos) / 2.0f64,
            },
            BiQuadKind::HighPass => CoefficientSet {
                a0: 1.0 + alpha,
                a1: -2.0f64 * w0cos,
                a2: 1.0 - alpha,
                b0: (1.0 + w0cos) / 2.0f64,
                b1: -(1.0 + w0cos),
                b2: (1.0 + w0cos) / 2.0f64,
            },
            BiQuadKind::BandPass => CoefficientSet {
                a0: 1.0 + alpha,
                a1: -2.0f64 * w0cos,
                a2: 1.0 - alpha,
                b0: alpha,
                b1: 0.0,
                b2: -alpha,
            },
        }
    }
}
impl Coefficients for BiQuad {
    fn coefficients(&self, sample_rate: SampleRate) -> Result<(Vec<f64>, Vec<f64>)> {
        check_frequency("cutoff", self.cutoff.0, sample_rate)?;
        if !(self.q > 0.0) {
            return Err(Error::invalid_argument(format!(
                "Q must be positive, got {}",
                self.q
            )));
        }
        let c = self.coefficient_set(sample_rate);
        Ok((vec![c.b0, c.b1, c.b2], vec![c.a0, c.a1, c.a2]))
    }
}

impl_filter_transform!(
    SimpleLowPass,
    SimpleHighPass,
    SimpleLowShelf,
    SimpleHighShelf,
    SimpleBandPass,
    SimpleBandStop,
    SimpleNotch,
    BiQuad,
);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::{assert_gt, assert_lt};

    const SR: SampleRate = SampleRate(8000);

    fn sine(frequency: f64, len: usize) -> SampleBuffer {
        let samples: Vec<f64> = (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / SR.0 as f64).sin())
            .collect();
        SampleBuffer::from_samples(&samples, SR).unwrap()
    }

    // Peak over the second half, after the filter has settled.
    fn settled_peak(b: &SampleBuffer) -> f64 {
        let c = b.channel(0).unwrap();
        c[c.len() / 2..].iter().fold(0.0, |acc: f64, s| acc.max(s.abs()))
    }

    fn through(t: &impl Transform, frequency: f64) -> f64 {
        let mut b = sine(frequency, 4000);
        t.apply(&mut b).unwrap();
        assert_eq!(b.len(), 4000);
        settled_peak(&b)
    }

    #[test]
    fn fir_normalizes_and_trims() {
        let fir = Fir::new(&[1.0, 1.0]).unwrap();
        assert_eq!(fir.coefficients(), &[0.5, 0.5]);
        let mut b = SampleBuffer::from_samples(&[2.0, 4.0, 6.0], SR).unwrap();
        fir.apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([1.0, 3.0, 5.0].as_slice()));

        assert!(Fir::new(&[1.0, -1.0]).is_err());
        assert!(MovingAverage::new(0).is_err());
    }

    #[test]
    fn moving_average() {
        let mut b = SampleBuffer::from_samples(&[3.0, 3.0, 3.0, 0.0], SR).unwrap();
        MovingAverage::new(3).unwrap().apply(&mut b).unwrap();
        let c = b.channel(0).unwrap();
        assert!(approx_eq!(f64, c[2], 3.0, ulps = 4));
        assert!(approx_eq!(f64, c[3], 2.0, ulps = 4));
    }

    #[test]
    fn iir_difference_equation() {
        // y[n] = x[n] + 0.5 y[n-1], after normalizing by a[0] = 2.
        let iir = Iir::new(&[2.0], &[2.0, -1.0]).unwrap();
        let mut b = SampleBuffer::from_samples(&[1.0, 0.0, 0.0, 0.0], SR).unwrap();
        iir.apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([1.0, 0.5, 0.25, 0.125].as_slice()));

        assert!(Iir::new(&[1.0], &[0.0, 1.0]).is_err());
        assert!(Iir::new(&[1.0], &[]).is_err());
    }

    #[test]
    fn simple_low_and_high_pass() {
        let lpf = SimpleLowPass::new(200.0);
        assert_gt!(through(&lpf, 50.0), 0.9);
        assert_lt!(through(&lpf, 3000.0), 0.1);

        let hpf = SimpleHighPass::new(2000.0);
        assert_lt!(through(&hpf, 50.0), 0.1);
        assert_gt!(through(&hpf, 3500.0), 0.9);
    }

    #[test]
    fn shelves() {
        let low = SimpleLowShelf::new(300.0, 0.5);
        assert!(approx_eq!(f64, through(&low, 20.0), 0.5, epsilon = 0.02));
        assert!(approx_eq!(f64, through(&low, 3900.0), 1.0, epsilon = 0.02));

        let high = SimpleHighShelf::new_db(2000.0, -6.0);
        assert!(approx_eq!(f64, through(&high, 20.0), 1.0, epsilon = 0.02));
        assert_lt!(through(&high, 3900.0), 0.55);
    }

    #[test]
    fn bands() {
        let bp = SimpleBandPass::new(900.0, 1100.0);
        assert_gt!(through(&bp, 1000.0), 0.9);
        assert_lt!(through(&bp, 3000.0), 0.1);

        let bs = SimpleBandStop::new(900.0, 1100.0);
        assert_lt!(through(&bs, 1000.0), 0.1);
        assert_gt!(through(&bs, 3000.0), 0.9);

        let notch = SimpleNotch::new(900.0, 1100.0, 0.5);
        assert!(approx_eq!(f64, through(&notch, 1000.0), 0.5, epsilon = 0.05));

        assert!(SimpleBandPass::new(1100.0, 900.0)
            .apply(&mut sine(100.0, 10))
            .is_err());
    }

    #[test]
    fn biquad_kinds() {
        let lp = BiQuad::new(BiQuadKind::LowPass, 500.0, core::f64::consts::FRAC_1_SQRT_2);
        assert_gt!(through(&lp, 50.0), 0.95);
        assert_lt!(through(&lp, 3000.0), 0.05);

        let hp = BiQuadBuilder::default()
            .kind(BiQuadKind::HighPass)
            .cutoff(2000.0)
            .build()
            .unwrap();
        assert_lt!(through(&hp, 100.0), 0.05);

        let bp = BiQuad::new(BiQuadKind::BandPass, 1000.0, 2.0);
        assert!(approx_eq!(f64, through(&bp, 1000.0), 1.0, epsilon = 0.02));
        assert_eq!(bp.name(), "BiQuad");

        assert!(BiQuad::new(BiQuadKind::LowPass, 5000.0, 1.0)
            .apply(&mut sine(100.0, 10))
            .is_err());
    }
}
