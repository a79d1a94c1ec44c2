// Copyright (c) 2024 Mike Tsao

use crate::{
    audio::{Interpolation, SampleBuffer},
    curves::Curve,
    error::Result,
    traits::{ContinuesPhase, Generates},
    types::{Duration, FrequencyHz, SampleRate},
    util::Rng,
};
use core::f64::consts::{PI, TAU};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Classic oscillator waveforms. All of them swing between -1.0 and 1.0.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    FromRepr,
    IntoStaticStr,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Waveform {
    /// Sine wave
    #[default]
    Sine,
    /// Triangle wave. Rises from zero at phase zero, like the sine.
    Triangle,
    /// Square wave. High for the first half of each cycle.
    Square,
    /// Sawtooth wave. Rises from zero at phase zero.
    Sawtooth,
}
impl Waveform {
    /// The waveform's value at `phase` radians.
    pub fn value(&self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Triangle => 2.0 * ((phase - PI / 2.0).rem_euclid(TAU) - PI).abs() / PI - 1.0,
            Waveform::Square => {
                if phase.rem_euclid(TAU) < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => (phase + PI).rem_euclid(TAU) / PI - 1.0,
        }
    }
}

/// An oscillator's pitch, fixed or gliding.
#[derive(Clone, Debug)]
pub enum Frequency {
    #[allow(missing_docs)]
    Constant(FrequencyHz),
    /// Hz over time. If the oscillator outlasts the curve, the curve's
    /// endpoint holds.
    Curve(Curve),
}
impl Default for Frequency {
    fn default() -> Self {
        Self::Constant(FrequencyHz(220.0))
    }
}
impl From<f64> for Frequency {
    fn from(value: f64) -> Self {
        Self::Constant(FrequencyHz(value))
    }
}
impl From<FrequencyHz> for Frequency {
    fn from(value: FrequencyHz) -> Self {
        Self::Constant(value)
    }
}
impl From<Curve> for Frequency {
    fn from(value: Curve) -> Self {
        Self::Curve(value)
    }
}

/// A signal generator that produces traditional waveforms.
///
/// When `phase` is `None`, an oscillator placed in a sequence right after
/// another one picks up where the previous one's cycle left off, so that a
/// melody doesn't click at every note boundary. Set `phase` explicitly to
/// opt out.
#[derive(Clone, Builder, Debug, Derivative)]
#[derivative(Default)]
#[builder(default)]
pub struct Oscillator {
    /// The fundamental waveform for this oscillator.
    waveform: Waveform,

    /// Hertz, or a curve of Hertz.
    #[builder(setter(into))]
    frequency: Frequency,

    /// How long the oscillator sounds.
    #[derivative(Default(value = "Duration::Millis(5000.0)"))]
    #[builder(setter(into))]
    duration: Duration,

    /// Starting phase in radians.
    #[builder(setter(strip_option))]
    phase: Option<f64>,
}
impl Oscillator {
    #[allow(missing_docs)]
    pub fn new(
        waveform: Waveform,
        frequency: impl Into<Frequency>,
        duration: impl Into<Duration>,
    ) -> Self {
        Self {
            waveform,
            frequency: frequency.into(),
            duration: duration.into(),
            phase: None,
        }
    }

    /// Pins the starting phase.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = Some(phase);
        self
    }

    #[allow(missing_docs)]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[allow(missing_docs)]
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    #[allow(missing_docs)]
    pub fn phase(&self) -> Option<f64> {
        self.phase
    }

    // Cycles elapsed at each of `n + 1` sample boundaries.
    fn cycles(&self, sample_rate: SampleRate, n: usize) -> Result<Vec<f64>> {
        match &self.frequency {
            Frequency::Constant(frequency) => {
                let seconds = self.duration.to_seconds(sample_rate).0;
                Ok((0..=n)
                    .map(|i| {
                        let t = if n == 0 {
                            0.0
                        } else {
                            seconds * i as f64 / n as f64
                        };
                        frequency.0 * t
                    })
                    .collect())
            }
            Frequency::Curve(curve) => {
                let mut cycles = curve.integral(sample_rate)?;
                let mut last = cycles.last().copied().unwrap_or_default();
                let step = curve.endpoint(sample_rate) / sample_rate.0 as f64;
                while cycles.len() < n + 1 {
                    last += step;
                    cycles.push(last);
                }
                cycles.truncate(n + 1);
                Ok(cycles)
            }
        }
    }
}
impl Generates for Oscillator {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        Ok(self
            .generate_from_phase(sample_rate, self.phase.unwrap_or_default())?
            .0)
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn name(&self) -> &'static str {
        self.waveform.into()
    }

    fn as_phased(&self) -> Option<&dyn ContinuesPhase> {
        Some(self)
    }
}
impl ContinuesPhase for Oscillator {
    fn has_explicit_phase(&self) -> bool {
        self.phase.is_some()
    }

    fn generate_from_phase(
        &self,
        sample_rate: SampleRate,
        phase: f64,
    ) -> Result<(SampleBuffer, f64)> {
        self.duration.validate_non_negative("oscillator")?;
        let n = self.duration.num_samples(sample_rate)?;
        let cycles = self.cycles(sample_rate, n)?;
        let samples: Vec<f64> = cycles[..n]
            .iter()
            .map(|c| self.waveform.value(phase + TAU * c))
            .collect();
        let end_phase = (phase + TAU * cycles[n]).rem_euclid(TAU);
        Ok((SampleBuffer::mono(samples, sample_rate), end_phase))
    }
}

/// Digital silence.
#[derive(Clone, Debug, Derivative)]
#[derivative(Default)]
pub struct Silence {
    #[derivative(Default(value = "Duration::Millis(5000.0)"))]
    duration: Duration,
}
impl Silence {
    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self {
            duration: duration.into(),
        }
    }
}
impl Generates for Silence {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        self.duration.validate_non_negative("silence")?;
        Ok(SampleBuffer::silent(
            1,
            self.duration.num_samples(sample_rate)?,
            sample_rate,
        ))
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn name(&self) -> &'static str {
        "Silence"
    }
}

/// A constant 1.0, also known as DC. One sample long by default, which makes
/// it an impulse.
#[derive(Clone, Debug, Derivative)]
#[derivative(Default)]
pub struct Step {
    #[derivative(Default(value = "Duration::Samples(1)"))]
    duration: Duration,
}
impl Step {
    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self {
            duration: duration.into(),
        }
    }
}
impl Generates for Step {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        self.duration.validate_non_negative("step")?;
        Ok(SampleBuffer::mono(
            vec![1.0; self.duration.num_samples(sample_rate)?],
            sample_rate,
        ))
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn name(&self) -> &'static str {
        "Step"
    }
}

/// Uniform white noise in [-1.0, 1.0). The same seed always produces the same
/// noise.
#[derive(Clone, Debug)]
pub struct WhiteNoise {
    duration: Duration,
    seed: u128,
}
impl WhiteNoise {
    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>, seed: u128) -> Self {
        Self {
            duration: duration.into(),
            seed,
        }
    }
}
impl Generates for WhiteNoise {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        self.duration.validate_non_negative("noise")?;
        let mut rng = Rng::new_with_seed(self.seed);
        let samples = (0..self.duration.num_samples(sample_rate)?)
            .map(|_| rng.rand_bipolar())
            .collect();
        Ok(SampleBuffer::mono(samples, sample_rate))
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn name(&self) -> &'static str {
        "WhiteNoise"
    }
}

/// Pink (1/f) noise, normalized to a peak of 1.0. The same seed always
/// produces the same noise.
///
/// Adapted from Larry Trammell's three-stage generator
/// (<https://www.ridgerat-tech.us/pink/pinkalg.htm>): each stage holds a
/// random value and refreshes it with a stage-specific probability, and the
/// output is the sum of the stages.
#[derive(Clone, Debug)]
pub struct PinkNoise {
    duration: Duration,
    seed: u128,
}
impl PinkNoise {
    const STAGE_AMPLITUDES: [f64; 3] = [4.6306e-3, 5.9961e-3, 8.3586e-3];
    const STAGE_THRESHOLDS: [f64; 3] = [0.31878, 0.77686, 0.97785];

    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>, seed: u128) -> Self {
        Self {
            duration: duration.into(),
            seed,
        }
    }
}
impl Generates for PinkNoise {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        self.duration.validate_non_negative("noise")?;
        let mut rng = Rng::new_with_seed(self.seed);
        let mut stages = Self::STAGE_AMPLITUDES.map(|a| a * rng.rand_bipolar());
        let mut samples: Vec<f64> = (0..self.duration.num_samples(sample_rate)?)
            .map(|_| {
                let roll = rng.rand_float();
                for (i, stage) in stages.iter_mut().enumerate() {
                    if roll > Self::STAGE_THRESHOLDS[i] {
                        *stage = Self::STAGE_AMPLITUDES[i] * rng.rand_bipolar();
                    }
                }
                stages.iter().sum()
            })
            .collect();
        let peak = samples.iter().fold(0.0, |acc: f64, s| acc.max(s.abs()));
        if peak > 0.0 {
            samples.iter_mut().for_each(|s| *s /= peak);
        }
        Ok(SampleBuffer::mono(samples, sample_rate))
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn name(&self) -> &'static str {
        "PinkNoise"
    }
}

/// Prerecorded audio, such as a decoded WAV file. If it was recorded at a
/// different rate than the one being rendered, it's resampled.
#[derive(Clone, Debug)]
pub struct Raw {
    buffer: Arc<SampleBuffer>,
    interpolation: Interpolation,
}
impl Raw {
    #[allow(missing_docs)]
    pub fn new(buffer: impl Into<Arc<SampleBuffer>>) -> Self {
        Self {
            buffer: buffer.into(),
            interpolation: Interpolation::default(),
        }
    }

    /// Chooses how resampling estimates in-between values.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[allow(missing_docs)]
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
impl Generates for Raw {
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        let mut buffer = self.buffer.as_ref().clone();
        buffer.resample(sample_rate, self.interpolation);
        Ok(buffer)
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::Millis(
            self.buffer.len() as f64 * 1000.0 / self.buffer.sample_rate().0 as f64,
        ))
    }

    fn name(&self) -> &'static str {
        "Raw"
    }
}
