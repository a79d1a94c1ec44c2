// Copyright (c) 2024 Mike Tsao

//! Handles digital-audio and wall-clock time.

use crate::error::{Error, Result};
use core::{
    fmt::{self, Display},
    ops::{Mul, Neg},
};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// Samples per second. Always positive.
#[derive(Clone, Copy, Debug, Derivative, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub struct SampleRate(#[derivative(Default(value = "44100"))] pub usize);
#[allow(missing_docs)]
impl SampleRate {
    pub const DEFAULT_SAMPLE_RATE: usize = 44100;
    pub const DEFAULT: SampleRate = SampleRate::new(Self::DEFAULT_SAMPLE_RATE);

    /// Zero isn't a sample rate, so it quietly becomes the default.
    pub const fn new(value: usize) -> Self {
        if value != 0 {
            Self(value)
        } else {
            Self(Self::DEFAULT_SAMPLE_RATE)
        }
    }

    /// Like [SampleRate::new()], but rejects zero instead of substituting.
    pub fn try_new(value: usize) -> Result<Self> {
        if value == 0 {
            Err(Error::invalid_argument("sample rate must be positive"))
        } else {
            Ok(Self(value))
        }
    }
}
impl Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{} Hz", self.0))
    }
}
impl From<usize> for SampleRate {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}
impl From<u32> for SampleRate {
    fn from(value: u32) -> Self {
        Self::new(value as usize)
    }
}
impl From<f64> for SampleRate {
    fn from(value: f64) -> Self {
        Self::new(value as usize)
    }
}
impl From<SampleRate> for f64 {
    fn from(value: SampleRate) -> Self {
        value.0 as f64
    }
}
impl From<SampleRate> for u32 {
    fn from(value: SampleRate) -> Self {
        value.0 as u32
    }
}
impl Mul<Seconds> for SampleRate {
    type Output = usize;

    // (sample rate x seconds) = buffer size
    fn mul(self, rhs: Seconds) -> Self::Output {
        (self.0 as f64 * rhs.0) as usize
    }
}

/// Represents the [seconds](https://en.wikipedia.org/wiki/Second) unit of time.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Seconds(pub f64);
impl Seconds {
    /// Zero seconds.
    pub const fn zero() -> Seconds {
        Seconds(0.0)
    }
}
impl From<f64> for Seconds {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
impl Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:.3}s", self.0))
    }
}

/// A length of time, expressed either as an exact count of samples or as
/// milliseconds.
///
/// The convention is carried everywhere a duration appears: integers always
/// mean samples, floats always mean milliseconds. `Duration::from(100)` is a
/// hundred samples at any sample rate, while `Duration::from(100.0)` is a
/// tenth of a second.
///
/// Durations are signed so that time-shifting transforms can move audio
/// backward. Generators reject negative durations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Duration {
    /// An exact number of samples, independent of sample rate.
    Samples(i64),
    /// Milliseconds; converted to samples at render time.
    Millis(f64),
}
impl Default for Duration {
    fn default() -> Self {
        Self::Samples(0)
    }
}
impl Duration {
    /// No time at all.
    pub const ZERO: Duration = Duration::Samples(0);

    /// Converts to a (possibly negative) sample count. Millisecond values are
    /// truncated toward zero.
    pub fn to_samples(&self, sample_rate: SampleRate) -> i64 {
        match self {
            Duration::Samples(samples) => *samples,
            Duration::Millis(ms) => (ms * sample_rate.0 as f64 / 1000.0) as i64,
        }
    }

    /// Converts to a sample count, failing if the duration is negative.
    pub fn num_samples(&self, sample_rate: SampleRate) -> Result<usize> {
        let samples = self.to_samples(sample_rate);
        usize::try_from(samples)
            .map_err(|_| Error::invalid_argument(format!("duration {self} is negative")))
    }

    /// The duration in seconds at the given sample rate.
    pub fn to_seconds(&self, sample_rate: SampleRate) -> Seconds {
        match self {
            Duration::Samples(samples) => Seconds(*samples as f64 / sample_rate.0 as f64),
            Duration::Millis(ms) => Seconds(ms / 1000.0),
        }
    }

    /// Whether the duration points backward in time.
    pub fn is_negative(&self) -> bool {
        match self {
            Duration::Samples(samples) => *samples < 0,
            Duration::Millis(ms) => *ms < 0.0,
        }
    }

    /// Returns an error naming `what` if the duration is negative or not a
    /// number.
    pub fn validate_non_negative(&self, what: &str) -> Result<()> {
        let is_nan = matches!(self, Duration::Millis(ms) if ms.is_nan());
        if self.is_negative() || is_nan {
            Err(Error::invalid_argument(format!(
                "{what} duration must be non-negative, got {self}"
            )))
        } else {
            Ok(())
        }
    }

    /// Adds two durations that share a unit. Mixed units can't be added
    /// without a sample rate, so they yield `None`.
    pub fn checked_add(&self, other: &Duration) -> Option<Duration> {
        match (self, other) {
            (Duration::Samples(a), Duration::Samples(b)) => Some(Duration::Samples(a + b)),
            (Duration::Millis(a), Duration::Millis(b)) => Some(Duration::Millis(a + b)),
            _ => None,
        }
    }

    /// The longer of two durations that share a unit.
    pub fn checked_max(&self, other: &Duration) -> Option<Duration> {
        match (self, other) {
            (Duration::Samples(a), Duration::Samples(b)) => Some(Duration::Samples(*a.max(b))),
            (Duration::Millis(a), Duration::Millis(b)) => Some(Duration::Millis(a.max(*b))),
            _ => None,
        }
    }

    /// Adds two durations, converting mixed units to samples at the given
    /// rate.
    pub fn sum(&self, other: &Duration, sample_rate: SampleRate) -> Duration {
        match (self, other) {
            (Duration::Samples(a), Duration::Samples(b)) => Duration::Samples(a + b),
            (Duration::Millis(a), Duration::Millis(b)) => Duration::Millis(a + b),
            _ => Duration::Samples(self.to_samples(sample_rate) + other.to_samples(sample_rate)),
        }
    }
}
impl Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Samples(samples) => f.write_fmt(format_args!("{samples} samples")),
            Duration::Millis(ms) => f.write_fmt(format_args!("{ms}ms")),
        }
    }
}
impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Duration::Samples(samples) => Duration::Samples(-samples),
            Duration::Millis(ms) => Duration::Millis(-ms),
        }
    }
}
impl From<i64> for Duration {
    fn from(value: i64) -> Self {
        Self::Samples(value)
    }
}
impl From<i32> for Duration {
    fn from(value: i32) -> Self {
        Self::Samples(value as i64)
    }
}
impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self::Samples(value as i64)
    }
}
impl From<usize> for Duration {
    fn from(value: usize) -> Self {
        Self::Samples(value as i64)
    }
}
impl From<f64> for Duration {
    fn from(value: f64) -> Self {
        Self::Millis(value)
    }
}
impl From<f32> for Duration {
    fn from(value: f32) -> Self {
        Self::Millis(value as f64)
    }
}
impl From<Seconds> for Duration {
    fn from(value: Seconds) -> Self {
        Self::Millis(value.0 * 1000.0)
    }
}
