// Copyright (c) 2024 Mike Tsao

//! Time-varying parameters. A [Curve] is sampled once per audio sample to
//! drive gain envelopes, pan sweeps, or an oscillator's frequency.

use crate::{
    error::{Error, Result},
    types::{Duration, SampleRate},
};
use core::{f64::consts::PI, fmt::Debug, ops::BitOr};
use kahan::KahanSum;
use std::sync::Arc;

/// A client-supplied function of time in seconds.
pub type CurveFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A parameter that changes over a finite span of time.
#[derive(Clone)]
pub enum Curve {
    /// The same value throughout.
    Constant {
        #[allow(missing_docs)]
        value: f64,
        #[allow(missing_docs)]
        duration: Duration,
    },
    /// A straight ramp from `begin` toward `end`. `end` itself is the first
    /// value after the curve is over.
    Line {
        #[allow(missing_docs)]
        begin: f64,
        #[allow(missing_docs)]
        end: f64,
        #[allow(missing_docs)]
        duration: Duration,
    },
    /// An S-shaped transition from `begin` to `end`, steepest at the midpoint.
    Logistic {
        #[allow(missing_docs)]
        begin: f64,
        #[allow(missing_docs)]
        end: f64,
        #[allow(missing_docs)]
        duration: Duration,
    },
    /// `baseline + depth * sin(2 pi frequency t)`, for vibrato and tremolo.
    Sine {
        /// Hz.
        frequency: f64,
        #[allow(missing_docs)]
        depth: f64,
        #[allow(missing_docs)]
        baseline: f64,
        #[allow(missing_docs)]
        duration: Duration,
    },
    /// Several curves back to back.
    Compound(Vec<Curve>),
    /// Any function of time, in seconds.
    Function {
        #[allow(missing_docs)]
        f: CurveFn,
        #[allow(missing_docs)]
        duration: Duration,
    },
}
impl Debug for Curve {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Curve::Constant { value, duration } => f
                .debug_struct("Constant")
                .field("value", value)
                .field("duration", duration)
                .finish(),
            Curve::Line {
                begin,
                end,
                duration,
            } => f
                .debug_struct("Line")
                .field("begin", begin)
                .field("end", end)
                .field("duration", duration)
                .finish(),
            Curve::Logistic {
                begin,
                end,
                duration,
            } => f
                .debug_struct("Logistic")
                .field("begin", begin)
                .field("end", end)
                .field("duration", duration)
                .finish(),
            Curve::Sine {
                frequency,
                depth,
                baseline,
                duration,
            } => f
                .debug_struct("Sine")
                .field("frequency", frequency)
                .field("depth", depth)
                .field("baseline", baseline)
                .field("duration", duration)
                .finish(),
            Curve::Compound(curves) => f.debug_tuple("Compound").field(curves).finish(),
            Curve::Function { duration, .. } => f
                .debug_struct("Function")
                .field("duration", duration)
                .finish_non_exhaustive(),
        }
    }
}
#[allow(missing_docs)]
impl Curve {
    pub fn constant(value: f64, duration: impl Into<Duration>) -> Self {
        Self::Constant {
            value,
            duration: duration.into(),
        }
    }

    pub fn line(begin: f64, end: f64, duration: impl Into<Duration>) -> Self {
        Self::Line {
            begin,
            end,
            duration: duration.into(),
        }
    }

    pub fn logistic(begin: f64, end: f64, duration: impl Into<Duration>) -> Self {
        Self::Logistic {
            begin,
            end,
            duration: duration.into(),
        }
    }

    pub fn sine(frequency: f64, depth: f64, baseline: f64, duration: impl Into<Duration>) -> Self {
        Self::Sine {
            frequency,
            depth,
            baseline,
            duration: duration.into(),
        }
    }

    pub fn function(
        f: impl Fn(f64) -> f64 + Send + Sync + 'static,
        duration: impl Into<Duration>,
    ) -> Self {
        Self::Function {
            f: Arc::new(f),
            duration: duration.into(),
        }
    }

    /// The curve's length, if all its parts are measured in the same unit.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Curve::Constant { duration, .. }
            | Curve::Line { duration, .. }
            | Curve::Logistic { duration, .. }
            | Curve::Sine { duration, .. }
            | Curve::Function { duration, .. } => Some(*duration),
            Curve::Compound(curves) => {
                let mut iter = curves.iter();
                let first = iter.next()?.duration()?;
                iter.try_fold(first, |acc, c| acc.checked_add(&c.duration()?))
            }
        }
    }

    /// The number of values [Curve::flatten()] produces.
    pub fn num_samples(&self, sample_rate: SampleRate) -> Result<usize> {
        match self {
            Curve::Compound(curves) => curves
                .iter()
                .try_fold(0, |acc, c| Ok(acc + c.num_samples(sample_rate)?)),
            Curve::Constant { duration, .. }
            | Curve::Line { duration, .. }
            | Curve::Logistic { duration, .. }
            | Curve::Sine { duration, .. }
            | Curve::Function { duration, .. } => {
                duration.validate_non_negative("curve")?;
                duration.num_samples(sample_rate)
            }
        }
    }

    // n points spaced evenly over the duration, starting at zero, and when
    // `inclusive` one more point exactly at the end.
    fn sample_times(
        duration: &Duration,
        sample_rate: SampleRate,
        inclusive: bool,
    ) -> Result<Vec<f64>> {
        let n = duration.num_samples(sample_rate)?;
        let seconds = duration.to_seconds(sample_rate).0;
        let count = if inclusive { n + 1 } else { n };
        if n == 0 {
            return Ok(vec![0.0; count]);
        }
        Ok((0..count)
            .map(|i| seconds * i as f64 / n as f64)
            .collect())
    }

    /// The curve's value at each sample.
    pub fn flatten(&self, sample_rate: SampleRate) -> Result<Vec<f64>> {
        self.num_samples(sample_rate)?;
        Ok(match self {
            Curve::Constant { value, duration } => {
                vec![*value; duration.num_samples(sample_rate)?]
            }
            Curve::Line {
                begin,
                end,
                duration,
            } => {
                let n = duration.num_samples(sample_rate)?;
                (0..n)
                    .map(|i| begin + (end - begin) * i as f64 / n as f64)
                    .collect()
            }
            Curve::Logistic {
                begin,
                end,
                duration,
            } => {
                let (height, midpoint, steepness) = Self::logistic_shape(*begin, *end, duration, sample_rate);
                Self::sample_times(duration, sample_rate, false)?
                    .into_iter()
                    .map(|t| height / (1.0 + (-steepness * (t - midpoint)).exp()) + begin)
                    .collect()
            }
            Curve::Sine {
                frequency,
                depth,
                baseline,
                duration,
            } => Self::sample_times(duration, sample_rate, false)?
                .into_iter()
                .map(|t| depth * (2.0 * PI * frequency * t).sin() + baseline)
                .collect(),
            Curve::Compound(curves) => {
                let mut v = Vec::default();
                for c in curves {
                    v.extend(c.flatten(sample_rate)?);
                }
                v
            }
            Curve::Function { f, duration } => Self::sample_times(duration, sample_rate, false)?
                .into_iter()
                .map(|t| f(t))
                .collect(),
        })
    }

    fn logistic_shape(
        begin: f64,
        end: f64,
        duration: &Duration,
        sample_rate: SampleRate,
    ) -> (f64, f64, f64) {
        let seconds = duration.to_seconds(sample_rate).0;
        (end - begin, seconds / 2.0, 10.0 / seconds)
    }

    /// The running integral of the curve over time (value x seconds), with
    /// one more point than [Curve::flatten()] so that the last entry is the
    /// total. For a frequency curve this is the number of cycles elapsed.
    pub fn integral(&self, sample_rate: SampleRate) -> Result<Vec<f64>> {
        self.num_samples(sample_rate)?;
        Ok(match self {
            Curve::Constant { value, duration } => {
                Self::sample_times(duration, sample_rate, true)?
                    .into_iter()
                    .map(|t| value * t)
                    .collect()
            }
            Curve::Line {
                begin,
                end,
                duration,
            } => {
                let n = duration.num_samples(sample_rate)?.max(1) as f64;
                Self::sample_times(duration, sample_rate, true)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| (begin + (end - begin) / 2.0 * i as f64 / n) * t)
                    .collect()
            }
            Curve::Logistic {
                begin,
                end,
                duration,
            } => {
                let (height, midpoint, steepness) = Self::logistic_shape(*begin, *end, duration, sample_rate);
                let antiderivative = |t: f64| {
                    height / steepness * (1.0 + (steepness * (t - midpoint)).exp()).ln()
                        + begin * t
                };
                let origin = antiderivative(0.0);
                Self::sample_times(duration, sample_rate, true)?
                    .into_iter()
                    .map(|t| antiderivative(t) - origin)
                    .collect()
            }
            Curve::Sine {
                frequency,
                depth,
                baseline,
                duration,
            } => Self::sample_times(duration, sample_rate, true)?
                .into_iter()
                .map(|t| {
                    let oscillation = if *frequency == 0.0 {
                        0.0
                    } else {
                        depth * (1.0 - (2.0 * PI * frequency * t).cos()) / (2.0 * PI * frequency)
                    };
                    oscillation + baseline * t
                })
                .collect(),
            Curve::Compound(curves) => {
                let mut iter = curves.iter();
                let Some(first) = iter.next() else {
                    return Ok(vec![0.0]);
                };
                let mut result = first.integral(sample_rate)?;
                for c in iter {
                    // Whole cycles don't matter for phase, and dropping them
                    // keeps the numbers small.
                    let carry = result.pop().unwrap_or_default().rem_euclid(1.0);
                    result.extend(c.integral(sample_rate)?.into_iter().map(|v| v + carry));
                }
                result
            }
            Curve::Function { f, duration } => {
                let times = Self::sample_times(duration, sample_rate, true)?;
                let mut sum = KahanSum::new();
                times
                    .iter()
                    .enumerate()
                    .map(|(i, t)| {
                        sum += f(*t);
                        sum.sum() / (i + 1) as f64 * t
                    })
                    .collect()
            }
        })
    }

    /// The value just past the end of the curve, which is what a following
    /// curve would naturally continue from.
    pub fn endpoint(&self, sample_rate: SampleRate) -> f64 {
        match self {
            Curve::Constant { value, .. } => *value,
            Curve::Line { end, .. } | Curve::Logistic { end, .. } => *end,
            Curve::Sine {
                frequency,
                depth,
                baseline,
                duration,
            } => {
                depth * (2.0 * PI * frequency * duration.to_seconds(sample_rate).0).sin() + baseline
            }
            Curve::Compound(curves) => curves
                .last()
                .map_or(0.0, |c| c.endpoint(sample_rate)),
            Curve::Function { f, duration } => f(duration.to_seconds(sample_rate).0),
        }
    }

    /// Fails if the curve can't be sampled.
    pub fn validate(&self) -> Result<()> {
        match self {
            Curve::Compound(curves) if curves.is_empty() => Err(Error::invalid_argument(
                "a compound curve needs at least one part",
            )),
            Curve::Compound(curves) => curves.iter().try_for_each(|c| c.validate()),
            Curve::Constant { duration, .. }
            | Curve::Line { duration, .. }
            | Curve::Logistic { duration, .. }
            | Curve::Sine { duration, .. }
            | Curve::Function { duration, .. } => duration.validate_non_negative("curve"),
        }
    }
}
impl BitOr for Curve {
    type Output = Curve;

    /// Concatenates two curves.
    fn bitor(self, rhs: Self) -> Self::Output {
        let mut curves = match self {
            Curve::Compound(curves) => curves,
            other => vec![other],
        };
        match rhs {
            Curve::Compound(more) => curves.extend(more),
            other => curves.push(other),
        }
        Curve::Compound(curves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use more_asserts::{assert_gt, assert_lt};

    fn sr() -> SampleRate {
        SampleRate(1000)
    }

    #[test]
    fn constant() {
        let c = Curve::constant(2.0, 1000.0);
        let v = c.flatten(sr()).unwrap();
        assert_eq!(v.len(), 1000);
        assert!(v.iter().all(|x| *x == 2.0));
        let i = c.integral(sr()).unwrap();
        assert_eq!(i.len(), 1001);
        assert!(approx_eq!(f64, *i.last().unwrap(), 2.0, epsilon = 1e-12));
    }

    #[test]
    fn line_ramps_without_reaching_end() {
        let c = Curve::line(0.0, 1.0, 4);
        assert_eq!(c.flatten(sr()).unwrap(), vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(c.endpoint(sr()), 1.0);

        let c = Curve::line(100.0, 300.0, 1000.0);
        let i = c.integral(sr()).unwrap();
        // Average of 200 Hz over one second.
        assert!(approx_eq!(f64, *i.last().unwrap(), 200.0, epsilon = 1e-9));
    }

    #[test]
    fn logistic_is_monotonic_and_bounded() {
        let c = Curve::logistic(1.0, 3.0, 1000.0);
        let v = c.flatten(sr()).unwrap();
        assert!(v.windows(2).all(|w| w[0] <= w[1]));
        assert_gt!(v[0], 1.0);
        assert_lt!(v[v.len() - 1], 3.0);
        assert!(approx_eq!(f64, v[500], 2.0, epsilon = 1e-9));

        let i = c.integral(sr()).unwrap();
        assert_eq!(i[0], 0.0);
        // Symmetric around the midpoint, so the mean is 2.0.
        assert!(approx_eq!(f64, *i.last().unwrap(), 2.0, epsilon = 1e-3));
    }

    #[test]
    fn sine_curve() {
        let c = Curve::sine(1.0, 0.5, 1.0, 1000.0);
        let v = c.flatten(sr()).unwrap();
        assert!(approx_eq!(f64, v[250], 1.5, epsilon = 1e-9));
        let i = c.integral(sr()).unwrap();
        // Whole periods of the oscillation integrate to zero.
        assert!(approx_eq!(f64, *i.last().unwrap(), 1.0, epsilon = 1e-9));
    }

    #[test]
    fn compound_concatenates() {
        let c = Curve::constant(1.0, 2) | Curve::line(0.0, 1.0, 2);
        assert_eq!(c.flatten(sr()).unwrap(), vec![1.0, 1.0, 0.0, 0.5]);
        assert_eq!(c.num_samples(sr()).unwrap(), 4);
        assert_eq!(c.duration(), Some(Duration::Samples(4)));
        assert_eq!(c.endpoint(sr()), 1.0);

        let c = c | Curve::constant(5.0, 3);
        match &c {
            Curve::Compound(parts) => assert_eq!(parts.len(), 3),
            _ => panic!("expected a flat compound curve"),
        }
        assert_eq!(c.integral(sr()).unwrap().len(), 8);

        assert_eq!((Curve::constant(1.0, 2) | Curve::constant(1.0, 2.0)).duration(), None);
    }

    #[test]
    fn compound_integral_is_continuous() {
        let c = Curve::constant(100.0, 100.0) | Curve::constant(100.0, 100.0);
        let i = c.integral(sr()).unwrap();
        assert_eq!(i.len(), 201);
        // Continuous as a phase, that is, modulo whole cycles.
        let steps: Vec<f64> = i
            .windows(2)
            .map(|w| (w[1] - w[0]).rem_euclid(1.0))
            .collect();
        assert!(steps.iter().all(|s| approx_eq!(f64, *s, 0.1, epsilon = 1e-9)));
    }

    #[test]
    fn function_curve() {
        let c = Curve::function(|t| t * 2.0, 1000.0);
        let v = c.flatten(sr()).unwrap();
        assert!(approx_eq!(f64, v[500], 1.0, epsilon = 1e-12));
        assert_eq!(c.endpoint(sr()), 2.0);
        let i = c.integral(sr()).unwrap();
        assert!(approx_eq!(f64, *i.last().unwrap(), 1.0, epsilon = 1e-2));
        assert!(format!("{c:?}").starts_with("Function"));
    }

    #[test]
    fn negative_durations_fail() {
        assert!(Curve::constant(1.0, -5).flatten(sr()).is_err());
        assert!(Curve::Compound(vec![]).validate().is_err());
    }
}
