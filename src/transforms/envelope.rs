// Copyright (c) 2024 Mike Tsao

use super::{time::Shift, BiTransform};
use crate::{
    audio::SampleBuffer,
    curves::Curve,
    error::{Error, Result},
    traits::Transform,
    types::{Decibels, Duration, SampleRate},
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// How a [Fade] moves between silence and full level.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub enum FadeShape {
    /// A straight ramp.
    #[derivative(Default)]
    Linear,
    /// A ramp raised to this power. Degree 0.5 keeps power roughly constant
    /// across a crossfade.
    Polynomial(f64),
    /// A ramp that's straight in decibels, from this many dB down up to 0 dB.
    /// It doesn't quite reach silence.
    Decibels(f64),
}
impl FadeShape {
    // n points from 0 to 1, both ends included.
    fn amplitudes(&self, n: usize) -> Vec<f64> {
        let ramp = (0..n).map(|i| {
            if n > 1 {
                i as f64 / (n - 1) as f64
            } else {
                0.0
            }
        });
        match self {
            FadeShape::Linear => ramp.collect(),
            FadeShape::Polynomial(degree) => ramp.map(|r| r.powf(*degree)).collect(),
            FadeShape::Decibels(range) => ramp
                .map(|r| Decibels((r - 1.0) * range.abs()).to_amplitude())
                .collect(),
        }
    }
}

/// Fades a signal in from silence, or out to silence.
#[derive(Clone, Debug, Builder, Derivative)]
#[derivative(Default)]
#[builder(default)]
pub struct Fade {
    /// In when true, out when false.
    #[derivative(Default(value = "true"))]
    fade_in: bool,

    /// How long the fade takes. Longer than the signal means the whole signal.
    #[derivative(Default(value = "Duration::Millis(1000.0)"))]
    #[builder(setter(into))]
    duration: Duration,

    /// The gain curve of the fade.
    shape: FadeShape,
}
impl Fade {
    #[allow(missing_docs)]
    pub fn is_fade_in(&self) -> bool {
        self.fade_in
    }

    #[allow(missing_docs)]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[allow(missing_docs)]
    pub fn shape(&self) -> FadeShape {
        self.shape
    }
}
impl Transform for Fade {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        self.duration.validate_non_negative("fade")?;
        let n = self.duration.num_samples(buffer.sample_rate())?;
        let amplitudes = self.shape.amplitudes(n);
        let len = buffer.len();
        // A fade longer than the signal is cut short at the signal's far end,
        // so a fade-out still lands on silence.
        let m = n.min(len);
        for channel in buffer.channels_mut() {
            if self.fade_in {
                channel[..m]
                    .iter_mut()
                    .zip(amplitudes.iter())
                    .for_each(|(s, a)| *s *= a);
            } else {
                channel[len - m..]
                    .iter_mut()
                    .zip(amplitudes[..m].iter().rev())
                    .for_each(|(s, a)| *s *= a);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Fade"
    }

    fn required_samples(&self, sample_rate: SampleRate) -> Option<usize> {
        self.duration.num_samples(sample_rate).ok()
    }
}

/// Builds fade-ins.
#[derive(Debug)]
pub struct FadeIn;
impl FadeIn {
    /// A linear fade-in.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(duration: impl Into<Duration>) -> Fade {
        Self::with_shape(duration, FadeShape::Linear)
    }

    #[allow(missing_docs)]
    pub fn with_shape(duration: impl Into<Duration>, shape: FadeShape) -> Fade {
        Fade {
            fade_in: true,
            duration: duration.into(),
            shape,
        }
    }
}

/// Builds fade-outs.
#[derive(Debug)]
pub struct FadeOut;
impl FadeOut {
    /// A linear fade-out.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(duration: impl Into<Duration>) -> Fade {
        Self::with_shape(duration, FadeShape::Linear)
    }

    #[allow(missing_docs)]
    pub fn with_shape(duration: impl Into<Duration>, shape: FadeShape) -> Fade {
        Fade {
            fade_in: false,
            duration: duration.into(),
            shape,
        }
    }
}

/// Builds crossfades. Concatenating across one fades out the earlier signal
/// while fading in the later one, which is pulled back to overlap it.
#[derive(Debug)]
pub struct CrossFade;
impl CrossFade {
    /// An equal-power crossfade.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(duration: impl Into<Duration>) -> BiTransform {
        Self::with_shape(duration, FadeShape::Polynomial(0.5))
    }

    #[allow(missing_docs)]
    pub fn with_shape(duration: impl Into<Duration>, shape: FadeShape) -> BiTransform {
        let duration = duration.into();
        BiTransform::new(
            FadeOut::with_shape(duration, shape),
            FadeIn::with_shape(duration, shape) * Shift::new(-duration),
        )
    }
}

/// An attack-hold-decay-sustain-release envelope, stretched over the whole
/// signal. The sustain portion fills whatever's left between decay and
/// release.
#[derive(Clone, Debug, Builder, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(rename_all = "kebab-case")]
pub struct Adsr {
    /// Rise from silence to full level.
    #[builder(setter(into))]
    attack: Duration,
    /// Time spent at full level after the attack.
    #[builder(setter(into))]
    hold: Duration,
    /// Fall from full level to the sustain level.
    #[builder(setter(into))]
    decay: Duration,
    /// Sustain level, as linear amplitude.
    #[derivative(Default(value = "1.0"))]
    sustain: f64,
    /// Fall from the sustain level to silence at the end of the signal.
    #[builder(setter(into))]
    release: Duration,
}
impl AdsrBuilder {
    fn validate(&self) -> core::result::Result<(), String> {
        for (what, d) in [
            ("attack", &self.attack),
            ("hold", &self.hold),
            ("decay", &self.decay),
            ("release", &self.release),
        ] {
            if let Some(d) = d {
                d.validate_non_negative(what).map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }
}
impl Adsr {
    #[allow(missing_docs)]
    pub fn new(
        attack: impl Into<Duration>,
        decay: impl Into<Duration>,
        sustain: f64,
        release: impl Into<Duration>,
    ) -> Self {
        Self {
            attack: attack.into(),
            hold: Duration::ZERO,
            decay: decay.into(),
            sustain,
            release: release.into(),
        }
    }

    fn head(&self) -> Curve {
        Curve::line(0.0, 1.0, self.attack)
            | Curve::constant(1.0, self.hold)
            | Curve::line(1.0, self.sustain, self.decay)
    }

    fn tail(&self) -> Curve {
        Curve::line(self.sustain, 0.0, self.release)
    }
}
impl Transform for Adsr {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        let sr = buffer.sample_rate();
        let head = self.head().flatten(sr)?;
        let tail = self.tail().flatten(sr)?;
        let len = buffer.len();
        if head.len() + tail.len() > len {
            return Err(Error::invalid_argument(format!(
                "envelope needs {} samples, but the signal has only {len}",
                head.len() + tail.len()
            )));
        }
        let tail_start = len - tail.len();
        for channel in buffer.channels_mut() {
            channel[..head.len()]
                .iter_mut()
                .zip(head.iter())
                .for_each(|(s, e)| *s *= e);
            channel[head.len()..tail_start]
                .iter_mut()
                .for_each(|s| *s *= self.sustain);
            channel[tail_start..]
                .iter_mut()
                .zip(tail.iter())
                .for_each(|(s, e)| *s *= e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Adsr"
    }
}
