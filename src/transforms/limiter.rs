// Copyright (c) 2024 Mike Tsao

use crate::{audio::SampleBuffer, error::Result, traits::Transform};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Where a [Limiter] draws a line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Threshold {
    /// An absolute sample value.
    Amplitude(f64),
    /// A fraction of the buffer's peak at the time the limiter runs.
    Ratio(f64),
}
impl Threshold {
    fn resolve(&self, peak: f64) -> f64 {
        match self {
            Threshold::Amplitude(amplitude) => *amplitude,
            Threshold::Ratio(ratio) => ratio * peak,
        }
    }

    fn validate(&self) -> core::result::Result<(), String> {
        match self {
            Threshold::Amplitude(a) if !(*a >= 0.0) => {
                Err(format!("limiter amplitude must be non-negative, got {a}"))
            }
            Threshold::Ratio(r) if !(*r > 0.0 && *r <= 1.0) => {
                Err(format!("limiter ratio must be in (0, 1], got {r}"))
            }
            _ => Ok(()),
        }
    }
}

/// Clamps sample magnitudes. Anything louder than `maximum` is cut to it, and
/// anything quieter than `minimum` is pushed out to it, keeping its sign.
/// Exact zeros stay silent. Either side can be left open.
#[derive(Clone, Debug, Builder, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(rename_all = "kebab-case")]
pub struct Limiter {
    /// The loudest magnitude allowed.
    #[builder(setter(strip_option))]
    maximum: Option<Threshold>,

    /// The quietest magnitude allowed.
    #[builder(setter(strip_option))]
    minimum: Option<Threshold>,
}
impl LimiterBuilder {
    fn validate(&self) -> core::result::Result<(), String> {
        if let Some(Some(t)) = &self.maximum {
            t.validate()?;
        }
        if let Some(Some(t)) = &self.minimum {
            t.validate()?;
        }
        Ok(())
    }
}
#[allow(missing_docs)]
impl Limiter {
    pub fn maximum(&self) -> Option<Threshold> {
        self.maximum
    }

    pub fn minimum(&self) -> Option<Threshold> {
        self.minimum
    }
}
impl Transform for Limiter {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if let Some(maximum) = self.maximum {
            let max = maximum.resolve(buffer.peak());
            buffer
                .channels_mut()
                .iter_mut()
                .flatten()
                .for_each(|s| *s = s.clamp(-max, max));
        }
        if let Some(minimum) = self.minimum {
            let min = minimum.resolve(buffer.peak());
            buffer
                .channels_mut()
                .iter_mut()
                .flatten()
                .filter(|s| **s != 0.0)
                .for_each(|s| *s = s.signum() * s.abs().max(min));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Limiter"
    }
}

/// Hard clipping at a fixed amplitude.
#[derive(Clone, Debug)]
pub struct Clip(Limiter);
impl Clip {
    /// Clips to `[-max, max]`.
    pub fn new(max: f64) -> Self {
        Self(Limiter {
            maximum: Some(Threshold::Amplitude(max.abs())),
            minimum: None,
        })
    }
}
impl Transform for Clip {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        self.0.apply(buffer)
    }

    fn name(&self) -> &'static str {
        "Clip"
    }
}
