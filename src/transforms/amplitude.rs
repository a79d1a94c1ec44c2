// Copyright (c) 2024 Mike Tsao

use crate::{
    audio::SampleBuffer,
    curves::Curve,
    error::{Error, Result},
    traits::Transform,
    types::{Decibels, SampleRate},
};
use core::f64::consts::PI;

/// A per-channel level: either fixed, or following a [Curve] over time.
#[derive(Clone, Debug)]
pub enum Level {
    #[allow(missing_docs)]
    Constant(f64),
    /// Sampled once per audio sample. Once the curve runs out, its endpoint
    /// holds for the rest of the buffer.
    Curve(Curve),
}
impl From<f64> for Level {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}
impl From<Curve> for Level {
    fn from(value: Curve) -> Self {
        Self::Curve(value)
    }
}
impl Level {
    // Multiplies each sample by `to_factor` of the level at that time.
    pub(super) fn scale(
        &self,
        channel: &mut [f64],
        sample_rate: SampleRate,
        to_factor: impl Fn(f64) -> f64,
    ) -> Result<()> {
        match self {
            Level::Constant(value) => {
                let factor = to_factor(*value);
                channel.iter_mut().for_each(|s| *s *= factor);
            }
            Level::Curve(curve) => {
                let values = curve.flatten(sample_rate)?;
                let split = values.len().min(channel.len());
                let (head, tail) = channel.split_at_mut(split);
                head.iter_mut()
                    .zip(values.iter())
                    .for_each(|(s, v)| *s *= to_factor(*v));
                let hold = to_factor(curve.endpoint(sample_rate));
                tail.iter_mut().for_each(|s| *s *= hold);
            }
        }
        Ok(())
    }
}

// A single level covers every channel; otherwise level i goes to channel i.
fn scale_channels(
    levels: &[Level],
    buffer: &mut SampleBuffer,
    to_factor: impl Fn(f64) -> f64 + Copy,
) -> Result<()> {
    let sample_rate = buffer.sample_rate();
    let num_channels = buffer.num_channels();
    if levels.len() > num_channels && levels.len() > 1 {
        return Err(Error::ChannelMismatch {
            expected: num_channels,
            found: levels.len(),
        });
    }
    if let [level] = levels {
        for channel in buffer.channels_mut() {
            level.scale(channel, sample_rate, to_factor)?;
        }
    } else {
        for (channel, level) in buffer.channels_mut().iter_mut().zip(levels.iter()) {
            level.scale(channel, sample_rate, to_factor)?;
        }
    }
    Ok(())
}

/// Multiplies the signal by a linear factor, constant or time-varying.
#[derive(Clone, Debug)]
pub struct Amplitude {
    levels: Vec<Level>,
}
impl Amplitude {
    /// The same factor on every channel.
    pub fn new(level: impl Into<Level>) -> Self {
        Self {
            levels: vec![level.into()],
        }
    }

    /// One factor per channel, in channel order.
    pub fn per_channel(levels: Vec<Level>) -> Self {
        Self { levels }
    }
}
impl Transform for Amplitude {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        scale_channels(&self.levels, buffer, |v| v)
    }

    fn name(&self) -> &'static str {
        "Amplitude"
    }
}

/// Adds or removes gain, in decibels, constant or time-varying.
#[derive(Clone, Debug)]
pub struct Gain {
    levels: Vec<Level>,
}
impl Gain {
    /// The same gain on every channel.
    pub fn new(db: impl Into<Level>) -> Self {
        Self {
            levels: vec![db.into()],
        }
    }

    /// One gain per channel, in channel order.
    pub fn per_channel(db: Vec<Level>) -> Self {
        Self { levels: db }
    }
}
impl Transform for Gain {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        scale_channels(&self.levels, buffer, |db| Decibels(db).to_amplitude())
    }

    fn name(&self) -> &'static str {
        "Gain"
    }
}

/// Tremolo: amplitude modulated by a sine wave. `size` is the modulation
/// depth; 0 leaves the signal alone and 1 swings it fully between silence and
/// full level.
#[derive(Clone, Debug)]
pub struct SineAm {
    frequency: f64,
    size: f64,
    phase: f64,
}
impl SineAm {
    #[allow(missing_docs)]
    pub fn new(frequency: f64, size: f64) -> Self {
        Self {
            frequency,
            size,
            phase: 0.0,
        }
    }

    /// Starts the modulating sine at `phase` radians.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }
}
impl Transform for SineAm {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        let sr = buffer.sample_rate().0 as f64;
        let envelope: Vec<f64> = (0..buffer.len())
            .map(|i| {
                let t = i as f64 / sr;
                (self.phase + 2.0 * PI * self.frequency * t).sin() * self.size + (1.0 - self.size)
            })
            .collect();
        for channel in buffer.channels_mut() {
            channel
                .iter_mut()
                .zip(envelope.iter())
                .for_each(|(s, e)| *s *= e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SineAM"
    }
}
