// Copyright (c) 2024 Mike Tsao

use crate::{
    audio::SampleBuffer,
    error::{Error, Result},
    traits::Transform,
    types::SampleRate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

// The middle `x.len()` samples of the full convolution of `x` and `h`.
fn convolve_same(x: &[f64], h: &[f64]) -> Vec<f64> {
    let n = x.len();
    let m = h.len();
    if n == 0 || m == 0 {
        return vec![0.0; n];
    }
    let offset = (m - 1) / 2;
    (0..n)
        .map(|out| {
            let k = out + offset;
            let first = k.saturating_sub(n - 1);
            let last = k.min(m - 1);
            (first..=last).map(|j| h[j] * x[k - j]).sum()
        })
        .collect()
}

/// Convolves the signal with an impulse response, keeping the signal's length.
///
/// A mono response is applied to every channel. A mono signal takes on the
/// response's channel count, one response channel per output channel.
/// Otherwise the channel counts must match, and channels pair up.
#[derive(Clone, Debug)]
pub struct Convolution {
    response: Arc<SampleBuffer>,
}
impl Convolution {
    #[allow(missing_docs)]
    pub fn new(response: SampleBuffer) -> Self {
        Self {
            response: Arc::new(response),
        }
    }

    /// A mono response from raw samples.
    pub fn from_samples(response: Vec<f64>) -> Self {
        Self::new(SampleBuffer::mono(response, SampleRate::default()))
    }

    #[allow(missing_docs)]
    pub fn response(&self) -> &SampleBuffer {
        &self.response
    }
}
impl Transform for Convolution {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        let response = self.response.channels();
        if response.len() == 1 {
            for channel in buffer.channels_mut() {
                *channel = convolve_same(channel, &response[0]);
            }
            return Ok(());
        }
        if buffer.is_mono() {
            buffer.broadcast_mono(response.len())?;
        }
        if buffer.num_channels() != response.len() {
            return Err(Error::ChannelMismatch {
                expected: buffer.num_channels(),
                found: response.len(),
            });
        }
        for (channel, h) in buffer.channels_mut().iter_mut().zip(response.iter()) {
            *channel = convolve_same(channel, h);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Convolution"
    }
}

/// The decay shape of a [OneImpulseReverb] response.
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
pub enum ReverbCurve {
    /// Falls in a straight line from the mix level to zero.
    #[default]
    Linear,
    /// Falls as 1/n.
    Steep,
}

/// A cheap reverb: convolution with a single decaying response.
#[derive(Clone, Debug)]
pub struct OneImpulseReverb {
    inner: Convolution,
}
impl Default for OneImpulseReverb {
    fn default() -> Self {
        Self::new(0.5, 1000, ReverbCurve::Linear)
    }
}
impl OneImpulseReverb {
    /// `num` is the response length in samples.
    pub fn new(mix: f64, num: usize, curve: ReverbCurve) -> Self {
        let response: Vec<f64> = match curve {
            ReverbCurve::Linear => (0..num)
                .map(|i| {
                    if num > 1 {
                        mix * (1.0 - i as f64 / (num - 1) as f64)
                    } else {
                        mix
                    }
                })
                .collect(),
            ReverbCurve::Steep => (0..num).map(|i| 1.0 / (i + 1) as f64).collect(),
        };
        Self {
            inner: Convolution::from_samples(response),
        }
    }
}
impl Transform for OneImpulseReverb {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        self.inner.apply(buffer)
    }

    fn name(&self) -> &'static str {
        "OneImpulseReverb"
    }
}
