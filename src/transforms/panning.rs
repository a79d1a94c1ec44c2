// Copyright (c) 2024 Mike Tsao

use super::amplitude::Level;
use crate::{
    audio::SampleBuffer,
    error::{Error, Result},
    traits::Transform,
    types::Decibels,
};
use core::f64::consts::LN_2;
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// Sums all channels into one. The sum isn't scaled down.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mono;
impl Transform for Mono {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        buffer.to_mono();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Mono"
    }
}

/// Maps a pan position to a gain for each stereo channel.
///
/// Positions run from `-width / 2` (hard left) to `width / 2` (hard right).
/// At center, each side is `law` dB down; at the extremes, the near side is at
/// 0 dB and the far side is silent.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub struct PanLaw {
    /// Level of each side at center, in dB. Usually negative.
    #[derivative(Default(value = "-3.0"))]
    pub law: f64,
    /// Distance from hard left to hard right.
    #[derivative(Default(value = "200.0"))]
    pub width: f64,
}
impl PanLaw {
    fn shape(&self, position: f64) -> f64 {
        (position / self.width + 0.5).ln() * (-self.law / LN_2)
    }

    /// Left-channel gain in dB.
    pub fn left_db(&self, position: f64) -> f64 {
        self.shape(-position)
    }

    /// Right-channel gain in dB.
    pub fn right_db(&self, position: f64) -> f64 {
        self.shape(position)
    }
}

/// Places a mono signal in the stereo field. The position can be constant or
/// follow a [Curve](crate::curves::Curve) for a sweep.
#[derive(Clone, Debug)]
pub struct Pan {
    position: Level,
    law: PanLaw,
}
impl Pan {
    #[allow(missing_docs)]
    pub fn new(position: impl Into<Level>) -> Self {
        Self {
            position: position.into(),
            law: PanLaw::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn with_law(mut self, law: PanLaw) -> Self {
        self.law = law;
        self
    }
}
impl Transform for Pan {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if !buffer.is_mono() {
            return Err(Error::UnsupportedOperation(format!(
                "panning needs a mono signal, but this one has {} channels",
                buffer.num_channels()
            )));
        }
        let sample_rate = buffer.sample_rate();
        buffer.broadcast_mono(2)?;
        let law = self.law;
        let channels = buffer.channels_mut();
        self.position.scale(&mut channels[0], sample_rate, |p| {
            Decibels(law.left_db(p)).to_amplitude()
        })?;
        self.position.scale(&mut channels[1], sample_rate, |p| {
            Decibels(law.right_db(p)).to_amplitude()
        })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Pan"
    }
}

/// Rearranges channels. Output channel `i` is a copy of input channel
/// `mapping[i]`, or silence for `None`. A source can feed several outputs.
#[derive(Clone, Debug)]
pub struct Repan {
    mapping: Vec<Option<usize>>,
}
impl Repan {
    #[allow(missing_docs)]
    pub fn new(mapping: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            mapping: mapping.into_iter().collect(),
        }
    }
}
impl Transform for Repan {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if self.mapping.is_empty() {
            return Err(Error::invalid_argument("repan needs at least one channel"));
        }
        let len = buffer.len();
        let num_channels = buffer.num_channels();
        let mut channels = Vec::with_capacity(self.mapping.len());
        for source in self.mapping.iter() {
            channels.push(match source {
                Some(i) if *i < num_channels => buffer.channels()[*i].clone(),
                Some(i) => {
                    return Err(Error::invalid_argument(format!(
                        "repan source channel {i} doesn't exist; there are {num_channels}"
                    )))
                }
                None => vec![0.0; len],
            });
        }
        buffer.replace_channels(channels)
    }

    fn name(&self) -> &'static str {
        "Repan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{curves::Curve, types::SampleRate};
    use float_cmp::approx_eq;

    fn mono(len: usize) -> SampleBuffer {
        SampleBuffer::from_samples(&vec![1.0; len], SampleRate(1000)).unwrap()
    }

    #[test]
    fn mono_sums() {
        let mut b =
            SampleBuffer::from_array(&[vec![1.0, 2.0], vec![3.0, 4.0]], SampleRate(1000)).unwrap();
        Mono.apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([4.0, 6.0].as_slice()));
        assert!(b.is_mono());
    }

    #[test]
    fn pan_law() {
        let law = PanLaw::default();
        assert!(approx_eq!(f64, law.left_db(0.0), -3.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, law.right_db(0.0), -3.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, law.right_db(100.0), 0.0, epsilon = 1e-12));
        assert_eq!(law.left_db(100.0), f64::NEG_INFINITY);
    }

    #[test]
    fn pan_center_and_hard_right() {
        let mut b = mono(3);
        Pan::new(0.0).apply(&mut b).unwrap();
        assert_eq!(b.num_channels(), 2);
        let center = Decibels(-3.0).to_amplitude();
        assert!(b
            .channels()
            .iter()
            .flatten()
            .all(|s| approx_eq!(f64, *s, center, epsilon = 1e-12)));

        let mut b = mono(3);
        Pan::new(100.0).apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([0.0; 3].as_slice()));
        assert!(approx_eq!(f64, b.channel(1).unwrap()[0], 1.0, epsilon = 1e-12));
    }

    #[test]
    fn pan_sweep_follows_curve() {
        let mut b = mono(6);
        Pan::new(Curve::line(-100.0, 100.0, 4)).apply(&mut b).unwrap();
        let left = b.channel(0).unwrap();
        let right = b.channel(1).unwrap();
        assert!(approx_eq!(f64, left[0], 1.0, epsilon = 1e-12));
        assert_eq!(right[0], 0.0);
        // After the sweep, the endpoint (hard right) holds.
        assert_eq!(left[5], 0.0);
        assert!(approx_eq!(f64, right[5], 1.0, epsilon = 1e-12));
    }

    #[test]
    fn pan_rejects_stereo() {
        let mut b = SampleBuffer::silent(2, 3, SampleRate(1000));
        assert!(Pan::new(0.0).apply(&mut b).is_err());
    }

    #[test]
    fn repan() {
        let mut b =
            SampleBuffer::from_array(&[vec![1.0, 2.0], vec![3.0, 4.0]], SampleRate(1000)).unwrap();
        Repan::new([Some(1), Some(0), None]).apply(&mut b).unwrap();
        assert_eq!(b.num_channels(), 3);
        assert_eq!(b.channel(0), Some([3.0, 4.0].as_slice()));
        assert_eq!(b.channel(1), Some([1.0, 2.0].as_slice()));
        assert_eq!(b.channel(2), Some([0.0, 0.0].as_slice()));

        assert!(Repan::new([Some(5)]).apply(&mut b).is_err());
    }
}
