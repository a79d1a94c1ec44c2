// Copyright (c) 2024 Mike Tsao

//! Transforms edit realized audio in place. They compose with `*`, left
//! operand first: `Gain::new(6.0) * Clip::new(0.5)` boosts, then clips.
//! Order matters; the reverse chain sounds different.

use crate::{audio::SampleBuffer, error::Result, traits::Transform};
use core::ops::Mul;
use std::sync::Arc;

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        Adsr, Amplitude, BiQuad, BiTransform, Clip, Combine, Convolution, CrossFade, Downsample,
        Extend, Fade, FadeIn, FadeOut, Fir, Gain, Iir, Limiter, Mono, MovingAverage,
        OneImpulseReverb, Pan, Repan, Reverse, Shift, SimpleBandPass, SimpleBandStop,
        SimpleHighPass, SimpleHighShelf, SimpleLowPass, SimpleLowShelf, SimpleNotch, SineAm, Slice,
        Stretch, TransformChain,
    };
}

pub use {
    amplitude::{Amplitude, Gain, Level, SineAm},
    convolution::{Convolution, OneImpulseReverb, ReverbCurve},
    envelope::{Adsr, AdsrBuilder, CrossFade, Fade, FadeBuilder, FadeIn, FadeOut, FadeShape},
    filter::{
        BiQuad, BiQuadKind, Fir, Iir, MovingAverage, SimpleBandPass, SimpleBandStop,
        SimpleHighPass, SimpleHighShelf, SimpleLowPass, SimpleLowShelf, SimpleNotch,
    },
    limiter::{Clip, Limiter, LimiterBuilder, Threshold},
    panning::{Mono, Pan, PanLaw, Repan},
    slicing::{Combine, Slice},
    time::{Downsample, Extend, Reverse, Shift, Stretch, StretchRate},
};

mod amplitude;
mod convolution;
mod envelope;
mod filter;
mod limiter;
mod panning;
mod slicing;
mod time;

/// An ordered list of transforms that is itself a [Transform]. Applying it
/// applies each member in turn.
#[derive(Clone, Debug, Default)]
pub struct TransformChain {
    transforms: Vec<Arc<dyn Transform>>,
}
impl TransformChain {
    /// A chain of one.
    pub fn new(transform: impl Transform + 'static) -> Self {
        Self {
            transforms: vec![Arc::new(transform)],
        }
    }

    /// Appends another chain to the end of this one.
    pub fn then(mut self, other: impl Into<TransformChain>) -> Self {
        self.transforms.extend(other.into().transforms);
        self
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// The members, in application order.
    pub fn transforms(&self) -> &[Arc<dyn Transform>] {
        &self.transforms
    }

    /// Gives up the members, in application order.
    pub fn into_transforms(self) -> Vec<Arc<dyn Transform>> {
        self.transforms
    }
}
impl Transform for TransformChain {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        for t in self.transforms.iter() {
            t.apply(buffer)?;
            buffer.check_shape()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TransformChain"
    }
}
impl From<Arc<dyn Transform>> for TransformChain {
    fn from(value: Arc<dyn Transform>) -> Self {
        Self {
            transforms: vec![value],
        }
    }
}
impl From<Vec<Arc<dyn Transform>>> for TransformChain {
    fn from(value: Vec<Arc<dyn Transform>>) -> Self {
        Self { transforms: value }
    }
}
/// A bare number scales amplitude.
impl From<f64> for TransformChain {
    fn from(value: f64) -> Self {
        Self::new(Amplitude::new(value))
    }
}
impl<R: Into<TransformChain>> Mul<R> for TransformChain {
    type Output = TransformChain;

    fn mul(self, rhs: R) -> Self::Output {
        self.then(rhs)
    }
}

/// A pair of chains that act on either side of a concatenation. `left`
/// applies to the signal that ends at the boundary and `right` to the one that
/// starts there. A [BiTransform] is never applied directly; it's consumed
/// when a sequence is built with `|`.
#[derive(Clone, Debug, Default)]
pub struct BiTransform {
    /// Applied to the earlier signal.
    pub left: TransformChain,
    /// Applied to the later signal.
    pub right: TransformChain,
}
impl BiTransform {
    #[allow(missing_docs)]
    pub fn new(left: impl Into<TransformChain>, right: impl Into<TransformChain>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Lets a concrete transform start a chain with `*` and convert into one.
macro_rules! impl_transform_ops {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for TransformChain {
                fn from(value: $t) -> Self {
                    TransformChain::new(value)
                }
            }
            impl<R: Into<TransformChain>> core::ops::Mul<R> for $t {
                type Output = TransformChain;

                fn mul(self, rhs: R) -> Self::Output {
                    TransformChain::new(self).then(rhs)
                }
            }
        )*
    };
}

impl_transform_ops!(
    Adsr,
    Amplitude,
    BiQuad,
    Clip,
    Combine,
    Convolution,
    Downsample,
    Extend,
    Fade,
    Fir,
    Gain,
    Iir,
    Limiter,
    Mono,
    MovingAverage,
    OneImpulseReverb,
    Pan,
    Repan,
    Reverse,
    Shift,
    SimpleBandPass,
    SimpleBandStop,
    SimpleHighPass,
    SimpleHighShelf,
    SimpleLowPass,
    SimpleLowShelf,
    SimpleNotch,
    SineAm,
    Slice,
    Stretch,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleRate;

    #[derive(Debug)]
    struct Append(f64);
    impl Transform for Append {
        fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
            for c in buffer.channels_mut() {
                c.push(self.0);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Append"
        }
    }

    #[derive(Debug)]
    struct Ragged;
    impl Transform for Ragged {
        fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
            buffer.channels_mut()[0].push(1.0);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Ragged"
        }
    }

    #[test]
    fn chains_apply_left_first() {
        let chain = TransformChain::new(Append(1.0)) * TransformChain::new(Append(2.0));
        let chain = chain * TransformChain::new(Append(3.0));
        assert_eq!(chain.len(), 3);

        let mut b = SampleBuffer::new(SampleRate::default());
        chain.apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([1.0, 2.0, 3.0].as_slice()));
    }

    #[test]
    fn concrete_transforms_compose() {
        let chain = Gain::new(6.0) * Reverse * 0.5;
        let names: Vec<&str> = chain.transforms().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Gain", "Reverse", "Amplitude"]);
    }

    #[test]
    fn chain_catches_ragged_output() {
        let chain = TransformChain::new(Ragged);
        let mut b = SampleBuffer::silent(2, 3, SampleRate::default());
        assert!(matches!(
            chain.apply(&mut b),
            Err(crate::Error::ShapeInvariantViolation(_))
        ));
    }
}
