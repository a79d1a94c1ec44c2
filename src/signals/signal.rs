// Copyright (c) 2024 Mike Tsao

use super::realize::Realizer;
use crate::{
    audio::{QuantizedBuffer, SampleBuffer},
    elements::{Oscillator, PinkNoise, Raw, Silence, Step, Waveform, WhiteNoise},
    error::Result,
    traits::{ContinuesPhase, Generates, Transform},
    transforms::{Amplitude, BiTransform, Combine, Slice, TransformChain},
    types::{ChannelSpan, Duration, SampleRate, TimeSpan},
    util::RenderSettings,
};
use core::fmt::{self, Display};
use std::sync::Arc;

/// What a [Signal] does before its own transforms run.
#[derive(Debug)]
pub(super) enum Node {
    /// Produces audio from parameters alone.
    Leaf(Arc<dyn Generates>),
    /// Children summed together.
    Mix(Vec<Signal>),
    /// Children placed end to end. `tail` is the right half of a
    /// [BiTransform] that hasn't met its next signal yet.
    Sequence {
        children: Vec<Signal>,
        tail: Option<TransformChain>,
    },
}

/// A description of sound that hasn't been rendered yet.
///
/// Signals form a tree. Leaves generate audio, a mix sums its children, and a
/// sequence plays its children one after another. Every node also carries a
/// chain of transforms that edit its audio once it exists. Nothing is
/// computed until [Signal::realize()].
///
/// A [Signal] is immutable. Every composition method returns a new signal
/// that shares its operands' subtrees, so a base signal can be reused in many
/// expressions without any of them affecting the others.
///
/// ```
/// use cadenza::prelude::*;
///
/// let tone = Signal::sine(440.0, 500.0);
/// let chord = tone.clone() + Signal::sine(550.0, 500.0);
/// let song = (tone | chord) * Gain::new(-6.0);
/// let buffer = song.realize(SampleRate(8000)).unwrap();
/// assert_eq!(buffer.len(), 8000);
/// ```
#[derive(Clone, Debug)]
pub struct Signal {
    node: Arc<Node>,
    transforms: Vec<Arc<dyn Transform>>,
}
impl Default for Signal {
    /// An empty mix, which realizes to an empty buffer.
    fn default() -> Self {
        Self::from_node(Node::Mix(Vec::default()))
    }
}
impl Signal {
    fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(node),
            transforms: Vec::default(),
        }
    }

    fn sequence(children: Vec<Signal>, tail: Option<TransformChain>) -> Self {
        Self::from_node(Node::Sequence { children, tail })
    }

    /// Wraps any generator as a leaf.
    pub fn leaf(generator: impl Generates + 'static) -> Self {
        Self::from_node(Node::Leaf(Arc::new(generator)))
    }

    /// Digital silence.
    pub fn silence(duration: impl Into<Duration>) -> Self {
        Self::leaf(Silence::new(duration))
    }

    /// A constant 1.0. One sample of it is an impulse.
    pub fn step(duration: impl Into<Duration>) -> Self {
        Self::leaf(Step::new(duration))
    }

    /// Seeded white noise.
    pub fn white_noise(duration: impl Into<Duration>, seed: u128) -> Self {
        Self::leaf(WhiteNoise::new(duration, seed))
    }

    /// Seeded pink noise.
    pub fn pink_noise(duration: impl Into<Duration>, seed: u128) -> Self {
        Self::leaf(PinkNoise::new(duration, seed))
    }

    /// Any [Oscillator], including one with a pinned phase.
    pub fn oscillator(oscillator: Oscillator) -> Self {
        Self::leaf(oscillator)
    }

    #[allow(missing_docs)]
    pub fn sine(
        frequency: impl Into<crate::elements::Frequency>,
        duration: impl Into<Duration>,
    ) -> Self {
        Self::oscillator(Oscillator::new(Waveform::Sine, frequency, duration))
    }

    #[allow(missing_docs)]
    pub fn triangle(
        frequency: impl Into<crate::elements::Frequency>,
        duration: impl Into<Duration>,
    ) -> Self {
        Self::oscillator(Oscillator::new(Waveform::Triangle, frequency, duration))
    }

    #[allow(missing_docs)]
    pub fn square(
        frequency: impl Into<crate::elements::Frequency>,
        duration: impl Into<Duration>,
    ) -> Self {
        Self::oscillator(Oscillator::new(Waveform::Square, frequency, duration))
    }

    #[allow(missing_docs)]
    pub fn sawtooth(
        frequency: impl Into<crate::elements::Frequency>,
        duration: impl Into<Duration>,
    ) -> Self {
        Self::oscillator(Oscillator::new(Waveform::Sawtooth, frequency, duration))
    }

    /// Prerecorded audio. It's shared, not copied, by every signal that
    /// uses it.
    pub fn raw(buffer: impl Into<Arc<SampleBuffer>>) -> Self {
        Self::leaf(Raw::new(buffer))
    }

    pub(super) fn node(&self) -> &Node {
        &self.node
    }

    /// This node's own transforms, in application order.
    pub fn transforms(&self) -> &[Arc<dyn Transform>] {
        &self.transforms
    }

    /// Returns this signal as a phase-continuing generator if it's a bare
    /// one: a leaf with no transforms.
    pub(super) fn as_phased(&self) -> Option<&dyn ContinuesPhase> {
        match self.node.as_ref() {
            Node::Leaf(generator) if self.transforms.is_empty() => generator.as_phased(),
            _ => None,
        }
    }

    // The children this signal contributes when spliced into a new mix.
    fn mix_parts(&self) -> Vec<Signal> {
        match self.node.as_ref() {
            Node::Mix(children) if self.transforms.is_empty() => children.clone(),
            _ => vec![self.clone()],
        }
    }

    // The children and pending tail this signal contributes when spliced into
    // a new sequence.
    fn sequence_parts(&self) -> (Vec<Signal>, Option<TransformChain>) {
        match self.node.as_ref() {
            Node::Sequence { children, tail } if self.transforms.is_empty() => {
                (children.clone(), tail.clone())
            }
            _ => (vec![self.clone()], None),
        }
    }

    /// Plays `self` and `other` at the same time.
    pub fn mix(&self, other: &Signal) -> Signal {
        let mut children = self.mix_parts();
        children.extend(other.mix_parts());
        Self::from_node(Node::Mix(children))
    }

    /// Plays all the signals at the same time. An empty mix is silent and
    /// zero-length.
    pub fn mix_all<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Signal {
        Self::from_node(Node::Mix(
            signals.into_iter().flat_map(|s| s.mix_parts()).collect(),
        ))
    }

    /// Plays `other` after `self` ends. If `self` ends with half of a
    /// [BiTransform], that half is applied to `other`. An empty `other`
    /// passes the half along to whatever comes next.
    pub fn concat(&self, other: &Signal) -> Signal {
        let (mut children, tail) = self.sequence_parts();
        let (other_children, other_tail) = other.sequence_parts();
        let mut other_children = other_children.into_iter();
        let Some(first) = other_children.next() else {
            let tail = match (tail, other_tail) {
                (Some(tail), Some(other_tail)) => Some(tail.then(other_tail)),
                (tail, other_tail) => tail.or(other_tail),
            };
            return Self::sequence(children, tail);
        };
        children.push(match tail {
            Some(tail) => first.apply(tail),
            None => first,
        });
        children.extend(other_children);
        Self::sequence(children, other_tail)
    }

    /// Plays the signals one after another.
    pub fn concat_all<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Signal {
        signals
            .into_iter()
            .fold(Self::sequence(Vec::default(), None), |acc, s| acc.concat(s))
    }

    /// Splits a [BiTransform] across the end of this signal: its left chain
    /// applies to this signal, and its right chain waits for whatever is
    /// concatenated next.
    pub fn concat_bi(&self, bi: &BiTransform) -> Signal {
        let (mut children, tail) = self.sequence_parts();
        match children.pop() {
            Some(last) => children.push(last.apply(bi.left.clone())),
            None => log::warn!("a crossfade's leading half has nothing to act on"),
        }
        let tail = match tail {
            Some(tail) => tail.then(bi.right.clone()),
            None => bi.right.clone(),
        };
        Self::sequence(children, Some(tail))
    }

    /// Adds silence at the end.
    pub fn concat_silence(&self, duration: impl Into<Duration>) -> Signal {
        self.concat(&Signal::silence(duration))
    }

    /// Returns a new signal that applies `transform` after this one's own
    /// transforms. A bare number scales amplitude.
    pub fn apply(&self, transform: impl Into<TransformChain>) -> Signal {
        let mut r = self.clone();
        r.transforms.extend(transform.into().into_transforms());
        r
    }

    /// Scales amplitude.
    pub fn amplitude(&self, factor: f64) -> Signal {
        self.apply(Amplitude::new(factor))
    }

    /// Plays this signal `count` times in a row.
    pub fn repeat(&self, count: usize) -> Signal {
        Self::concat_all(core::iter::repeat(self).take(count))
    }

    /// A rectangle of this signal: some channels, some stretch of time.
    pub fn slice(&self, channels: impl Into<ChannelSpan>, time: impl Into<TimeSpan>) -> Signal {
        self.apply(Slice::new(channels, time))
    }

    /// This signal with `other` written over a rectangle of it.
    pub fn combine(
        &self,
        channels: impl Into<ChannelSpan>,
        time: impl Into<TimeSpan>,
        other: &Signal,
    ) -> Signal {
        self.apply(Combine::new(channels, time, other))
    }

    /// How long the signal is before transforms, if that can be known without
    /// rendering. Mixes last as long as their longest child and sequences as
    /// long as all their children together. Children measured in different
    /// units (samples and milliseconds) make the answer unknowable until a
    /// sample rate is picked.
    pub fn duration(&self) -> Option<Duration> {
        match self.node.as_ref() {
            Node::Leaf(generator) => generator.duration(),
            Node::Mix(children) => children
                .iter()
                .try_fold(Duration::ZERO, |acc, c| match acc {
                    Duration::Samples(0) => c.duration(),
                    _ => acc.checked_max(&c.duration()?),
                }),
            Node::Sequence { children, .. } => {
                children
                    .iter()
                    .try_fold(Duration::ZERO, |acc, c| match acc {
                        Duration::Samples(0) => c.duration(),
                        _ => acc.checked_add(&c.duration()?),
                    })
            }
        }
    }

    /// Renders the signal into audio at the given rate.
    pub fn realize(&self, sample_rate: SampleRate) -> Result<SampleBuffer> {
        Realizer::new(sample_rate, true)?.realize(self)
    }

    /// Renders the signal into audio as `settings` describe.
    pub fn realize_with(&self, settings: &RenderSettings) -> Result<SampleBuffer> {
        Realizer::new(settings.sample_rate(), settings.parallel_mix())?.realize(self)
    }

    /// Renders the signal and quantizes it, ready for encoding.
    pub fn render(&self, settings: &RenderSettings) -> Result<QuantizedBuffer> {
        self.realize_with(settings)?
            .mixdown(settings.byte_width(), settings.max_amplitude())
    }
}
impl Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Signal]) -> fmt::Result {
            for (i, c) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " + ")?;
                }
                write!(f, "{c}")?;
            }
            Ok(())
        }

        match self.node.as_ref() {
            Node::Leaf(generator) => write!(f, "{}", generator.name())?,
            Node::Mix(children) => {
                write!(f, "(")?;
                join(f, children)?;
                write!(f, ")")?;
            }
            Node::Sequence { children, .. } => {
                write!(f, "[")?;
                join(f, children)?;
                write!(f, "]")?;
            }
        }
        if !self.transforms.is_empty() {
            let names: Vec<&str> = self.transforms.iter().map(|t| t.name()).collect();
            write!(f, "*({})", names.join(","))?;
        }
        Ok(())
    }
}
