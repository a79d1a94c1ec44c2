// Copyright (c) 2024 Mike Tsao

//! The traits that connect signals, generators, and transforms.

use crate::{
    audio::SampleBuffer,
    error::Result,
    types::{Duration, SampleRate},
};

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{ContinuesPhase, Generates, Transform};
}

/// Something that [Generates] produces raw audio from its own parameters.
/// It's what sits at the leaves of a signal tree.
///
/// Generation must be a pure function of the generator's parameters and the
/// requested sample rate: realizing the same leaf twice gives bit-identical
/// buffers. Generators that want randomness carry a seed.
pub trait Generates: Send + Sync + core::fmt::Debug {
    /// Produces a fresh buffer at the given sample rate.
    fn generate(&self, sample_rate: SampleRate) -> Result<SampleBuffer>;

    /// The length of the output, if it's known before rendering.
    fn duration(&self) -> Option<Duration> {
        None
    }

    /// A short name for printing signal trees.
    fn name(&self) -> &'static str;

    /// Returns `Some` for generators whose phase can carry across a sequence
    /// boundary.
    fn as_phased(&self) -> Option<&dyn ContinuesPhase> {
        None
    }
}

/// A periodic generator that can start at an arbitrary phase and report where
/// it stopped, so that a tone split across a sequence doesn't click.
pub trait ContinuesPhase {
    /// Whether the caller pinned a starting phase. Pinned phases are never
    /// overridden.
    fn has_explicit_phase(&self) -> bool;

    /// Generates starting at `phase` radians and returns the buffer along with
    /// the phase the next sample would have had.
    fn generate_from_phase(&self, sample_rate: SampleRate, phase: f64)
        -> Result<(SampleBuffer, f64)>;
}

/// A [Transform] edits a realized buffer in place. It's what effects,
/// envelopes, filters, and time edits do.
///
/// Implementations must leave every channel the same length; the realize pass
/// checks after each application. Transforms are immutable once built, so the
/// same one can be shared by many signals.
pub trait Transform: Send + Sync + core::fmt::Debug {
    /// Edits the buffer.
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()>;

    /// A short name for printing signal trees.
    fn name(&self) -> &'static str;

    /// For transforms that act over a span of time, how many samples that span
    /// covers at the given rate.
    #[allow(unused_variables)]
    fn required_samples(&self, sample_rate: SampleRate) -> Option<usize> {
        None
    }
}
