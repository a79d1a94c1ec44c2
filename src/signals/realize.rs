// Copyright (c) 2024 Mike Tsao

//! Walks a signal tree bottom-up and turns it into audio.

use super::signal::{Node, Signal};
use crate::{
    audio::SampleBuffer,
    error::{Error, Result},
    traits::{Generates, Transform},
    transforms::TransformChain,
    types::SampleRate,
};
use std::sync::Arc;

/// One realize pass. Holds nothing but the pass's parameters, so realizing
/// is a pure function of the tree and the sample rate.
#[derive(Clone, Copy, Debug)]
pub(super) struct Realizer {
    sample_rate: SampleRate,
    parallel_mix: bool,
}
impl Realizer {
    pub(super) fn new(sample_rate: SampleRate, parallel_mix: bool) -> Result<Self> {
        Ok(Self {
            sample_rate: SampleRate::try_new(sample_rate.0)?,
            parallel_mix,
        })
    }

    pub(super) fn realize(&self, signal: &Signal) -> Result<SampleBuffer> {
        let mut buffer = match signal.node() {
            Node::Leaf(generator) => self.generate(generator.as_ref())?,
            Node::Mix(children) => self.mix(children)?,
            Node::Sequence { children, tail } => self.sequence(children, tail.as_ref())?,
        };
        self.apply_transforms(signal.transforms(), &mut buffer)?;
        Ok(buffer)
    }

    fn generate(&self, generator: &dyn Generates) -> Result<SampleBuffer> {
        let buffer = generator.generate(self.sample_rate)?;
        buffer.check_shape()?;
        log::debug!(
            "generated {}: {} channel(s) x {} samples",
            generator.name(),
            buffer.num_channels(),
            buffer.len()
        );
        Ok(buffer)
    }

    fn apply_transforms(
        &self,
        transforms: &[Arc<dyn Transform>],
        buffer: &mut SampleBuffer,
    ) -> Result<()> {
        for t in transforms {
            t.apply(buffer)?;
            buffer.check_shape()?;
            log::debug!(
                "applied {}: {} channel(s) x {} samples, shift {}",
                t.name(),
                buffer.num_channels(),
                buffer.len(),
                buffer.shift()
            );
        }
        Ok(())
    }

    fn mix(&self, children: &[Signal]) -> Result<SampleBuffer> {
        let mixed = if self.parallel_mix && children.len() > 1 {
            self.mix_in_parallel(children)?
        } else {
            self.fold_mix(children)?
        };
        log::debug!(
            "mixed {} children into {} samples",
            children.len(),
            mixed.len()
        );
        Ok(mixed)
    }

    // Realizes each child and sums it into a running total, so only the total
    // and one child are alive at a time.
    fn fold_mix(&self, children: &[Signal]) -> Result<SampleBuffer> {
        let mut mixed = SampleBuffer::new(self.sample_rate);
        for child in children {
            mixed.mix(self.realize(child)?)?;
            mixed.check_shape()?;
        }
        Ok(mixed)
    }

    // Splits the children into one contiguous run per available core. Each
    // worker folds its run, and the partial mixes are folded in run order.
    // Workers mix serially below this point, so a pass never has more threads
    // than cores.
    fn mix_in_parallel(&self, children: &[Signal]) -> Result<SampleBuffer> {
        let workers = std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .min(children.len());
        let run_length = children.len().div_ceil(workers);
        let serial = Self {
            sample_rate: self.sample_rate,
            parallel_mix: false,
        };
        let partials = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = children
                .chunks(run_length)
                .map(|run| s.builder().spawn(move |_| serial.fold_mix(run)))
                .collect();
            handles
                .into_iter()
                .map(|h| match h {
                    Ok(h) => h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)),
                    Err(e) => Err(Error::UnsupportedOperation(format!(
                        "couldn't start a mix worker: {e}"
                    ))),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e));

        let mut mixed = SampleBuffer::new(self.sample_rate);
        for partial in partials {
            mixed.mix(partial?)?;
            mixed.check_shape()?;
        }
        Ok(mixed)
    }

    // Children are realized in order and folded in as they arrive, so only
    // the running total and one child are alive at a time.
    fn sequence(&self, children: &[Signal], tail: Option<&TransformChain>) -> Result<SampleBuffer> {
        if tail.is_some() {
            log::warn!("a sequence ends with half a crossfade; ignoring it");
        }
        let mut sequence = SampleBuffer::new(self.sample_rate);
        let mut phase = 0.0;
        for child in children {
            let buffer = match child.as_phased() {
                Some(phased) if !phased.has_explicit_phase() => {
                    let (buffer, end_phase) =
                        phased.generate_from_phase(self.sample_rate, phase)?;
                    buffer.check_shape()?;
                    phase = end_phase;
                    buffer
                }
                _ => {
                    phase = 0.0;
                    self.realize(child)?
                }
            };
            sequence.concat(buffer)?;
            sequence.check_shape()?;
        }
        log::debug!(
            "sequenced {} children into {} samples",
            children.len(),
            sequence.len()
        );
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        elements::{Oscillator, Waveform},
        transforms::{CrossFade, Shift},
        types::Duration,
    };
    use float_cmp::approx_eq;

    const SR: SampleRate = SampleRate(1000);

    #[derive(Debug)]
    struct Ragged;
    impl Transform for Ragged {
        fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
            buffer.pad_channels(2);
            buffer.channels_mut()[1].push(1.0);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Ragged"
        }
    }

    fn samples(signal: &Signal) -> Vec<f64> {
        signal.realize(SR).unwrap().channel(0).unwrap().to_vec()
    }

    #[test]
    fn leaves_and_transforms() {
        let s = Signal::step(4) * 0.5;
        assert_eq!(samples(&s), vec![0.5; 4]);
        assert!(matches!(
            Signal::silence(-5).realize(SR),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn ragged_transforms_are_caught() {
        let s = Signal::step(4).apply(Arc::new(Ragged) as Arc<dyn Transform>);
        assert!(matches!(
            s.realize(SR),
            Err(Error::ShapeInvariantViolation(_))
        ));
    }

    #[test]
    fn mix_pads_and_aligns() {
        let s = Signal::step(3) + (Signal::step(2) * Shift::new(2));
        assert_eq!(samples(&s), vec![1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn parallel_and_serial_mixes_agree() {
        let s = Signal::white_noise(50, 1)
            + Signal::sine(100.0, 30)
            + (Signal::step(10) | Signal::pink_noise(20, 2));
        let parallel = Realizer::new(SR, true).unwrap().realize(&s).unwrap();
        let serial = Realizer::new(SR, false).unwrap().realize(&s).unwrap();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn wide_mixes_realize() {
        let notes: Vec<Signal> = (0..30_000)
            .map(|i| Signal::step(2) * Shift::new(i % 100))
            .collect();
        let chord = Signal::mix_all(&notes);
        let parallel = chord.realize(SR).unwrap();
        assert_eq!(parallel.len(), 101);
        assert_eq!(parallel.channel(0).unwrap()[0], 300.0);
        assert_eq!(parallel.channel(0).unwrap()[50], 600.0);
        assert_eq!(parallel.channel(0).unwrap()[100], 300.0);

        let serial = Realizer::new(SR, false).unwrap().realize(&chord).unwrap();
        assert_eq!(parallel, serial);

        // A mix inside a mix stays bounded too.
        let nested = Signal::mix_all([&chord * 1.0, &chord * 1.0].iter());
        assert_eq!(nested.realize(SR).unwrap().channel(0).unwrap()[50], 1200.0);
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        for s in [Signal::sine(440.0, 10), Signal::step(3) + Signal::silence(2)] {
            assert!(matches!(
                s.realize(SampleRate(0)),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn sequence_places_children_end_to_end() {
        let s = Signal::step(2) | Signal::silence(1) | (Signal::step(1) * -1.0);
        assert_eq!(samples(&s), vec![1.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn phase_carries_across_oscillators() {
        // 2.5 cycles, so the second note starts half a cycle in.
        let split = Signal::sine(100.0, 25) | Signal::sine(100.0, 25);
        let whole = Signal::sine(100.0, 50);
        let a = samples(&split);
        let b = samples(&whole);
        assert_eq!(a.len(), 50);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(approx_eq!(f64, *x, *y, epsilon = 1e-9));
        }
    }

    #[test]
    fn phase_resets_after_anything_else() {
        let pinned = Oscillator::new(Waveform::Sine, 100.0, 25).with_phase(0.0);
        for breaker in [
            Signal::sine(100.0, 25) * 1.0,
            Signal::oscillator(pinned),
            Signal::silence(25),
        ] {
            let s = Signal::sine(100.0, 25) | breaker | Signal::sine(100.0, 25);
            let v = samples(&s);
            let fresh = samples(&Signal::sine(100.0, 25));
            assert_eq!(&v[50..], fresh.as_slice());
        }
    }

    #[test]
    fn crossfade_overlaps() {
        let s = Signal::step(10) | CrossFade::new(4) | Signal::step(10);
        let v = samples(&s);
        assert_eq!(v.len(), 16);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[15], 1.0);
    }

    #[test]
    fn dangling_crossfade_is_dropped() {
        let s = Signal::step(10) | CrossFade::new(4);
        assert_eq!(s.realize(SR).unwrap().len(), 10);
    }

    #[test]
    fn empty_nodes() {
        assert!(Signal::default().realize(SR).unwrap().is_empty());
        assert!(Signal::concat_all(core::iter::empty()).realize(SR).unwrap().is_empty());
        assert_eq!(
            Signal::silence(Duration::ZERO).realize(SR).unwrap().len(),
            0
        );
    }
}
