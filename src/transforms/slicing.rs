// Copyright (c) 2024 Mike Tsao

use crate::{
    audio::SampleBuffer,
    error::{Error, Result},
    signals::Signal,
    traits::Transform,
    types::{ChannelSpan, TimeSpan},
};

/// Keeps only a rectangle of the buffer: some channels, some stretch of time.
///
/// Reading past the last channel or past either end in time is an error, with
/// one exception: a mono buffer stands for "the same thing on every channel,"
/// so asking it for channels `0..k` broadcasts it to `k` channels first.
#[derive(Clone, Debug, Default)]
pub struct Slice {
    channels: ChannelSpan,
    time: TimeSpan,
}
impl Slice {
    #[allow(missing_docs)]
    pub fn new(channels: impl Into<ChannelSpan>, time: impl Into<TimeSpan>) -> Self {
        Self {
            channels: channels.into(),
            time: time.into(),
        }
    }
}
impl Transform for Slice {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if buffer.is_mono() && self.channels.start == 0 {
            if let Some(end) = self.channels.end {
                if end > 1 {
                    buffer.broadcast_mono(end)?;
                }
            }
        }
        let channels = self.channels.resolve(buffer.num_channels())?.indices();
        let times = self
            .time
            .resolve(buffer.len(), buffer.sample_rate())?
            .indices();
        if channels.is_empty() {
            return Err(Error::invalid_argument("slice selects no channels"));
        }
        let sliced: Vec<Vec<f64>> = channels
            .iter()
            .map(|c| {
                let source = &buffer.channels()[*c];
                times.iter().map(|t| source[*t]).collect()
            })
            .collect();
        buffer.replace_channels(sliced)
    }

    fn name(&self) -> &'static str {
        "Slice"
    }
}

/// Writes another signal into a rectangle of the buffer, replacing what was
/// there.
///
/// The inserted signal is realized at the host's sample rate. The target
/// rectangle is silenced first, then the inserted audio is added starting at
/// the rectangle's start. Writes never fail for being out of range: the host
/// grows new channels and new time as needed, and inserted audio longer than
/// the rectangle runs past its end.
#[derive(Clone, Debug)]
pub struct Combine {
    channels: ChannelSpan,
    time: TimeSpan,
    signal: Signal,
}
impl Combine {
    #[allow(missing_docs)]
    pub fn new(
        channels: impl Into<ChannelSpan>,
        time: impl Into<TimeSpan>,
        signal: &Signal,
    ) -> Self {
        Self {
            channels: channels.into(),
            time: time.into(),
            signal: signal.clone(),
        }
    }
}
impl Transform for Combine {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if self.time.step != 1 {
            return Err(Error::invalid_argument(
                "can't write into a time span with a step",
            ));
        }
        let channels = self.channels.resolve_for_write(buffer.num_channels())?;
        let channels = channels.indices();
        let Some(highest) = channels.iter().max().copied() else {
            return Err(Error::invalid_argument("combine selects no channels"));
        };
        let time = self
            .time
            .resolve_for_write(buffer.len(), buffer.sample_rate())?;

        let mut inserted = self.signal.realize(buffer.sample_rate())?;
        if inserted.is_mono() {
            inserted.broadcast_mono(channels.len())?;
        }
        if inserted.num_channels() != channels.len() {
            return Err(Error::ChannelMismatch {
                expected: channels.len(),
                found: inserted.num_channels(),
            });
        }

        // Inserted audio is placed by its logical time relative to the start
        // of the rectangle. Anything before that start is dropped.
        let inserted_shift = inserted.shift();
        let skip = (-inserted_shift).max(0) as usize;
        let lead = inserted_shift.max(0) as usize;
        let body = inserted.len().saturating_sub(skip);
        let write_end = time.start + lead + body;

        if buffer.num_channels() <= highest {
            if buffer.is_mono() {
                buffer.broadcast_mono(highest + 1)?;
            } else {
                buffer.pad_channels(highest + 1);
            }
        }
        buffer.pad_to_length(time.end.max(write_end));

        let start = time.start;
        let end = time.end;
        for (source, dest) in inserted.channels().iter().zip(channels.iter()) {
            let dest = &mut buffer.channels_mut()[*dest];
            dest[start..end].iter_mut().for_each(|s| *s = 0.0);
            dest[start + lead..write_end]
                .iter_mut()
                .zip(source.iter().skip(skip))
                .for_each(|(d, s)| *d += s);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Combine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleRate;

    fn ramp(channels: usize, len: usize) -> SampleBuffer {
        let m: Vec<Vec<f64>> = (0..channels)
            .map(|c| (0..len).map(|i| (c * 100 + i) as f64).collect())
            .collect();
        SampleBuffer::from_array(&m, SampleRate(1000)).unwrap()
    }

    #[test]
    fn slice_selects_a_rectangle() {
        let mut b = ramp(3, 10);
        Slice::new(1..3, 2..5).apply(&mut b).unwrap();
        assert_eq!(b.num_channels(), 2);
        assert_eq!(b.channel(0), Some([102.0, 103.0, 104.0].as_slice()));
        assert_eq!(b.channel(1), Some([202.0, 203.0, 204.0].as_slice()));
    }

    #[test]
    fn slice_times_are_durations() {
        // 2ms..4ms at 1000 Hz is samples 2..4.
        let mut b = ramp(1, 10);
        Slice::new(.., 2.0..4.0).apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([2.0, 3.0].as_slice()));
    }

    #[test]
    fn reversed_slice() {
        let mut b = ramp(1, 1000);
        Slice::new(.., TimeSpan::reversed()).apply(&mut b).unwrap();
        assert_eq!(b.len(), 1000);
        let c = b.channel(0).unwrap();
        for (i, s) in c.iter().enumerate() {
            assert_eq!(*s, (999 - i) as f64);
        }
    }

    #[test]
    fn slice_out_of_range_is_an_error() {
        assert!(Slice::new(0..3, ..).apply(&mut ramp(2, 10)).is_err());
        assert!(Slice::new(.., 5..20).apply(&mut ramp(2, 10)).is_err());
    }

    #[test]
    fn slicing_mono_broadcasts() {
        let mut b = ramp(1, 4);
        Slice::new(0..2, ..).apply(&mut b).unwrap();
        assert_eq!(b.num_channels(), 2);
        assert_eq!(b.channel(0), b.channel(1));
    }

    #[test]
    fn combine_replaces_the_region() {
        let mut b = SampleBuffer::from_samples(&[1.0; 6], SampleRate(1000)).unwrap();
        let insert = Signal::step(2);
        Combine::new(0, 1..4, &insert).apply(&mut b).unwrap();
        assert_eq!(
            b.channel(0),
            Some([1.0, 1.0, 1.0, 0.0, 1.0, 1.0].as_slice())
        );
    }

    #[test]
    fn combine_grows_the_host() {
        let mut b = SampleBuffer::from_array(&[vec![1.0; 3], vec![1.0; 3]], SampleRate(1000))
            .unwrap();
        let insert = Signal::step(4) * 0.5;
        Combine::new(3, TimeSpan::from_start(2), &insert)
            .apply(&mut b)
            .unwrap();
        assert_eq!(b.num_channels(), 4);
        assert_eq!(b.len(), 6);
        assert_eq!(b.channel(0), Some([1.0, 1.0, 1.0, 0.0, 0.0, 0.0].as_slice()));
        assert_eq!(b.channel(2), Some([0.0; 6].as_slice()));
        assert_eq!(b.channel(3), Some([0.0, 0.0, 0.5, 0.5, 0.5, 0.5].as_slice()));
    }
}
