// Copyright (c) 2024 Mike Tsao

use super::interpolation::{positions_across, Interpolation};
use crate::{
    error::{Error, Result},
    types::{SampleRate, Seconds},
};

/// [SampleBuffer] owns realized audio: one or more equal-length channels of
/// `f64` samples, the rate they were sampled at, and a signed `shift`.
///
/// `shift` is the logical time, in samples, of buffer index 0. A buffer whose
/// content should start 100 samples late can carry `shift = 100` instead of
/// storing the silence; a buffer that has been padded at the front carries a
/// negative shift. Binary operations such as [SampleBuffer::mix()] line up
/// both operands by logical time before touching samples.
///
/// Channel count only grows during an operation. A mono buffer is treated as
/// "the same thing on every channel" and broadcasts to meet a multichannel
/// partner.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f64>>,
    sample_rate: SampleRate,
    shift: i64,
}
impl SampleBuffer {
    /// An empty mono buffer.
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            channels: vec![Vec::default()],
            sample_rate,
            shift: 0,
        }
    }

    /// `num_channels` channels of `len` zeros.
    pub fn silent(num_channels: usize, len: usize, sample_rate: SampleRate) -> Self {
        Self {
            channels: vec![vec![0.0; len]; num_channels.max(1)],
            sample_rate,
            shift: 0,
        }
    }

    /// Copies a channels-by-time matrix into a new buffer.
    pub fn from_array(matrix: &[Vec<f64>], sample_rate: SampleRate) -> Result<Self> {
        Self::from_channels(matrix.to_vec(), sample_rate)
    }

    /// Copies a single channel into a new mono buffer.
    pub fn from_samples(samples: &[f64], sample_rate: SampleRate) -> Result<Self> {
        Self::from_channels(vec![samples.to_vec()], sample_rate)
    }

    /// Takes ownership of a single channel.
    pub fn mono(samples: Vec<f64>, sample_rate: SampleRate) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
            shift: 0,
        }
    }

    /// Takes ownership of a channels-by-time matrix.
    pub fn from_channels(channels: Vec<Vec<f64>>, sample_rate: SampleRate) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidShape(
                "a buffer needs at least one channel".to_string(),
            ));
        }
        let r = Self {
            channels,
            sample_rate,
            shift: 0,
        };
        r.check_shape()
            .map_err(|_| Error::InvalidShape("channels have different lengths".to_string()))?;
        Ok(r)
    }

    /// Fails if any two channels differ in length.
    pub fn check_shape(&self) -> Result<()> {
        let len = self.len();
        if let Some((i, c)) = self
            .channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != len)
        {
            return Err(Error::ShapeInvariantViolation(format!(
                "channel {i} has {} samples, but channel 0 has {len}",
                c.len()
            )));
        }
        if self.channels.is_empty() {
            return Err(Error::ShapeInvariantViolation(
                "buffer has no channels".to_string(),
            ));
        }
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[allow(missing_docs)]
    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    /// Logical time of buffer index 0, in samples.
    pub fn shift(&self) -> i64 {
        self.shift
    }

    #[allow(missing_docs)]
    pub fn set_shift(&mut self, shift: i64) {
        self.shift = shift;
    }

    /// Logical time of the first sample.
    pub fn start(&self) -> i64 {
        self.shift
    }

    /// Logical time just past the last sample.
    pub fn end(&self) -> i64 {
        self.shift + self.len() as i64
    }

    #[allow(missing_docs)]
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Relabels the buffer's rate without touching samples. See
    /// [SampleBuffer::resample()] for real conversion.
    pub fn set_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
    }

    #[allow(missing_docs)]
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(|c| c.as_slice())
    }

    #[allow(missing_docs)]
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Mutable access to the samples. Whoever changes a channel's length must
    /// change every channel's length the same way.
    pub fn channels_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.channels
    }

    /// Replaces all the samples at once, keeping the rate and shift.
    pub fn replace_channels(&mut self, channels: Vec<Vec<f64>>) -> Result<()> {
        self.channels = channels;
        self.check_shape()
    }

    /// Gives up the samples.
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Length in seconds.
    pub fn duration(&self) -> Seconds {
        Seconds(self.len() as f64 / self.sample_rate.0 as f64)
    }

    /// The largest absolute sample value, or zero if empty.
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0, |acc: f64, s| acc.max(s.abs()))
    }

    /// Pads `n` zeros at the front of every channel and moves `shift` back by
    /// `n`, so the existing content keeps its logical time. Negative `n` does
    /// nothing.
    pub fn push_forward(&mut self, n: i64) {
        if n <= 0 {
            return;
        }
        let n = n as usize;
        for c in self.channels.iter_mut() {
            c.splice(0..0, core::iter::repeat(0.0).take(n));
        }
        self.shift -= n as i64;
    }

    /// Pads `n` zeros at the end of every channel. Non-positive `n` does
    /// nothing.
    pub fn extend(&mut self, n: i64) {
        if n <= 0 {
            return;
        }
        let new_len = self.len() + n as usize;
        for c in self.channels.iter_mut() {
            c.resize(new_len, 0.0);
        }
    }

    /// Extends with zeros until the buffer is at least `len` samples long.
    pub fn pad_to_length(&mut self, len: usize) {
        if self.len() < len {
            self.extend((len - self.len()) as i64);
        }
    }

    /// Duplicates a mono buffer's only channel `num_channels` times. Content
    /// is copied, not scaled.
    pub fn broadcast_mono(&mut self, num_channels: usize) -> Result<()> {
        if !self.is_mono() {
            return Err(Error::UnsupportedOperation(format!(
                "can't broadcast a {}-channel buffer as if it were mono",
                self.num_channels()
            )));
        }
        if num_channels > 1 {
            let c = self.channels[0].clone();
            self.channels.resize(num_channels, c);
        }
        Ok(())
    }

    /// Appends silent channels until there are at least `num_channels`.
    pub fn pad_channels(&mut self, num_channels: usize) {
        let len = self.len();
        while self.channels.len() < num_channels {
            self.channels.push(vec![0.0; len]);
        }
    }

    /// Sums every channel into one. Does not scale.
    pub fn to_mono(&mut self) {
        if self.is_mono() {
            return;
        }
        let len = self.len();
        let mut sum = vec![0.0; len];
        for c in self.channels.iter() {
            sum.iter_mut().zip(c.iter()).for_each(|(s, v)| *s += v);
        }
        self.channels = vec![sum];
    }

    /// Reshapes `self` so that `other` fits inside it. Afterward both have the
    /// same channel count (mono broadcasts to match), and `self` covers the
    /// logical time window spanned by both. `other` may be changed too.
    pub fn conform(&mut self, other: &mut SampleBuffer) -> Result<()> {
        if other.is_mono() {
            other.broadcast_mono(self.num_channels())?;
        }
        if self.is_mono() {
            self.broadcast_mono(other.num_channels())?;
        }
        if self.num_channels() != other.num_channels() {
            return Err(Error::ChannelMismatch {
                expected: self.num_channels(),
                found: other.num_channels(),
            });
        }

        let start = self.start().min(other.start());
        let end = self.end().max(other.end());
        self.push_forward(self.start() - start);
        self.pad_to_length((end - start) as usize);
        Ok(())
    }

    /// Adds `other` into `self`, sample by sample, after lining up channels
    /// and logical time.
    pub fn mix(&mut self, mut other: SampleBuffer) -> Result<()> {
        if !self.is_mono() && !other.is_mono() && self.num_channels() != other.num_channels() {
            return Err(Error::ChannelMismatch {
                expected: self.num_channels(),
                found: other.num_channels(),
            });
        }
        self.conform(&mut other)?;
        let offset = (other.start() - self.start()) as usize;
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            dst[offset..offset + src.len()]
                .iter_mut()
                .zip(src.iter())
                .for_each(|(d, s)| *d += s);
        }
        Ok(())
    }

    /// Places `other` so that its logical time 0 lands where `self` ends,
    /// then mixes it in. A negative shift on `other` overlaps the two.
    pub fn concat(&mut self, mut other: SampleBuffer) -> Result<()> {
        other.shift += self.end();
        self.mix(other)
    }

    /// Converts to a different sample rate by reading the existing samples at
    /// fractional positions.
    pub fn resample(&mut self, sample_rate: SampleRate, interpolation: Interpolation) {
        if sample_rate == self.sample_rate || self.is_empty() {
            self.sample_rate = sample_rate;
            return;
        }
        let factor = self.sample_rate.0 as f64 / sample_rate.0 as f64;
        let p = positions_across(self.len(), factor);
        self.channels = self
            .channels
            .iter()
            .map(|c| interpolation.sample(c, &p))
            .collect();
        self.shift = (self.shift as f64 / factor) as i64;
        self.sample_rate = sample_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use more_asserts::assert_lt;

    fn sr() -> SampleRate {
        SampleRate(1000)
    }

    fn buffer(channels: &[&[f64]]) -> SampleBuffer {
        let v: Vec<Vec<f64>> = channels.iter().map(|c| c.to_vec()).collect();
        SampleBuffer::from_array(&v, sr()).unwrap()
    }

    #[test]
    fn new_and_shapes() {
        let b = SampleBuffer::new(sr());
        assert!(b.is_mono());
        assert!(b.is_empty());
        assert_eq!(b.shift(), 0);

        assert!(SampleBuffer::from_array(&[], sr()).is_err());
        assert!(SampleBuffer::from_array(&[vec![1.0], vec![1.0, 2.0]], sr()).is_err());
        let b = SampleBuffer::from_samples(&[1.0, -2.0], sr()).unwrap();
        assert_eq!(b.peak(), 2.0);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn input_is_copied() {
        let mut raw = vec![vec![1.0, 2.0]];
        let b = SampleBuffer::from_array(&raw, sr()).unwrap();
        raw[0][0] = 100.0;
        assert_eq!(b.channel(0), Some([1.0, 2.0].as_slice()));
    }

    #[test]
    fn push_forward_round_trip() {
        let mut b = buffer(&[&[1.0, 2.0, 3.0]]);
        b.push_forward(2);
        assert_eq!(b.shift(), -2);
        assert_eq!(b.len(), 5);
        let original: Vec<f64> = b.channel(0).unwrap()[(0 - b.shift()) as usize..].to_vec();
        assert_eq!(original, vec![1.0, 2.0, 3.0]);

        b.push_forward(-5);
        assert_eq!(b.shift(), -2);
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn extend_and_pad() {
        let mut b = buffer(&[&[1.0], &[2.0]]);
        b.extend(2);
        assert_eq!(b.channel(1), Some([2.0, 0.0, 0.0].as_slice()));
        b.extend(-1);
        assert_eq!(b.len(), 3);
        b.pad_to_length(2);
        assert_eq!(b.len(), 3);
        b.pad_to_length(4);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn broadcast_versus_pad_channels() {
        let mut a = buffer(&[&[1.0, 2.0]]);
        a.broadcast_mono(3).unwrap();
        assert_eq!(a.num_channels(), 3);
        assert!(a.channels().iter().all(|c| c == &vec![1.0, 2.0]));

        let mut b = buffer(&[&[1.0, 2.0]]);
        b.pad_channels(3);
        assert_eq!(b.channel(0), Some([1.0, 2.0].as_slice()));
        assert_eq!(b.channel(2), Some([0.0, 0.0].as_slice()));

        assert!(a.broadcast_mono(4).is_err());

        a.to_mono();
        assert_eq!(a.channel(0), Some([3.0, 6.0].as_slice()));
    }

    #[test]
    fn mix_pads_to_longer_operand() {
        let mut a = buffer(&[&[1.0, 1.0, 1.0, 1.0]]);
        a.mix(buffer(&[&[1.0, 1.0]])).unwrap();
        assert_eq!(a.channel(0), Some([2.0, 2.0, 1.0, 1.0].as_slice()));

        let mut a = buffer(&[&[1.0]]);
        a.mix(buffer(&[&[1.0, 1.0, 1.0]])).unwrap();
        assert_eq!(a.channel(0), Some([2.0, 1.0, 1.0].as_slice()));
    }

    #[test]
    fn mix_broadcasts_mono() {
        let mut stereo = buffer(&[&[1.0, 1.0], &[2.0, 2.0]]);
        stereo.mix(buffer(&[&[0.5, 0.25]])).unwrap();
        assert_eq!(stereo.channel(0), Some([1.5, 1.25].as_slice()));
        assert_eq!(stereo.channel(1), Some([2.5, 2.25].as_slice()));

        let mut mono = buffer(&[&[0.5, 0.25]]);
        mono.mix(buffer(&[&[1.0, 1.0], &[2.0, 2.0]])).unwrap();
        assert_eq!(mono, stereo);
    }

    #[test]
    fn mix_rejects_incompatible_channels() {
        let mut a = buffer(&[&[1.0], &[1.0]]);
        assert_eq!(
            a.mix(buffer(&[&[1.0], &[1.0], &[1.0]])),
            Err(Error::ChannelMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn mix_respects_shift() {
        let mut a = buffer(&[&[1.0, 1.0]]);
        let mut b = buffer(&[&[1.0, 1.0]]);
        b.set_shift(3);
        a.mix(b).unwrap();
        assert_eq!(a.channel(0), Some([1.0, 1.0, 0.0, 1.0, 1.0].as_slice()));
        assert_eq!(a.shift(), 0);

        let mut a = buffer(&[&[1.0, 1.0]]);
        let mut b = buffer(&[&[2.0]]);
        b.set_shift(-1);
        a.mix(b).unwrap();
        assert_eq!(a.channel(0), Some([2.0, 1.0, 1.0].as_slice()));
        assert_eq!(a.shift(), -1);
    }

    #[test]
    fn concat_appends_and_allows_overlap() {
        let mut a = buffer(&[&[1.0, 1.0]]);
        a.concat(buffer(&[&[2.0, 2.0, 2.0]])).unwrap();
        assert_eq!(a.channel(0), Some([1.0, 1.0, 2.0, 2.0, 2.0].as_slice()));

        let mut a = buffer(&[&[1.0, 1.0]]);
        let mut b = buffer(&[&[2.0, 2.0]]);
        b.set_shift(-1);
        a.concat(b).unwrap();
        assert_eq!(a.channel(0), Some([1.0, 3.0, 2.0].as_slice()));
    }

    #[test]
    fn resampling_changes_length() {
        let mut b = SampleBuffer::from_samples(&[0.0; 101], SampleRate(1000)).unwrap();
        b.resample(SampleRate(500), Interpolation::Linear);
        assert_eq!(b.sample_rate(), SampleRate(500));
        assert_eq!(b.len(), 50);

        let mut b = SampleBuffer::from_samples(&[0.0; 100], SampleRate(1000)).unwrap();
        b.resample(SampleRate(2000), Interpolation::Quadratic);
        assert_lt!(b.len(), 200);
        assert_lt!(190, b.len());

        for rate in [SampleRate(500), SampleRate(2000)] {
            let mut b = SampleBuffer::from_samples(&[0.5], SampleRate(1000)).unwrap();
            b.resample(rate, Interpolation::Quadratic);
            assert_eq!(b.channel(0), Some([0.5].as_slice()));
        }
    }

    #[test]
    fn ragged_buffers_are_caught() {
        let mut b = buffer(&[&[1.0], &[1.0]]);
        b.channels_mut()[1].push(2.0);
        assert!(matches!(
            b.check_shape(),
            Err(Error::ShapeInvariantViolation(_))
        ));
        assert!(b.replace_channels(vec![vec![0.0; 3]; 2]).is_ok());
    }
}
