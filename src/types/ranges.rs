// Copyright (c) 2024 Mike Tsao

//! Rectangular regions of a buffer: a span of channels and a span of time.

use super::time::{Duration, SampleRate};
use crate::error::{Error, Result};
use core::ops::{Range, RangeFrom, RangeFull, RangeTo};
use serde::{Deserialize, Serialize};

/// A concrete, bounds-checked selection of indices along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// First index of the underlying half-open range.
    pub start: usize,
    /// One past the last index of the underlying half-open range.
    pub end: usize,
    /// Distance between selected indices. Negative walks the range backward.
    pub step: isize,
}
impl ResolvedSpan {
    /// The selected indices, in output order. A backward walk starts from
    /// the last index of the range.
    pub fn indices(&self) -> Vec<usize> {
        let stride = self.step.unsigned_abs();
        if self.step > 0 {
            (self.start..self.end).step_by(stride).collect()
        } else {
            (self.start..self.end).rev().step_by(stride).collect()
        }
    }

    /// How many indices are selected.
    pub fn len(&self) -> usize {
        let width = self.end - self.start;
        let stride = self.step.unsigned_abs();
        (width + stride - 1) / stride
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is a plain contiguous forward range.
    pub fn is_contiguous(&self) -> bool {
        self.step == 1
    }
}

fn check_step(step: isize) -> Result<()> {
    if step == 0 {
        Err(Error::invalid_argument("span step can't be zero"))
    } else {
        Ok(())
    }
}

/// A selection of channels. An absent end means "through the last channel."
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelSpan {
    #[allow(missing_docs)]
    pub start: usize,
    #[allow(missing_docs)]
    pub end: Option<usize>,
    #[allow(missing_docs)]
    pub step: isize,
}
impl Default for ChannelSpan {
    fn default() -> Self {
        Self::all()
    }
}
impl ChannelSpan {
    /// Every channel.
    pub const fn all() -> Self {
        Self {
            start: 0,
            end: None,
            step: 1,
        }
    }

    /// Channels `start..end`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
            step: 1,
        }
    }

    /// Channels `start..end`, every `step`th one.
    pub fn with_step(mut self, step: isize) -> Self {
        self.step = step;
        self
    }

    /// Resolves against a buffer with `num_channels` channels. Reaching past
    /// the last channel is an error.
    pub fn resolve(&self, num_channels: usize) -> Result<ResolvedSpan> {
        check_step(self.step)?;
        let end = self.end.unwrap_or(num_channels);
        if end > num_channels {
            return Err(Error::invalid_argument(format!(
                "channel span ends at {end}, but there are only {num_channels} channels"
            )));
        }
        if self.start > end {
            return Err(Error::invalid_argument(format!(
                "channel span start {} is past its end {end}",
                self.start
            )));
        }
        Ok(ResolvedSpan {
            start: self.start,
            end,
            step: self.step,
        })
    }

    /// Like [ChannelSpan::resolve()], but an explicit end beyond the last
    /// channel is allowed. Used for writes, which grow the buffer instead.
    pub fn resolve_for_write(&self, num_channels: usize) -> Result<ResolvedSpan> {
        check_step(self.step)?;
        let end = self.end.unwrap_or(num_channels.max(self.start + 1));
        if self.start > end {
            return Err(Error::invalid_argument(format!(
                "channel span start {} is past its end {end}",
                self.start
            )));
        }
        Ok(ResolvedSpan {
            start: self.start,
            end,
            step: self.step,
        })
    }
}
impl From<usize> for ChannelSpan {
    fn from(value: usize) -> Self {
        Self::new(value, value + 1)
    }
}
impl From<Range<usize>> for ChannelSpan {
    fn from(value: Range<usize>) -> Self {
        Self::new(value.start, value.end)
    }
}
impl From<RangeFrom<usize>> for ChannelSpan {
    fn from(value: RangeFrom<usize>) -> Self {
        Self {
            start: value.start,
            end: None,
            step: 1,
        }
    }
}
impl From<RangeTo<usize>> for ChannelSpan {
    fn from(value: RangeTo<usize>) -> Self {
        Self::new(0, value.end)
    }
}
impl From<RangeFull> for ChannelSpan {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

/// A selection of time. Bounds are [Duration]s, so integers are sample
/// indices and floats are milliseconds. A negative bound counts back from the
/// end of the buffer. An absent bound means the buffer's start or end.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSpan {
    #[allow(missing_docs)]
    pub start: Option<Duration>,
    #[allow(missing_docs)]
    pub end: Option<Duration>,
    #[allow(missing_docs)]
    pub step: isize,
}
impl Default for TimeSpan {
    fn default() -> Self {
        Self::all()
    }
}
impl TimeSpan {
    /// The whole buffer.
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
            step: 1,
        }
    }

    /// The whole buffer, backward.
    pub const fn reversed() -> Self {
        Self {
            start: None,
            end: None,
            step: -1,
        }
    }

    /// From `start` to `end`.
    pub fn new(start: impl Into<Duration>, end: impl Into<Duration>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            step: 1,
        }
    }

    /// From `start` through the end of the buffer.
    pub fn from_start(start: impl Into<Duration>) -> Self {
        Self {
            start: Some(start.into()),
            end: None,
            step: 1,
        }
    }

    /// From the beginning of the buffer to `end`.
    pub fn until(end: impl Into<Duration>) -> Self {
        Self {
            start: None,
            end: Some(end.into()),
            step: 1,
        }
    }

    #[allow(missing_docs)]
    pub fn with_step(mut self, step: isize) -> Self {
        self.step = step;
        self
    }

    fn bound(value: Option<Duration>, default: usize, len: usize, sr: SampleRate) -> i64 {
        match value {
            None => default as i64,
            Some(d) if d.is_negative() => len as i64 + d.to_samples(sr),
            Some(d) => d.to_samples(sr),
        }
    }

    /// Resolves against a buffer of `len` samples. Any bound outside
    /// `0..=len` is an error.
    pub fn resolve(&self, len: usize, sample_rate: SampleRate) -> Result<ResolvedSpan> {
        let (start, end) = self.resolve_raw(len, sample_rate)?;
        if end > len as i64 {
            return Err(Error::invalid_argument(format!(
                "time span ends at sample {end}, but the buffer has only {len}"
            )));
        }
        Ok(ResolvedSpan {
            start: start as usize,
            end: end as usize,
            step: self.step,
        })
    }

    /// Like [TimeSpan::resolve()], but an end past the buffer is allowed.
    pub fn resolve_for_write(&self, len: usize, sample_rate: SampleRate) -> Result<ResolvedSpan> {
        let (start, end) = self.resolve_raw(len, sample_rate)?;
        Ok(ResolvedSpan {
            start: start as usize,
            end: end as usize,
            step: self.step,
        })
    }

    fn resolve_raw(&self, len: usize, sample_rate: SampleRate) -> Result<(i64, i64)> {
        check_step(self.step)?;
        let start = Self::bound(self.start, 0, len, sample_rate);
        let end = Self::bound(self.end, len, len, sample_rate);
        if start < 0 || end < 0 {
            return Err(Error::invalid_argument(format!(
                "time span {start}..{end} reaches before the start of the buffer"
            )));
        }
        if start > end {
            return Err(Error::invalid_argument(format!(
                "time span start {start} is past its end {end}"
            )));
        }
        Ok((start, end))
    }
}
impl From<Range<i64>> for TimeSpan {
    fn from(value: Range<i64>) -> Self {
        Self::new(value.start, value.end)
    }
}
impl From<Range<i32>> for TimeSpan {
    fn from(value: Range<i32>) -> Self {
        Self::new(value.start, value.end)
    }
}
impl From<Range<usize>> for TimeSpan {
    fn from(value: Range<usize>) -> Self {
        Self::new(value.start, value.end)
    }
}
impl From<Range<f64>> for TimeSpan {
    fn from(value: Range<f64>) -> Self {
        Self::new(value.start, value.end)
    }
}
impl From<RangeFrom<f64>> for TimeSpan {
    fn from(value: RangeFrom<f64>) -> Self {
        Self::from_start(value.start)
    }
}
impl From<RangeTo<f64>> for TimeSpan {
    fn from(value: RangeTo<f64>) -> Self {
        Self::until(value.end)
    }
}
impl From<RangeFrom<usize>> for TimeSpan {
    fn from(value: RangeFrom<usize>) -> Self {
        Self::from_start(value.start)
    }
}
impl From<RangeTo<usize>> for TimeSpan {
    fn from(value: RangeTo<usize>) -> Self {
        Self::until(value.end)
    }
}
impl From<RangeFull> for TimeSpan {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}
