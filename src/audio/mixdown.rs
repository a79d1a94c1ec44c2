// Copyright (c) 2024 Mike Tsao

//! Converts realized floating-point audio into interleaved integer PCM.

use super::buffer::SampleBuffer;
use crate::{
    error::{Error, Result},
    types::SampleRate,
};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, FromRepr};

/// Bytes per PCM sample.
#[derive(
    Clone, Copy, Debug, Default, Display, EnumIter, FromRepr, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(try_from = "usize", into = "usize")]
#[repr(usize)]
pub enum ByteWidth {
    /// 8-bit, stored unsigned with an offset of 128.
    One = 1,
    /// 16-bit, the usual CD-quality width.
    #[default]
    Two = 2,
    /// 24-bit, packed into three bytes.
    Three = 3,
    /// 32-bit.
    Four = 4,
}
impl ByteWidth {
    /// The largest magnitude a sample can take at this width.
    pub fn max_value(&self) -> i32 {
        ((1i64 << (8 * *self as usize - 1)) - 1) as i32
    }

    #[allow(missing_docs)]
    pub fn bytes(&self) -> usize {
        *self as usize
    }

    #[allow(missing_docs)]
    pub fn bits(&self) -> u16 {
        8 * *self as u16
    }
}
impl TryFrom<usize> for ByteWidth {
    type Error = Error;

    fn try_from(value: usize) -> core::result::Result<Self, Self::Error> {
        ByteWidth::from_repr(value).ok_or_else(|| {
            Error::UnsupportedFormat(format!("byte width {value} isn't one of 1, 2, 3, 4"))
        })
    }
}
impl From<ByteWidth> for usize {
    fn from(value: ByteWidth) -> Self {
        value as usize
    }
}

/// Final integer sample data, interleaved frame by frame
/// (`ch0[0], ch1[0], ..., ch0[1], ch1[1], ...`).
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizedBuffer {
    samples: Vec<i32>,
    byte_width: ByteWidth,
    num_channels: usize,
    sample_rate: SampleRate,
}
impl QuantizedBuffer {
    /// The interleaved samples.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    #[allow(missing_docs)]
    pub fn byte_width(&self) -> ByteWidth {
        self.byte_width
    }

    #[allow(missing_docs)]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[allow(missing_docs)]
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// The number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.num_channels.max(1)
    }

    /// One channel's samples, de-interleaved.
    pub fn channel(&self, index: usize) -> Vec<i32> {
        self.samples
            .iter()
            .skip(index)
            .step_by(self.num_channels.max(1))
            .copied()
            .collect()
    }

    /// Standard little-endian PCM bytes: signed for widths 2 through 4,
    /// unsigned with a 128 offset for width 1.
    pub fn to_bytes(&self) -> Vec<u8> {
        let width = self.byte_width.bytes();
        let mut bytes = vec![0u8; self.samples.len() * width];
        for (chunk, s) in bytes.chunks_exact_mut(width).zip(self.samples.iter()) {
            match self.byte_width {
                ByteWidth::One => chunk[0] = (*s + 128) as u8,
                ByteWidth::Two => LittleEndian::write_i16(chunk, *s as i16),
                ByteWidth::Three => LittleEndian::write_i24(chunk, *s),
                ByteWidth::Four => LittleEndian::write_i32(chunk, *s),
            }
        }
        bytes
    }
}

/// Scales samples so their peak becomes `max_amplitude`, following the
/// mixdown amplitude policy. Returns the factor to multiply by.
///
/// - `None` leaves the level alone unless the peak exceeds 1.0, in which case
///   it shrinks to exactly 1.0.
/// - `Some(0.0)` opts out of fitting entirely.
/// - `Some(m)` with `0 < m <= 1` maps the current peak onto `m`, amplifying or
///   attenuating as needed.
fn fit(peak: f64, max_amplitude: Option<f64>) -> Result<Option<f64>> {
    match max_amplitude {
        None => {
            if peak > 1.0 {
                log::warn!("signal peak {peak:.3} exceeds 1.0; shrinking to avoid clipping");
                Ok(Some(1.0))
            } else {
                Ok(None)
            }
        }
        Some(m) if m == 0.0 => {
            log::warn!("amplitude fitting disabled; output may clip (peak {peak:.3})");
            Ok(None)
        }
        Some(m) if m > 0.0 && m <= 1.0 => {
            if peak == 0.0 {
                Ok(None)
            } else {
                Ok(Some(m))
            }
        }
        Some(m) => Err(Error::invalid_argument(format!(
            "max amplitude must be in (0, 1] or exactly 0, got {m}"
        ))),
    }
}

impl SampleBuffer {
    /// Quantizes a copy of this buffer's samples. The buffer itself is left
    /// untouched, so mixdown can be repeated at other widths.
    ///
    /// Steps: fit the amplitude, stretch [-1, 1] onto the integer range of
    /// `byte_width`, truncate toward zero, interleave. A positive shift comes
    /// out as leading silence.
    pub fn mixdown(
        &self,
        byte_width: ByteWidth,
        max_amplitude: Option<f64>,
    ) -> Result<QuantizedBuffer> {
        self.check_shape()?;
        let peak = self.peak();
        let target = fit(peak, max_amplitude)?;
        let max_value = byte_width.max_value() as f64;
        let quantize = |s: f64| -> i32 {
            let fitted = match target {
                Some(m) => s / peak * m,
                None => s,
            };
            (fitted * max_value).clamp(-max_value, max_value) as i32
        };

        let num_channels = self.num_channels();
        let lead = self.shift().max(0) as usize;
        let mut samples = vec![0i32; (lead + self.len()) * num_channels];
        for (c, channel) in self.channels().iter().enumerate() {
            for (i, s) in channel.iter().enumerate() {
                samples[(lead + i) * num_channels + c] = quantize(*s);
            }
        }

        Ok(QuantizedBuffer {
            samples,
            byte_width,
            num_channels,
            sample_rate: self.sample_rate(),
        })
    }
}
