// Copyright (c) 2024 Mike Tsao

//! Numeric types used throughout the system.

use core::{
    fmt::Display,
    ops::{Div, Mul},
};
use serde::{Deserialize, Serialize};

/// The primitive Rust type of a single audio sample.
pub type SampleType = f64;

/// Frequency in Hertz (cycles per second).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrequencyHz(pub f64);
impl FrequencyHz {
    /// A common reference pitch, A4.
    pub const A4: FrequencyHz = FrequencyHz(440.0);
}
impl Display for FrequencyHz {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{:.2} Hz", self.0))
    }
}
impl From<f64> for FrequencyHz {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
impl From<f32> for FrequencyHz {
    fn from(value: f32) -> Self {
        Self(value as f64)
    }
}
impl From<u32> for FrequencyHz {
    fn from(value: u32) -> Self {
        Self(value as f64)
    }
}
impl From<FrequencyHz> for f64 {
    fn from(value: FrequencyHz) -> Self {
        value.0
    }
}
impl Mul<f64> for FrequencyHz {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}
impl Div<f64> for FrequencyHz {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// A level in decibels relative to full amplitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Decibels(pub f64);
impl Decibels {
    /// The linear amplitude factor this level represents.
    pub fn to_amplitude(self) -> f64 {
        10f64.powf(self.0 / 20.0)
    }

    /// The level of a linear amplitude factor. Zero maps to negative infinity.
    pub fn from_amplitude(amplitude: f64) -> Self {
        Self(20.0 * amplitude.abs().log10())
    }
}
impl From<f64> for Decibels {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
impl Display for Decibels {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{:+.1} dB", self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn decibel_conversions() {
        assert_eq!(Decibels(0.0).to_amplitude(), 1.0);
        assert!(approx_eq!(f64, Decibels(20.0).to_amplitude(), 10.0, ulps = 4));
        assert!(approx_eq!(f64, Decibels(-6.0).to_amplitude(), 0.501187, epsilon = 0.000001));
        assert!(approx_eq!(
            f64,
            Decibels::from_amplitude(0.1).0,
            -20.0,
            epsilon = 0.000000001
        ));
        assert_eq!(Decibels::from_amplitude(0.0).0, f64::NEG_INFINITY);
    }

    #[test]
    fn frequency_arithmetic() {
        assert_eq!(FrequencyHz::A4 * 2.0, FrequencyHz(880.0));
        assert_eq!(FrequencyHz::A4 / 2.0, FrequencyHz(220.0));
        assert_eq!(FrequencyHz::from(440u32), FrequencyHz::A4);
    }
}
