// Copyright (c) 2024 Mike Tsao

//! The signal algebra as Rust operators: `+` mixes, `|` concatenates, `*`
//! applies a transform (or scales, given a number), and unary `-` inverts.

use super::signal::Signal;
use crate::{
    transforms::{BiTransform, TransformChain},
    types::Duration,
};
use core::{
    iter::Sum,
    ops::{Add, BitOr, Mul, Neg, Sub},
};

macro_rules! impl_binary_signal_op {
    ($trait:ident, $method:ident, $body:expr) => {
        impl $trait<Signal> for Signal {
            type Output = Signal;

            fn $method(self, rhs: Signal) -> Self::Output {
                $body(&self, &rhs)
            }
        }
        impl $trait<&Signal> for Signal {
            type Output = Signal;

            fn $method(self, rhs: &Signal) -> Self::Output {
                $body(&self, rhs)
            }
        }
        impl $trait<Signal> for &Signal {
            type Output = Signal;

            fn $method(self, rhs: Signal) -> Self::Output {
                $body(self, &rhs)
            }
        }
        impl $trait<&Signal> for &Signal {
            type Output = Signal;

            fn $method(self, rhs: &Signal) -> Self::Output {
                $body(self, rhs)
            }
        }
    };
}

impl_binary_signal_op!(Add, add, |a: &Signal, b: &Signal| a.mix(b));
impl_binary_signal_op!(Sub, sub, |a: &Signal, b: &Signal| a.mix(&b.amplitude(-1.0)));
impl_binary_signal_op!(BitOr, bitor, |a: &Signal, b: &Signal| a.concat(b));

impl BitOr<BiTransform> for Signal {
    type Output = Signal;

    fn bitor(self, rhs: BiTransform) -> Self::Output {
        self.concat_bi(&rhs)
    }
}
impl BitOr<&BiTransform> for Signal {
    type Output = Signal;

    fn bitor(self, rhs: &BiTransform) -> Self::Output {
        self.concat_bi(rhs)
    }
}
impl BitOr<BiTransform> for &Signal {
    type Output = Signal;

    fn bitor(self, rhs: BiTransform) -> Self::Output {
        self.concat_bi(&rhs)
    }
}
impl BitOr<&BiTransform> for &Signal {
    type Output = Signal;

    fn bitor(self, rhs: &BiTransform) -> Self::Output {
        self.concat_bi(rhs)
    }
}

/// `signal | duration` appends that much silence.
impl BitOr<Duration> for Signal {
    type Output = Signal;

    fn bitor(self, rhs: Duration) -> Self::Output {
        self.concat_silence(rhs)
    }
}
impl BitOr<Duration> for &Signal {
    type Output = Signal;

    fn bitor(self, rhs: Duration) -> Self::Output {
        self.concat_silence(rhs)
    }
}

impl<T: Into<TransformChain>> Mul<T> for Signal {
    type Output = Signal;

    fn mul(self, rhs: T) -> Self::Output {
        self.apply(rhs)
    }
}
impl<T: Into<TransformChain>> Mul<T> for &Signal {
    type Output = Signal;

    fn mul(self, rhs: T) -> Self::Output {
        self.apply(rhs)
    }
}

/// `0.5 * signal` scales, the same as `signal * 0.5`.
impl Mul<Signal> for f64 {
    type Output = Signal;

    fn mul(self, rhs: Signal) -> Self::Output {
        rhs.amplitude(self)
    }
}

impl Neg for Signal {
    type Output = Signal;

    fn neg(self) -> Self::Output {
        self.amplitude(-1.0)
    }
}
impl Neg for &Signal {
    type Output = Signal;

    fn neg(self) -> Self::Output {
        self.amplitude(-1.0)
    }
}

/// Summing signals mixes them.
impl Sum for Signal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let signals: Vec<Signal> = iter.collect();
        Signal::mix_all(signals.iter())
    }
}
impl<'a> Sum<&'a Signal> for Signal {
    fn sum<I: Iterator<Item = &'a Signal>>(iter: I) -> Self {
        Signal::mix_all(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{CrossFade, Gain, Reverse};

    #[test]
    fn operators_build_the_expected_trees() {
        let a = Signal::sine(440.0, 10);
        let b = Signal::silence(10);

        assert_eq!((&a + &b).to_string(), "(Sine + Silence)");
        assert_eq!((&a - &b).to_string(), "(Sine + Silence*(Amplitude))");
        assert_eq!((&a | &b).to_string(), "[Sine + Silence]");
        assert_eq!((-&a).to_string(), "Sine*(Amplitude)");
        assert_eq!((0.5 * a.clone()).to_string(), "Sine*(Amplitude)");
        assert_eq!(
            (&a * (Gain::new(3.0) * Reverse)).to_string(),
            "Sine*(Gain,Reverse)"
        );
    }

    #[test]
    fn borrowed_signals_take_crossfades_and_gaps() {
        let a = Signal::step(10);
        let b = Signal::step(10);
        let fade = CrossFade::new(4);

        let by_ref = &a | &fade | &b;
        let by_value = a.clone() | fade.clone() | b.clone();
        assert_eq!(by_ref.to_string(), by_value.to_string());
        assert_eq!((&a | fade | &b).to_string(), by_value.to_string());

        let gap = &a | Duration::Samples(5);
        assert_eq!(gap.to_string(), "[Step + Silence]");
    }

    #[test]
    fn sum_mixes() {
        let parts = vec![
            Signal::sine(440.0, 10),
            Signal::sine(550.0, 10),
            Signal::sine(660.0, 10),
        ];
        let chord: Signal = parts.iter().sum();
        assert_eq!(chord.to_string(), "(Sine + Sine + Sine)");
        let chord: Signal = parts.into_iter().sum();
        assert_eq!(chord.to_string(), "(Sine + Sine + Sine)");

        let nothing: Signal = Vec::<Signal>::new().into_iter().sum();
        assert_eq!(nothing.to_string(), "()");
    }
}
