// Copyright (c) 2024 Mike Tsao

//! Reading a channel at fractional sample positions.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// How to estimate a sample value between two stored samples. Higher orders
/// cost more but produce fewer artifacts.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Interpolation {
    /// Zeroth order: the closest stored sample.
    Nearest,
    /// First order: a straight line between the two neighbors.
    Linear,
    /// Second order: a parabola through the previous two samples and the
    /// next one.
    #[default]
    Quadratic,
}
impl Interpolation {
    /// Reads `channel` at each of `positions`. Positions must lie within
    /// `0..=channel.len() - 1`; callers generate them that way.
    pub fn sample(&self, channel: &[f64], positions: &[f64]) -> Vec<f64> {
        if channel.is_empty() {
            return vec![0.0; positions.len()];
        }
        let last = channel.len() - 1;
        let at = |i: usize| channel[i.min(last)];
        match self {
            Interpolation::Nearest => positions
                .iter()
                .map(|p| at(p.round() as usize))
                .collect(),
            Interpolation::Linear => positions
                .iter()
                .map(|p| {
                    let floor = p.floor();
                    let coef = p - floor;
                    (1.0 - coef) * at(floor as usize) + coef * at(p.ceil() as usize)
                })
                .collect(),
            Interpolation::Quadratic => positions
                .iter()
                .map(|p| {
                    let prev = p.floor() as usize;
                    let tau = p - prev as f64;
                    let prev_prev_sample = if prev == 0 { 0.0 } else { at(prev - 1) };
                    let prev_sample = at(prev);
                    let next_sample = at(p.ceil() as usize);

                    (tau - 1.0) * tau / 2.0 * prev_prev_sample
                        - (tau - 1.0) * (tau + 1.0) * prev_sample
                        + tau * (tau + 1.0) / 2.0 * next_sample
                })
                .collect(),
        }
    }
}

/// Positions to read a channel of `len` samples at, `step` apart. A lone
/// sample is read once, since there's nothing to step toward.
pub fn positions_across(len: usize, step: f64) -> Vec<f64> {
    match len {
        0 => Vec::default(),
        1 => vec![0.0],
        _ => positions((len - 1) as f64, step),
    }
}

/// Positions `0, step, 2 * step, ...` strictly below `end`.
pub fn positions(end: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || end <= 0.0 {
        return Vec::default();
    }
    let count = (end / step).ceil() as usize;
    (0..count)
        .map(|i| i as f64 * step)
        .filter(|p| *p < end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn integer_positions_are_exact() {
        let channel = [0.0, 1.0, 4.0, 9.0, 16.0];
        let p = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(Interpolation::Nearest.sample(&channel, &p), vec![0.0, 1.0, 4.0, 9.0]);
        assert_eq!(Interpolation::Linear.sample(&channel, &p), vec![0.0, 1.0, 4.0, 9.0]);
        let q = Interpolation::Quadratic.sample(&channel, &p);
        for (a, b) in q.iter().zip([0.0, 1.0, 4.0, 9.0]) {
            assert!(approx_eq!(f64, *a, b, epsilon = 1e-12));
        }
    }

    #[test]
    fn fractional_positions() {
        let channel = [0.0, 1.0, 4.0, 9.0, 16.0];
        let linear = Interpolation::Linear.sample(&channel, &[1.5]);
        assert!(approx_eq!(f64, linear[0], 2.5, ulps = 2));

        // A parabola through x^2 samples reproduces x^2 exactly.
        let quadratic = Interpolation::Quadratic.sample(&channel, &[2.5]);
        assert!(approx_eq!(f64, quadratic[0], 6.25, epsilon = 1e-12));

        assert_eq!(Interpolation::Nearest.sample(&channel, &[2.6]), vec![9.0]);
    }

    #[test]
    fn position_generation() {
        assert_eq!(positions(4.0, 1.0), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(positions(4.0, 2.0), vec![0.0, 2.0]);
        assert_eq!(positions(3.0, 0.5).len(), 6);
        assert!(positions(0.0, 1.0).is_empty());
        assert_eq!("linear".parse::<Interpolation>(), Ok(Interpolation::Linear));
    }
}
