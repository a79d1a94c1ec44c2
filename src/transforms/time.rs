// Copyright (c) 2024 Mike Tsao

use crate::{
    audio::{positions, positions_across, Interpolation, SampleBuffer},
    curves::Curve,
    error::{Error, Result},
    traits::Transform,
    types::{Duration, SampleRate},
};

/// Moves the signal later in time, or earlier if negative. Only the buffer's
/// `shift` changes; no samples are touched.
#[derive(Clone, Copy, Debug)]
pub struct Shift {
    duration: Duration,
}
impl Shift {
    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self {
            duration: duration.into(),
        }
    }
}
impl Transform for Shift {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        let samples = self.duration.to_samples(buffer.sample_rate());
        buffer.set_shift(buffer.shift() + samples);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Shift"
    }

    fn required_samples(&self, sample_rate: SampleRate) -> Option<usize> {
        Some(self.duration.to_samples(sample_rate).unsigned_abs() as usize)
    }
}

/// Appends silence.
#[derive(Clone, Copy, Debug)]
pub struct Extend {
    duration: Duration,
}
impl Extend {
    #[allow(missing_docs)]
    pub fn new(duration: impl Into<Duration>) -> Self {
        Self {
            duration: duration.into(),
        }
    }
}
impl Transform for Extend {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        self.duration.validate_non_negative("extend")?;
        let samples = self.duration.to_samples(buffer.sample_rate());
        buffer.extend(samples);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Extend"
    }

    fn required_samples(&self, sample_rate: SampleRate) -> Option<usize> {
        self.duration.num_samples(sample_rate).ok()
    }
}

/// Plays the signal backward.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse;
impl Transform for Reverse {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        buffer.channels_mut().iter_mut().for_each(|c| c.reverse());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Reverse"
    }
}

/// How fast a [Stretch] reads through its input.
#[derive(Clone, Debug)]
pub enum StretchRate {
    /// A constant speed. 2.0 is twice as fast and half as long.
    Rate(f64),
    /// Whatever constant speed gives this output length.
    Duration(Duration),
    /// A speed that changes over time. After the curve ends, its endpoint
    /// speed holds until the input runs out.
    Curve(Curve),
}

/// Speeds up or slows down a signal by resampling it, which also changes its
/// pitch.
#[derive(Clone, Debug)]
pub struct Stretch {
    rate: StretchRate,
    interpolation: Interpolation,
}
impl Stretch {
    #[allow(missing_docs)]
    pub fn new(rate: StretchRate) -> Self {
        Self {
            rate,
            interpolation: Interpolation::default(),
        }
    }

    /// Stretches by a constant factor.
    pub fn rate(rate: f64) -> Self {
        Self::new(StretchRate::Rate(rate))
    }

    /// Stretches to a given length.
    pub fn to_duration(duration: impl Into<Duration>) -> Self {
        Self::new(StretchRate::Duration(duration.into()))
    }

    /// Stretches by a time-varying factor.
    pub fn curve(curve: Curve) -> Self {
        Self::new(StretchRate::Curve(curve))
    }

    #[allow(missing_docs)]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    // Fractional read positions into a buffer of `len` samples.
    fn read_positions(&self, len: usize, sample_rate: SampleRate) -> Result<Vec<f64>> {
        let last = (len - 1) as f64;
        match &self.rate {
            StretchRate::Rate(rate) => {
                if !(*rate > 0.0) || !rate.is_finite() {
                    return Err(Error::invalid_argument(format!(
                        "stretch rate must be positive, got {rate}"
                    )));
                }
                Ok(positions_across(len, *rate))
            }
            StretchRate::Duration(duration) => {
                duration.validate_non_negative("stretch")?;
                let target = duration.num_samples(sample_rate)?;
                if target == 0 {
                    return Ok(Vec::default());
                }
                if len == 1 {
                    return Ok(vec![0.0; target]);
                }
                Ok(positions(last, len as f64 / target as f64))
            }
            StretchRate::Curve(curve) => {
                let sr = sample_rate.0 as f64;
                if len == 1 {
                    return Ok(vec![0.0]);
                }
                let mut indices: Vec<f64> = curve
                    .integral(sample_rate)?
                    .into_iter()
                    .map(|v| v * sr)
                    .collect();
                let furthest = indices.iter().copied().fold(f64::MIN, f64::max);
                if furthest < last {
                    let step = curve.endpoint(sample_rate);
                    if !(step > 0.0) {
                        return Err(Error::invalid_argument(
                            "a stretch curve has to end at a positive rate",
                        ));
                    }
                    indices.extend(
                        positions(last - furthest, step)
                            .into_iter()
                            .skip(1)
                            .map(|p| p + furthest),
                    );
                } else {
                    indices.retain(|i| *i < last);
                }
                if indices.iter().any(|i| *i < 0.0) {
                    return Err(Error::invalid_argument(
                        "a stretch curve can't read before the start of the signal",
                    ));
                }
                Ok(indices)
            }
        }
    }
}
impl Transform for Stretch {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let p = self.read_positions(buffer.len(), buffer.sample_rate())?;
        let stretched: Vec<Vec<f64>> = buffer
            .channels()
            .iter()
            .map(|c| self.interpolation.sample(c, &p))
            .collect();
        buffer.replace_channels(stretched)
    }

    fn name(&self) -> &'static str {
        "Stretch"
    }
}

/// Holds every `factor`th sample for `factor` samples, which throws away
/// high frequencies and lets aliasing through. `phase` picks which sample in
/// each group is held.
#[derive(Clone, Copy, Debug)]
pub struct Downsample {
    factor: usize,
    phase: usize,
}
impl Downsample {
    #[allow(missing_docs)]
    pub fn new(factor: usize) -> Result<Self> {
        Self::with_phase(factor, 0)
    }

    #[allow(missing_docs)]
    pub fn with_phase(factor: usize, phase: usize) -> Result<Self> {
        if factor == 0 {
            return Err(Error::invalid_argument("downsample factor must be positive"));
        }
        if phase >= factor {
            return Err(Error::invalid_argument(format!(
                "downsample phase {phase} must be less than the factor {factor}"
            )));
        }
        Ok(Self { factor, phase })
    }
}
impl Transform for Downsample {
    fn apply(&self, buffer: &mut SampleBuffer) -> Result<()> {
        for channel in buffer.channels_mut() {
            let len = channel.len();
            for start in (0..len).step_by(self.factor) {
                let held = channel[(start + self.phase).min(len - 1)];
                let end = (start + self.factor).min(len);
                channel[start..end].iter_mut().for_each(|s| *s = held);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Downsample"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const SR: SampleRate = SampleRate(1000);

    fn ramp(len: usize) -> SampleBuffer {
        let samples: Vec<f64> = (0..len).map(|i| i as f64).collect();
        SampleBuffer::from_samples(&samples, SR).unwrap()
    }

    #[test]
    fn shift_moves_only_bookkeeping() {
        let mut b = ramp(4);
        Shift::new(10).apply(&mut b).unwrap();
        assert_eq!(b.shift(), 10);
        assert_eq!(b.len(), 4);
        Shift::new(-15.0).apply(&mut b).unwrap();
        assert_eq!(b.shift(), -5);
        assert_eq!(Shift::new(-3).required_samples(SR), Some(3));
    }

    #[test]
    fn extend_and_reverse() {
        let mut b = ramp(3);
        Extend::new(2).apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([0.0, 1.0, 2.0, 0.0, 0.0].as_slice()));
        Reverse.apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([0.0, 0.0, 2.0, 1.0, 0.0].as_slice()));
        assert!(Extend::new(-1).apply(&mut b).is_err());
    }

    #[test]
    fn stretch_by_rate() {
        let mut b = ramp(11);
        Stretch::rate(2.0)
            .with_interpolation(Interpolation::Linear)
            .apply(&mut b)
            .unwrap();
        assert_eq!(b.channel(0), Some([0.0, 2.0, 4.0, 6.0, 8.0].as_slice()));

        let mut b = ramp(5);
        Stretch::rate(0.5)
            .with_interpolation(Interpolation::Linear)
            .apply(&mut b)
            .unwrap();
        assert_eq!(
            b.channel(0),
            Some([0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5].as_slice())
        );
        assert!(Stretch::rate(0.0).apply(&mut ramp(5)).is_err());
    }

    #[test]
    fn stretch_to_duration() {
        let mut b = ramp(100);
        Stretch::to_duration(200).apply(&mut b).unwrap();
        // Positions stop short of the last sample.
        assert_eq!(b.len(), 198);
        assert!(approx_eq!(f64, b.channel(0).unwrap()[3], 1.5, epsilon = 1e-12));
    }

    #[test]
    fn stretch_by_curve_continues_at_endpoint() {
        // One sample of input per output sample for 5 samples, then the
        // endpoint rate of 1 carries on until the input runs out.
        let mut b = ramp(10);
        Stretch::curve(Curve::constant(1.0, 5))
            .with_interpolation(Interpolation::Linear)
            .apply(&mut b)
            .unwrap();
        let c = b.channel(0).unwrap();
        assert_eq!(c.len(), 9);
        for (i, s) in c.iter().enumerate() {
            assert!(approx_eq!(f64, *s, i as f64, epsilon = 1e-9));
        }
    }

    #[test]
    fn stretching_a_single_sample_holds_it() {
        let lone = || SampleBuffer::from_samples(&[0.75], SR).unwrap();

        let mut b = lone();
        Stretch::rate(0.5).apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([0.75].as_slice()));

        let mut b = lone();
        Stretch::to_duration(4).apply(&mut b).unwrap();
        assert_eq!(b.channel(0), Some([0.75; 4].as_slice()));

        let mut b = lone();
        Stretch::curve(Curve::constant(2.0, 3)).apply(&mut b).unwrap();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn downsample_holds_samples() {
        let mut b = ramp(7);
        Downsample::new(3).unwrap().apply(&mut b).unwrap();
        assert_eq!(
            b.channel(0),
            Some([0.0, 0.0, 0.0, 3.0, 3.0, 3.0, 6.0].as_slice())
        );

        let mut b = ramp(7);
        Downsample::with_phase(3, 1).unwrap().apply(&mut b).unwrap();
        assert_eq!(
            b.channel(0),
            Some([1.0, 1.0, 1.0, 4.0, 4.0, 4.0, 6.0].as_slice())
        );

        assert!(Downsample::new(0).is_err());
        assert!(Downsample::with_phase(2, 2).is_err());
    }
}
