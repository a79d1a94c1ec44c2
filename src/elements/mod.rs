// Copyright (c) 2024 Mike Tsao

//! Generators: the leaves of a signal tree, which produce audio from nothing
//! but their own parameters.

/// The most commonly used imports.
pub mod prelude {
    pub use super::generators::{
        Frequency, Oscillator, OscillatorBuilder, PinkNoise, Raw, Silence, Step, Waveform,
        WhiteNoise,
    };
}

pub use generators::{
    Frequency, Oscillator, OscillatorBuilder, PinkNoise, Raw, Silence, Step, Waveform, WhiteNoise,
};

mod generators;
