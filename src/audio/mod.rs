// Copyright (c) 2024 Mike Tsao

//! Realized audio: the [SampleBuffer] that every generator fills and every
//! transform edits, and the mixdown step that turns it into integer PCM.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{ByteWidth, Interpolation, QuantizedBuffer, SampleBuffer};
}

pub use {
    buffer::SampleBuffer,
    interpolation::{positions, positions_across, Interpolation},
    mixdown::{ByteWidth, QuantizedBuffer},
};

mod buffer;
mod interpolation;
mod mixdown;
