// Copyright (c) 2024 Mike Tsao

//! The signal tree: a lazy, immutable description of sound, and the engine
//! that realizes it into a [SampleBuffer](crate::audio::SampleBuffer).

/// The most commonly used imports.
pub mod prelude {
    pub use super::Signal;
}

pub use signal::Signal;

mod ops;
mod realize;
mod signal;
