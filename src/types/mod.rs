// Copyright (c) 2024 Mike Tsao

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        ChannelSpan, Decibels, Duration, FrequencyHz, SampleRate, SampleType, Seconds, TimeSpan,
    };
}

pub use {
    numbers::{Decibels, FrequencyHz, SampleType},
    ranges::{ChannelSpan, ResolvedSpan, TimeSpan},
    time::{Duration, SampleRate, Seconds},
};

mod numbers;
mod ranges;
mod time;
