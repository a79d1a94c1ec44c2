// Copyright (c) 2024 Mike Tsao

//! Wrappers around third-party crates that connect cadenza to the outside
//! world: reading and writing WAV files, and keeping decoded files around so
//! they're loaded only once.

#![deny(missing_docs)]

/// The most commonly used imports.
pub mod prelude {
    pub use super::{decode_file, encode, export_wav, SampleCache};
}

pub use cache::SampleCache;
pub use wav::{decode, decode_file, encode, export_wav};

mod cache;
mod wav;
