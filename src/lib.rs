// Copyright (c) 2024 Mike Tsao

#![deny(missing_docs, unused_imports, unused_variables)]
#![allow(rustdoc::private_intra_doc_links)]

//! Cadenza composes sound as an algebra of signals and renders it offline.
//!
//! A [Signal] is a lazy description of audio. Leaves such as
//! [Signal::sine()] or [Signal::white_noise()] generate sound from their
//! parameters; `+` mixes signals, `|` plays them one after another, and `*`
//! applies a [transform](transforms) such as a filter, fade, or gain change.
//! Nothing is computed until the tree is realized into a
//! [SampleBuffer](audio::SampleBuffer), which can then be quantized into
//! integer PCM with [SampleBuffer::mixdown()](audio::SampleBuffer::mixdown()).
//!
//! ```
//! use cadenza::prelude::*;
//!
//! let a = Signal::sine(440.0, 250.0);
//! let e = Signal::sine(660.0, 250.0);
//! let melody = (a.clone() | e | a) * FadeOut::new(50.0);
//! let pcm = melody.render(&RenderSettings::default()).unwrap();
//! assert_eq!(pcm.frames(), 33075);
//! ```
//!
//! Durations follow one rule everywhere: integers are sample counts, floats
//! are milliseconds. See [Duration](types::Duration).

/// A collection of imports that are useful to users of this crate. `use
/// cadenza::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        audio::prelude::*, curves::Curve, elements::prelude::*, error::Error,
        signals::prelude::*, traits::prelude::*, transforms::prelude::*, types::prelude::*,
        util::prelude::*,
    };
}

// Fundamental structures that are important enough to re-export at top level.
pub use {
    error::{Error, Result},
    signals::Signal,
};

pub mod audio;
pub mod curves;
pub mod elements;
pub mod error;
pub mod signals;
pub mod traits;
pub mod transforms;
pub mod types;
pub mod util;
