// Copyright (c) 2024 Mike Tsao

//! System utilities.

/// Commonly used imports.
pub mod prelude {
    pub use super::{rng::Rng, settings::RenderSettings};
}

pub use rng::Rng;
pub use settings::{RenderSettings, RenderSettingsBuilder};

mod rng;
mod settings;
