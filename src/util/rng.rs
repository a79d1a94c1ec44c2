// Copyright (c) 2024 Mike Tsao

//! Provides a seedable random-number generator for noise sources.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};
use delegate::delegate;

/// A pseudorandom number generator (PRNG) for noise generators, which need
/// reproducible streams rather than cryptographically secure ones.
#[derive(Debug, Clone)]
pub struct Rng(oorandom::Rand64);
#[allow(missing_docs)]
impl Rng {
    /// Pass the same number to [Rng::new_with_seed()] to get the same stream
    /// back again. Realizing a seeded noise leaf twice is bit-identical.
    pub fn new_with_seed(seed: u128) -> Self {
        Self(oorandom::Rand64::new(seed))
    }

    /// Seeds from the operating system's entropy source.
    pub fn new_from_entropy() -> Result<Self> {
        Ok(Self::new_with_seed(Self::generate_seed()?))
    }

    /// Create a sufficiently high-quality random number that's suitable for
    /// [Rng].
    pub fn generate_seed() -> Result<u128> {
        let mut bytes = [0u8; 16];

        getrandom::getrandom(&mut bytes)
            .map_err(|e| Error::UnsupportedOperation(format!("no entropy source: {e}")))?;
        Ok(BigEndian::read_u128(&bytes))
    }

    /// A uniformly distributed value in [-1.0, 1.0).
    pub fn rand_bipolar(&mut self) -> f64 {
        self.0.rand_float() * 2.0 - 1.0
    }

    delegate! {
        to self.0 {
            pub fn rand_u64(&mut self) -> u64;
            pub fn rand_float(&mut self) -> f64;
        }
    }
}
