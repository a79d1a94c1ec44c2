// Copyright (c) 2024 Mike Tsao

use crate::wav::decode_file;
use cadenza::{audio::SampleBuffer, Signal};
use rustc_hash::FxHashMap;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Keeps decoded audio files in memory so that each is read from disk only
/// once. The caller owns the cache and decides how long it lives; nothing is
/// cached behind its back.
#[derive(Debug, Default)]
pub struct SampleCache {
    buffers: FxHashMap<PathBuf, Arc<SampleBuffer>>,
}
impl SampleCache {
    /// Returns the decoded file, loading it on first use.
    pub fn load(&mut self, path: impl AsRef<Path>) -> anyhow::Result<Arc<SampleBuffer>> {
        let path = path.as_ref();
        if let Some(buffer) = self.buffers.get(path) {
            log::debug!("sample cache hit: {}", path.display());
            return Ok(Arc::clone(buffer));
        }
        log::debug!("sample cache miss: {}", path.display());
        let buffer = Arc::new(decode_file(path)?);
        self.buffers.insert(path.to_path_buf(), Arc::clone(&buffer));
        Ok(buffer)
    }

    /// A raw-audio leaf playing the file. Every signal made from the same
    /// path shares one decoded buffer.
    pub fn signal(&mut self, path: impl AsRef<Path>) -> anyhow::Result<Signal> {
        Ok(Signal::raw(self.load(path)?))
    }

    /// Forgets one file. Returns whether it was cached.
    pub fn evict(&mut self, path: impl AsRef<Path>) -> bool {
        self.buffers.remove(path.as_ref()).is_some()
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::encode;
    use cadenza::{audio::ByteWidth, types::SampleRate};

    fn write_test_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cadenza-{name}-{}.wav", std::process::id()));
        let quantized = Signal::square(100.0, 40)
            .realize(SampleRate(8000))
            .unwrap()
            .mixdown(ByteWidth::Two, Some(1.0))
            .unwrap();
        std::fs::write(&path, encode(&quantized).unwrap()).unwrap();
        path
    }

    #[test]
    fn loads_once() {
        let _ = env_logger::builder().is_test(true).try_init();
        let path = write_test_file("cache");
        let mut cache = SampleCache::default();
        assert!(cache.is_empty());

        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.len(), 40);

        // Once cached, the file itself is no longer needed.
        std::fs::remove_file(&path).unwrap();
        let signal = cache.signal(&path).unwrap();
        assert_eq!(signal.realize(SampleRate(8000)).unwrap().len(), 40);

        assert!(cache.evict(&path));
        assert!(!cache.evict(&path));
        assert!(cache.load(&path).is_err());
    }

    #[test]
    fn clear_empties() {
        let path = write_test_file("clear");
        let mut cache = SampleCache::default();
        cache.load(&path).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
