//! Renderer cache keyed by (font name, pixel size)

use crate::renderer::FontRenderer;
use crate::Result;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cache key: font name and integer pixel size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RendererKey {
    pub name: String,
    pub size: u32,
}

impl RendererKey {
    /// Fractional sizes are truncated, so 12.0 and 12.7 share a renderer
    pub fn new(name: &str, pixel_size: f32) -> Self {
        Self {
            name: name.to_string(),
            size: pixel_size.max(0.0) as u32,
        }
    }
}

/// A key's renderer, filled by the first successful build
type Slot = Arc<Mutex<Option<Arc<FontRenderer>>>>;

/// Lazily populated map of renderers; entries live until the cache is cleared
///
/// The map lock only guards slot lookup. Building a renderer holds just that
/// key's slot, so a slow build (a first system font scan, say) never blocks
/// hits on other keys.
#[derive(Default)]
pub struct FontRendererCache {
    slots: Mutex<FxHashMap<RendererKey, Slot>>,
}

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<Arc<FontRenderer>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FontRendererCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, FxHashMap<RendererKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The renderer for `key`, building it with `create` on a miss
    ///
    /// Concurrent misses on the same key build exactly one renderer. A failed
    /// build caches nothing; the next request tries again.
    pub fn get_or_create<F>(&self, key: RendererKey, create: F) -> Result<Arc<FontRenderer>>
    where
        F: FnOnce(&RendererKey) -> Result<FontRenderer>,
    {
        let slot = Arc::clone(self.slots().entry(key.clone()).or_default());

        let mut built = lock_slot(&slot);
        if let Some(existing) = built.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let renderer = Arc::new(create(&key)?);
        tracing::debug!("Created font renderer {}@{}px", key.name, key.size);
        *built = Some(Arc::clone(&renderer));
        Ok(renderer)
    }

    pub fn get(&self, key: &RendererKey) -> Option<Arc<FontRenderer>> {
        let slot = self.slots().get(key).cloned()?;
        let renderer = lock_slot(&slot).clone();
        renderer
    }

    /// Number of built renderers
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots().values().cloned().collect();
        slots.iter().filter(|slot| lock_slot(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear down every renderer; atlases are released once the last
    /// outstanding handle to each renderer is dropped
    pub fn clear(&self) {
        let drained: Vec<Slot> = self.slots().drain().map(|(_, slot)| slot).collect();
        let renderers: Vec<_> = drained
            .iter()
            .filter_map(|slot| lock_slot(slot).take())
            .collect();
        tracing::debug!("Cleared {} font renderers", renderers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextError;
    use std::sync::mpsc;

    #[test]
    fn test_key_truncates_size() {
        assert_eq!(RendererKey::new("Foo", 12.7), RendererKey::new("Foo", 12.0));
        assert_ne!(RendererKey::new("Foo", 12.0), RendererKey::new("Foo", 13.0));
        assert_ne!(RendererKey::new("Foo", 12.0), RendererKey::new("Bar", 12.0));
    }

    #[test]
    fn test_failed_creation_is_not_cached() {
        let cache = FontRendererCache::new();
        let result = cache.get_or_create(RendererKey::new("Missing", 10.0), |key| {
            Err(TextError::FontResolution(key.name.clone()))
        });
        assert!(matches!(result, Err(TextError::FontResolution(_))));
        assert!(cache.is_empty());
        assert!(cache.get(&RendererKey::new("Missing", 10.0)).is_none());
    }

    #[test]
    fn test_slow_build_does_not_block_other_keys() {
        let cache = FontRendererCache::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        std::thread::scope(|s| {
            let cache = &cache;
            let slow = s.spawn(move || {
                cache.get_or_create(RendererKey::new("Slow", 10.0), |key| {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Err(TextError::FontResolution(key.name.clone()))
                })
            });

            started_rx.recv().unwrap();
            let other = cache.get_or_create(RendererKey::new("Other", 10.0), |key| {
                Err(TextError::FontResolution(key.name.clone()))
            });
            assert!(matches!(other, Err(TextError::FontResolution(name)) if name == "Other"));

            release_tx.send(()).unwrap();
            assert!(slow.join().unwrap().is_err());
        });
        assert!(cache.is_empty());
    }
}
