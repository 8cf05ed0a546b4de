//! Font manager
//!
//! Entry point of the text engine: owns the font registry, the renderer cache
//! and the handle to the render backend. Bundled fonts named in the
//! configuration are registered when the manager is created.

use crate::cache::{FontRendererCache, RendererKey};
use crate::config::EngineConfig;
use crate::registry::FontRegistry;
use crate::renderer::FontRenderer;
use crate::resources::ResourceLoader;
use crate::{FontLoadError, Result};
use parabol_paint::{RenderBackend, RenderQueue, TextureUploader};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub struct FontManager {
    config: EngineConfig,
    registry: Mutex<FontRegistry>,
    renderers: FontRendererCache,
    uploader: TextureUploader,
    resources: Box<dyn ResourceLoader>,
    default_font: RwLock<String>,
}

impl FontManager {
    /// Create a manager whose render thread is the calling thread
    pub fn new(
        config: EngineConfig,
        backend: Arc<dyn RenderBackend>,
        resources: Box<dyn ResourceLoader>,
    ) -> Self {
        Self::with_registry(
            config,
            backend,
            Arc::new(RenderQueue::new()),
            resources,
            FontRegistry::new(),
        )
    }

    /// Create a manager with an explicit render queue and registry
    pub fn with_registry(
        config: EngineConfig,
        backend: Arc<dyn RenderBackend>,
        queue: Arc<RenderQueue>,
        resources: Box<dyn ResourceLoader>,
        registry: FontRegistry,
    ) -> Self {
        let manager = Self {
            default_font: RwLock::new(config.default_font.clone()),
            uploader: TextureUploader::new(backend, queue),
            registry: Mutex::new(registry),
            renderers: FontRendererCache::new(),
            resources,
            config,
        };

        for font in &manager.config.bundled_fonts {
            if let Err(e) = manager.register_font_resource(&font.path, &font.name) {
                tracing::warn!("Skipping bundled font '{}': {}", font.name, e);
            }
        }

        manager
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn uploader(&self) -> &TextureUploader {
        &self.uploader
    }

    fn registry(&self) -> MutexGuard<'_, FontRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `bytes` and register them as font `name`
    ///
    /// Failures are logged and returned; the name stays unregistered.
    pub fn register_font(&self, bytes: Vec<u8>, name: &str) -> Result<()> {
        match self.registry().register_font(name, bytes) {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Failed to register font '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// Register the resource at `path` as font `name`
    pub fn register_font_resource(&self, path: &str, name: &str) -> Result<()> {
        let bytes = self
            .resources
            .load(path)
            .ok_or_else(|| FontLoadError::MissingResource(path.to_string()))?;
        self.register_font(bytes, name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry().is_registered(name)
    }

    /// Set the default font name; resolution happens on next use
    pub fn set_default_font(&self, name: &str) {
        *self
            .default_font
            .write()
            .unwrap_or_else(PoisonError::into_inner) = name.to_string();
    }

    pub fn default_font(&self) -> String {
        self.default_font
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The renderer for (`name`, `pixel_size`), created on first request
    pub fn get_or_load_renderer(&self, name: &str, pixel_size: f32) -> Result<Arc<FontRenderer>> {
        self.renderers
            .get_or_create(RendererKey::new(name, pixel_size), |key| {
                let font = self.registry().resolve(&key.name)?;
                Ok(FontRenderer::new(
                    font,
                    key.size as f32,
                    &self.config,
                    self.uploader.clone(),
                ))
            })
    }

    pub fn default_renderer(&self, pixel_size: f32) -> Result<Arc<FontRenderer>> {
        self.get_or_load_renderer(&self.default_font(), pixel_size)
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    /// Run texture work scheduled from other threads; call once per frame on
    /// the render thread
    pub fn drain_render_queue(&self) -> usize {
        self.uploader.queue().drain()
    }
}

impl Drop for FontManager {
    fn drop(&mut self) {
        self.renderers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::EmbeddedResources;
    use crate::TextError;
    use parabol_paint::RecordingBackend;

    fn manager() -> FontManager {
        FontManager::with_registry(
            EngineConfig::default(),
            Arc::new(RecordingBackend::default()),
            Arc::new(RenderQueue::new()),
            Box::new(EmbeddedResources::new()),
            FontRegistry::with_database(fontdb::Database::new()),
        )
    }

    #[test]
    fn test_missing_bundled_font_is_skipped() {
        let manager = manager();
        assert!(!manager.is_registered("RobotoRegular"));
        assert_eq!(manager.default_font(), "RobotoRegular");
    }

    #[test]
    fn test_set_default_font_does_not_validate() {
        let manager = manager();
        manager.set_default_font("Nowhere");
        assert_eq!(manager.default_font(), "Nowhere");
        assert!(matches!(
            manager.default_renderer(12.0),
            Err(TextError::FontResolution(_))
        ));
        assert_eq!(manager.renderer_count(), 0);
    }

    #[test]
    fn test_register_invalid_bytes() {
        let manager = manager();
        assert!(manager.register_font(vec![0; 16], "Broken").is_err());
        assert!(!manager.is_registered("Broken"));
    }
}
