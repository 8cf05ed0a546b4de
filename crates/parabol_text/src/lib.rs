//! Glyph-atlas text rendering for Parabol
//!
//! This crate provides:
//! - Font loading and registration (TTF/OTF via ttf-parser, system fonts via fontdb)
//! - A per-(font, size) renderer cache
//! - Lazily generated, code-point-paged glyph atlases per style variant
//! - Glyph rasterization (swash) with synthetic bold and italic
//! - Styled text spans, measurement, and per-texture draw batching

pub mod atlas;
pub mod cache;
pub mod config;
pub mod font;
pub mod manager;
pub mod model;
pub mod rasterizer;
pub mod registry;
pub mod renderer;
pub mod resources;

pub use atlas::{AtlasPage, Glyph};
pub use cache::{FontRendererCache, RendererKey};
pub use config::{BundledFont, EngineConfig};
pub use font::{FontFace, FontMetrics};
pub use manager::FontManager;
pub use model::{Text, TextSpan, TextStyle};
pub use rasterizer::{GlyphRasterizer, RasterizedGlyph, StyledFace};
pub use registry::{FontRegistry, SystemFontSpec};
pub use renderer::{DrawStats, FontRenderer};
pub use resources::{DirectoryResources, EmbeddedResources, ResourceLoader};

pub use parabol_paint::BackendError;
use thiserror::Error;

/// Reasons a font byte stream could not be registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontLoadError {
    #[error("Font resource not found: {0}")]
    MissingResource(String),

    #[error("Invalid font format: {0}")]
    InvalidFormat(String),
}

/// Text rendering errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Font '{0}' could not be resolved")]
    FontResolution(String),

    #[error("Texture upload failed: {0}")]
    TextureUpload(#[from] BackendError),

    #[error("Cannot style or color an empty text")]
    EmptyModel,

    #[error("Invalid engine configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
