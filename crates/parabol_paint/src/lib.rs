//! Parabol paint primitives
//!
//! The drawing-side surface the text engine renders through:
//!
//! - **Colors and transforms**: RGBA colors and a 2D affine transform stack
//! - **Quad batches**: textured, per-vertex colored quads submitted as one draw call
//! - **Render backend**: the seam to the GPU (texture registration, quad submission,
//!   device scale factor)
//! - **Render queue**: deferred work that must run on the thread owning the
//!   graphics context
//! - **Headless backend**: a recording backend for tests and offscreen tools

pub mod backend;
pub mod color;
pub mod headless;
pub mod queue;
pub mod texture;
pub mod transform;

pub use backend::{QuadBatch, QuadVertex, RenderBackend};
pub use color::Color;
pub use headless::RecordingBackend;
pub use queue::{RenderQueue, TextureUploader, Upload};
pub use texture::{ClipRect, TextureBitmap, TextureId};
pub use transform::{Transform2D, TransformStack};

use thiserror::Error;

/// Render backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Texture rejected by backend: {0}")]
    TextureRejected(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;
