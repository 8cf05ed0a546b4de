//! Render backend seam
//!
//! The text engine consumes, but does not implement, these capabilities:
//! texture registration, batched textured-quad submission and the device
//! scale factor query.
//!
//! Vertex structures use `#[repr(C)]` and implement `bytemuck::Pod` so a
//! backend can copy a batch straight into a GPU buffer.

use crate::texture::{TextureBitmap, TextureId};
use crate::Result;

/// One vertex of a textured, colored quad
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Position after the draw transform
    pub position: [f32; 2],
    /// Normalized texture coordinates
    pub uv: [f32; 2],
    /// RGBA, 0.0-1.0
    pub color: [f32; 4],
}

/// Quads sharing one texture, submitted as a single draw call
///
/// Vertices come in groups of four per quad: bottom-left, bottom-right,
/// top-right, top-left.
#[derive(Clone, Debug)]
pub struct QuadBatch {
    pub texture: TextureId,
    pub vertices: Vec<QuadVertex>,
}

impl QuadBatch {
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            vertices: Vec::new(),
        }
    }

    pub fn with_capacity(texture: TextureId, quads: usize) -> Self {
        Self {
            texture,
            vertices: Vec::with_capacity(quads * 4),
        }
    }

    pub fn push_quad(&mut self, quad: [QuadVertex; 4]) {
        self.vertices.extend_from_slice(&quad);
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn quads(&self) -> impl Iterator<Item = &[QuadVertex]> {
        self.vertices.chunks_exact(4)
    }

    /// Vertex data as bytes for a GPU buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Capabilities the engine needs from the graphics layer
///
/// `register_texture` and `destroy_texture` may only be called on the thread
/// owning the graphics context; route them through
/// [`TextureUploader`](crate::TextureUploader) from anywhere else.
pub trait RenderBackend: Send + Sync {
    /// Integer display density multiplier (1 on standard displays)
    fn scale_factor(&self) -> u32;

    /// Upload `bitmap` and make it bindable under `id`
    fn register_texture(&self, id: &TextureId, bitmap: TextureBitmap) -> Result<()>;

    /// Release the texture registered under `id`. Unknown ids are ignored.
    fn destroy_texture(&self, id: &TextureId);

    /// Bind `batch.texture` and draw every quad in the batch in one call
    ///
    /// A texture that was never registered must draw nothing rather than fail.
    fn draw_quads(&self, batch: &QuadBatch);
}
