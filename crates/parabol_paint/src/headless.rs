//! Headless recording backend
//!
//! Keeps registered textures in memory and records every submitted batch
//! instead of drawing. Used by tests and offscreen tooling.

use crate::backend::{QuadBatch, RenderBackend};
use crate::texture::{TextureBitmap, TextureId};
use crate::{BackendError, Result};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Recording {
    textures: FxHashMap<TextureId, TextureBitmap>,
    destroyed: Vec<TextureId>,
    batches: Vec<QuadBatch>,
}

/// Backend that records instead of rendering
pub struct RecordingBackend {
    scale: AtomicU32,
    reject_uploads: AtomicBool,
    recording: Mutex<Recording>,
}

impl RecordingBackend {
    pub fn new(scale_factor: u32) -> Self {
        Self {
            scale: AtomicU32::new(scale_factor.max(1)),
            reject_uploads: AtomicBool::new(false),
            recording: Mutex::new(Recording::default()),
        }
    }

    fn recording(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate a display density change
    pub fn set_scale_factor(&self, scale_factor: u32) {
        self.scale.store(scale_factor.max(1), Ordering::SeqCst);
    }

    /// Make subsequent texture registrations fail
    pub fn set_reject_uploads(&self, reject: bool) {
        self.reject_uploads.store(reject, Ordering::SeqCst);
    }

    pub fn has_texture(&self, id: &TextureId) -> bool {
        self.recording().textures.contains_key(id)
    }

    pub fn texture_dimensions(&self, id: &TextureId) -> Option<(u32, u32)> {
        self.recording().textures.get(id).map(TextureBitmap::dimensions)
    }

    /// Coverage at `(x, y)` of a registered texture
    pub fn texture_alpha(&self, id: &TextureId, x: u32, y: u32) -> Option<u8> {
        self.recording()
            .textures
            .get(id)
            .map(|bitmap| bitmap.alpha_at(x, y))
    }

    pub fn texture_count(&self) -> usize {
        self.recording().textures.len()
    }

    pub fn texture_ids(&self) -> Vec<TextureId> {
        self.recording().textures.keys().cloned().collect()
    }

    pub fn destroyed(&self) -> Vec<TextureId> {
        self.recording().destroyed.clone()
    }

    /// Take the batches recorded since the last call
    pub fn take_batches(&self) -> Vec<QuadBatch> {
        std::mem::take(&mut self.recording().batches)
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RenderBackend for RecordingBackend {
    fn scale_factor(&self) -> u32 {
        self.scale.load(Ordering::SeqCst)
    }

    fn register_texture(&self, id: &TextureId, bitmap: TextureBitmap) -> Result<()> {
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(BackendError::TextureRejected(id.to_string()));
        }
        self.recording().textures.insert(id.clone(), bitmap);
        Ok(())
    }

    fn destroy_texture(&self, id: &TextureId) {
        let mut recording = self.recording();
        if recording.textures.remove(id).is_some() {
            recording.destroyed.push(id.clone());
        }
    }

    fn draw_quads(&self, batch: &QuadBatch) {
        self.recording().batches.push(batch.clone());
    }
}
