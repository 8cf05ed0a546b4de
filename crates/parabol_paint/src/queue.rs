//! Deferred work for the thread that owns the graphics context
//!
//! Texture registration may be requested from any thread. Requests made on the
//! owning thread run immediately; anything else is queued and runs the next
//! time the owning subsystem drains the queue (once per frame). There is no
//! completion signal: a texture scheduled this way is simply not bound yet if
//! a draw reads it first, and the backend draws nothing for it.

use crate::backend::RenderBackend;
use crate::texture::{TextureBitmap, TextureId};
use crate::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-consumer task queue bound to the graphics-owning thread
pub struct RenderQueue {
    owner: ThreadId,
    tasks: Mutex<VecDeque<Task>>,
}

impl RenderQueue {
    /// Create a queue owned by the calling thread
    pub fn new() -> Self {
        Self::with_owner(thread::current().id())
    }

    pub fn with_owner(owner: ThreadId) -> Self {
        Self {
            owner,
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Run `task` now when called on the owning thread, otherwise enqueue it.
    /// Returns `true` when the task ran immediately.
    pub fn run_or_schedule<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_owner() {
            task();
            true
        } else {
            self.tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Box::new(task));
            false
        }
    }

    /// Run all queued tasks in submission order. Only the owning thread drains.
    pub fn drain(&self) -> usize {
        if !self.is_owner() {
            tracing::warn!("RenderQueue::drain called off the owning thread; ignored");
            return 0;
        }

        // Take the batch first so tasks may schedule more work without deadlocking
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a texture upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upload {
    /// Registered with the backend before returning
    Registered,
    /// Queued for the owning thread
    Scheduled,
}

/// Routes texture registration and release onto the owning thread
#[derive(Clone)]
pub struct TextureUploader {
    backend: Arc<dyn RenderBackend>,
    queue: Arc<RenderQueue>,
}

impl TextureUploader {
    pub fn new(backend: Arc<dyn RenderBackend>, queue: Arc<RenderQueue>) -> Self {
        Self { backend, queue }
    }

    pub fn backend(&self) -> &Arc<dyn RenderBackend> {
        &self.backend
    }

    pub fn queue(&self) -> &Arc<RenderQueue> {
        &self.queue
    }

    /// Register `bitmap` under `id`
    ///
    /// On the owning thread the backend result is returned directly. Off
    /// thread the upload is scheduled and a later failure is only logged.
    pub fn upload(&self, id: TextureId, bitmap: TextureBitmap) -> Result<Upload> {
        if self.queue.is_owner() {
            self.backend.register_texture(&id, bitmap)?;
            return Ok(Upload::Registered);
        }

        let backend = Arc::clone(&self.backend);
        self.queue.run_or_schedule(move || {
            if let Err(e) = backend.register_texture(&id, bitmap) {
                tracing::error!("Deferred texture upload for {} failed: {}", id, e);
            }
        });
        Ok(Upload::Scheduled)
    }

    /// Release the texture under `id` on the owning thread
    ///
    /// Queued after any pending upload of the same id, so release always
    /// follows registration.
    pub fn release(&self, id: TextureId) {
        let backend = Arc::clone(&self.backend);
        self.queue.run_or_schedule(move || backend.destroy_texture(&id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_immediately_on_owner() {
        let queue = RenderQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        assert!(queue.run_or_schedule(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_schedules_off_thread() {
        let queue = Arc::new(RenderQueue::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let q = Arc::clone(&queue);
        let h = Arc::clone(&hits);
        let ran_now = thread::spawn(move || {
            q.run_or_schedule(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
        })
        .join()
        .unwrap();

        assert!(!ran_now);
        assert_eq!(queue.pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drain_off_thread_is_ignored() {
        let queue = Arc::new(RenderQueue::with_owner(
            thread::spawn(|| thread::current().id()).join().unwrap(),
        ));
        queue.run_or_schedule(|| {});
        assert_eq!(queue.drain(), 0);
        assert_eq!(queue.pending(), 1);
    }
}
