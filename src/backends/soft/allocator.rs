// SPDX-License-Identifier: GPL-3.0-only

//! Heap-backed media buffer allocator with release accounting

use crate::backends::BufferAllocator;
use crate::backends::types::{BufferId, BufferRecycler, ImageInfo, MediaBuffer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{trace, warn};

/// Snapshot of allocator counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorStats {
    /// Buffers handed out
    pub created: u64,
    /// Buffers returned
    pub released: u64,
    /// Buffers currently outstanding
    pub live: u64,
    /// Releases of ids that were not outstanding
    pub double_released: u64,
}

struct AllocatorState {
    next_id: AtomicU64,
    live: Mutex<HashSet<BufferId>>,
    created: AtomicU64,
    released: AtomicU64,
    double_released: AtomicU64,
    max_live: Option<usize>,
}

impl BufferRecycler for AllocatorState {
    fn recycle(&self, id: BufferId, info: &ImageInfo, _data: &[u8]) {
        let was_live = self
            .live
            .lock()
            .map(|mut live| live.remove(&id))
            .unwrap_or(false);

        if was_live {
            self.released.fetch_add(1, Ordering::Relaxed);
            trace!(id, image_type = %info.image_type, "Buffer released");
        } else {
            self.double_released.fetch_add(1, Ordering::Relaxed);
            warn!(id, "Release of a buffer that is not outstanding");
        }
    }
}

/// Allocator handing out zeroed heap buffers
///
/// Cloning shares the same pool and counters.
#[derive(Clone)]
pub struct HeapAllocator {
    state: Arc<AllocatorState>,
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Allocator that refuses requests once `max_live` buffers are outstanding
    pub fn with_limit(max_live: usize) -> Self {
        Self::build(Some(max_live))
    }

    fn build(max_live: Option<usize>) -> Self {
        Self {
            state: Arc::new(AllocatorState {
                next_id: AtomicU64::new(1),
                live: Mutex::new(HashSet::new()),
                created: AtomicU64::new(0),
                released: AtomicU64::new(0),
                double_released: AtomicU64::new(0),
                max_live,
            }),
        }
    }

    pub fn stats(&self) -> AllocatorStats {
        let live = self.state.live.lock().map(|l| l.len() as u64).unwrap_or(0);
        AllocatorStats {
            created: self.state.created.load(Ordering::Relaxed),
            released: self.state.released.load(Ordering::Relaxed),
            live,
            double_released: self.state.double_released.load(Ordering::Relaxed),
        }
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAllocator for HeapAllocator {
    fn create_buffer(&self, info: ImageInfo, size: usize) -> Option<MediaBuffer> {
        let id = {
            let mut live = self.state.live.lock().ok()?;
            if self.state.max_live.is_some_and(|max| live.len() >= max) {
                warn!(
                    live = live.len(),
                    image_type = %info.image_type,
                    "Allocator exhausted"
                );
                return None;
            }
            let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
            live.insert(id);
            id
        };
        self.state.created.fetch_add(1, Ordering::Relaxed);

        let recycler: Arc<dyn BufferRecycler> = self.state.clone();
        Some(MediaBuffer::new(id, info, size, Some(recycler)))
    }
}
