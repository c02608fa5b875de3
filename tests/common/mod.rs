// SPDX-License-Identifier: MPL-2.0

//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use osd_compositor::backends::soft::SoftRaster;
use osd_compositor::backends::{
    BackendResult, BlendMode, BufferAllocator, BufferId, BufferRecycler, CaptureSource,
    EncoderChannel, ImStatus, ImageInfo, ImageType, ImageView, ImageViewMut, MediaBuffer,
    PacketCallback, Raster, Rect, SharedBuffer,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Final state of a buffer when it was handed back
#[derive(Debug, Clone)]
pub struct Release {
    pub id: BufferId,
    pub image_type: ImageType,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct Ledger {
    created: Mutex<Vec<BufferId>>,
    released: Mutex<Vec<Release>>,
}

impl BufferRecycler for Ledger {
    fn recycle(&self, id: BufferId, info: &ImageInfo, data: &[u8]) {
        self.released.lock().unwrap().push(Release {
            id,
            image_type: info.image_type,
            data: data.to_vec(),
        });
    }
}

/// Allocator recording every creation and every release with its contents
#[derive(Clone, Default)]
pub struct TrackingAllocator {
    next_id: Arc<AtomicU64>,
    ledger: Arc<Ledger>,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<BufferId> {
        self.ledger.created.lock().unwrap().clone()
    }

    pub fn releases(&self) -> Vec<Release> {
        self.ledger.released.lock().unwrap().clone()
    }

    pub fn release_count(&self, id: BufferId) -> usize {
        self.releases().iter().filter(|r| r.id == id).count()
    }
}

impl BufferAllocator for TrackingAllocator {
    fn create_buffer(&self, info: ImageInfo, size: usize) -> Option<MediaBuffer> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.ledger.created.lock().unwrap().push(id);
        let recycler: Arc<dyn BufferRecycler> = self.ledger.clone();
        Some(MediaBuffer::new(id, info, size, Some(recycler)))
    }
}

/// Capture source replaying a fixed script
///
/// `Some(luma)` yields an NV12 frame whose luma plane is a ramp starting at
/// `luma`; `None` yields a transient failure. Once the script is exhausted
/// `fetch` blocks until the source is disabled.
pub struct ScriptedCapture {
    info: ImageInfo,
    allocator: Arc<dyn BufferAllocator>,
    script: Mutex<VecDeque<Option<u8>>>,
    disabled: Mutex<bool>,
    wake: Condvar,
    next_sequence: AtomicU64,
}

impl ScriptedCapture {
    pub fn new(
        width: u32,
        height: u32,
        allocator: Arc<dyn BufferAllocator>,
        script: Vec<Option<u8>>,
    ) -> Self {
        Self {
            info: ImageInfo::new(width, height, ImageType::NV12),
            allocator,
            script: Mutex::new(script.into()),
            disabled: Mutex::new(false),
            wake: Condvar::new(),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Contents of the frame produced for script entry `luma`
    pub fn frame_bytes(info: &ImageInfo, luma: u8) -> Vec<u8> {
        let mut data = vec![128u8; info.byte_size()];
        let uv_offset = info.uv_offset();
        for (i, px) in data[..uv_offset].iter_mut().enumerate() {
            *px = luma.wrapping_add((i % 97) as u8);
        }
        data
    }
}

impl CaptureSource for ScriptedCapture {
    fn info(&self) -> ImageInfo {
        self.info
    }

    fn enable(&self) -> BackendResult<()> {
        Ok(())
    }

    fn start_stream(&self) -> BackendResult<()> {
        Ok(())
    }

    fn fetch(&self) -> Option<MediaBuffer> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Some(luma)) => {
                let mut frame = self.allocator.create_image_buffer(self.info, true)?;
                frame
                    .data_mut()
                    .copy_from_slice(&Self::frame_bytes(&self.info, luma));
                frame.set_sequence(self.next_sequence.fetch_add(1, Ordering::SeqCst));
                Some(frame)
            }
            Some(None) => None,
            None => {
                let mut disabled = self.disabled.lock().unwrap();
                while !*disabled {
                    disabled = self.wake.wait(disabled).unwrap();
                }
                None
            }
        }
    }

    fn disable(&self) {
        *self.disabled.lock().unwrap() = true;
        self.wake.notify_all();
    }
}

/// Raster that fills normally but fails every blend
#[derive(Default)]
pub struct FailingBlendRaster {
    inner: SoftRaster,
}

impl Raster for FailingBlendRaster {
    fn fill(&self, dst: &mut ImageViewMut<'_>, rect: Rect, color: u32) -> ImStatus {
        self.inner.fill(dst, rect, color)
    }

    fn blend(
        &self,
        _canvas: &mut ImageViewMut<'_>,
        _pattern: &ImageView<'_>,
        _src_rect: Rect,
        _dst_rect: Rect,
        _pat_rect: Rect,
        _mode: BlendMode,
    ) -> ImStatus {
        ImStatus::Failed
    }
}

/// Encoder recording the sequence of every frame it is given
#[derive(Default)]
pub struct RecordingEncoder {
    pub sequences: Mutex<Vec<u64>>,
    pub destroyed: Mutex<bool>,
}

impl RecordingEncoder {
    pub fn sequences(&self) -> Vec<u64> {
        self.sequences.lock().unwrap().clone()
    }
}

impl EncoderChannel for RecordingEncoder {
    fn register_output(&self, _callback: PacketCallback) -> BackendResult<()> {
        Ok(())
    }

    fn enqueue(&self, frame: SharedBuffer) -> ImStatus {
        self.sequences.lock().unwrap().push(frame.sequence());
        ImStatus::Success
    }

    fn destroy(&self) {
        *self.destroyed.lock().unwrap() = true;
    }
}

/// Fresh per-test output directory
pub fn temp_output_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "osd-compositor-{}-{}",
        name,
        uuid::Uuid::new_v4()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
