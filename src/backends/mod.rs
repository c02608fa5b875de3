// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for the media collaborators
//!
//! The compositing pipeline never touches hardware directly. Each external
//! service it depends on is reached through one trait:
//!
//! ```text
//! ┌──────────────┐   fetch    ┌──────────────────────┐  enqueue  ┌─────────────┐
//! │CaptureSource │ ─────────▶ │    OSD pipeline      │ ────────▶ │EncoderChannel│
//! └──────────────┘            │ classify / composite │           └──────┬──────┘
//!                             └───┬──────────────┬───┘                  │ packets
//!                                 │              │                      ▼
//!                    ┌────────────┴───┐   ┌──────┴─────┐          PacketCallback
//!                    │BufferAllocator │   │   Raster   │
//!                    └────────────────┘   └────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: Buffers, geometry and status codes shared by all backends
//! - [`frame_loop`]: Thread lifecycle for the capture-consumption loop
//! - [`soft`]: CPU implementations of every collaborator

pub mod frame_loop;
pub mod soft;
pub mod types;

pub use frame_loop::{CaptureLoopController, LoopAction};
pub use types::*;

use std::path::Path;

/// Media buffer allocator
pub trait BufferAllocator: Send + Sync {
    /// Allocate a buffer of `size` bytes described by `info`
    ///
    /// Returns `None` when memory cannot be obtained.
    fn create_buffer(&self, info: ImageInfo, size: usize) -> Option<MediaBuffer>;

    /// Allocate a buffer large enough for an uncompressed image
    ///
    /// `cached` requests CPU-cached memory; allocators without that
    /// distinction may ignore it.
    fn create_image_buffer(&self, info: ImageInfo, cached: bool) -> Option<MediaBuffer> {
        let _ = cached;
        self.create_buffer(info, info.byte_size())
    }
}

/// Video input channel
pub trait CaptureSource: Send + Sync {
    /// Layout of the frames this source produces
    fn info(&self) -> ImageInfo;

    /// Configure and enable the channel
    fn enable(&self) -> BackendResult<()>;

    /// Start streaming frames
    fn start_stream(&self) -> BackendResult<()>;

    /// Block until the next frame is available
    ///
    /// `None` is a transient failure: callers retry and must not count it
    /// as a received frame. A disabled source always returns `None`.
    fn fetch(&self) -> Option<MediaBuffer>;

    /// Stop streaming and wake any blocked `fetch`
    fn disable(&self);
}

/// 2D raster primitive (fill and alpha blend)
pub trait Raster: Send + Sync {
    /// Fill `rect` of `dst` with an ARGB8888 color
    fn fill(&self, dst: &mut ImageViewMut<'_>, rect: Rect, color: u32) -> ImStatus;

    /// Blend `pattern` onto `canvas`
    ///
    /// The canvas is both the source and the destination of the operation:
    /// `src_rect` is read from it and the result is written to `dst_rect`.
    /// `pat_rect` selects the pattern region.
    fn blend(
        &self,
        canvas: &mut ImageViewMut<'_>,
        pattern: &ImageView<'_>,
        src_rect: Rect,
        dst_rect: Rect,
        pat_rect: Rect,
        mode: BlendMode,
    ) -> ImStatus;
}

/// Callback receiving one encoded packet per call
///
/// Invoked from the encoder's own thread. The callee owns the packet and
/// releases it by dropping it.
pub type PacketCallback = Box<dyn Fn(MediaBuffer) + Send + Sync>;

/// Hardware encoder channel
pub trait EncoderChannel: Send + Sync {
    /// Register the packet output callback
    fn register_output(&self, callback: PacketCallback) -> BackendResult<()>;

    /// Hand a frame to the encoder's ingestion queue without waiting
    fn enqueue(&self, frame: SharedBuffer) -> ImStatus;

    /// Flush pending frames, stop the channel and drop the output callback
    fn destroy(&self);
}

/// Image signal processor tuning session
pub trait IspTuner: Send {
    /// Load the tuning files from `iq_dir` in normal (linear) working mode
    fn init(&mut self, iq_dir: &Path) -> BackendResult<()>;
    fn run(&mut self) -> BackendResult<()>;
    fn set_frame_rate(&mut self, fps: u32) -> BackendResult<()>;
    fn stop(&mut self);
}
