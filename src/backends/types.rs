// SPDX-License-Identifier: GPL-3.0-only
// Shared types for media backend abstraction

//! Buffer, geometry and status types shared by the pipeline and its backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel layout of a media buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageType {
    /// YCbCr 4:2:0 semi-planar: full Y plane followed by interleaved CbCr
    NV12,
    /// 32-bit ARGB, one native-endian `u32` per pixel laid out as 0xAARRGGBB
    ARGB8888,
    /// Compressed JPEG bitstream
    JPEG,
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageType::NV12 => write!(f, "NV12"),
            ImageType::ARGB8888 => write!(f, "ARGB8888"),
            ImageType::JPEG => write!(f, "JPEG"),
        }
    }
}

/// Geometry and layout of an image buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Row stride in pixels
    pub hor_stride: u32,
    /// Number of rows allocated per plane
    pub ver_stride: u32,
    pub image_type: ImageType,
}

impl ImageInfo {
    /// Describe a tightly packed image.
    ///
    /// NV12 strides are rounded up to even so the chroma plane always covers
    /// the whole luma plane.
    pub fn new(width: u32, height: u32, image_type: ImageType) -> Self {
        let (hor_stride, ver_stride) = match image_type {
            ImageType::NV12 => (width.next_multiple_of(2), height.next_multiple_of(2)),
            _ => (width, height),
        };
        Self {
            width,
            height,
            hor_stride,
            ver_stride,
            image_type,
        }
    }

    /// Bytes needed to hold the image (zero for compressed types)
    pub fn byte_size(&self) -> usize {
        let stride = self.hor_stride as usize;
        let rows = self.ver_stride as usize;
        match self.image_type {
            ImageType::NV12 => stride * rows + stride * rows.div_ceil(2),
            ImageType::ARGB8888 => stride * rows * 4,
            ImageType::JPEG => 0,
        }
    }

    /// Byte offset of the interleaved chroma plane for NV12
    pub fn uv_offset(&self) -> usize {
        self.hor_stride as usize * self.ver_stride as usize
    }
}

/// Sub-region of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width`x`height` image
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the rectangle lies entirely inside a `width`x`height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && py >= self.y
            && u64::from(px) < u64::from(self.x) + u64::from(self.width)
            && u64::from(py) < u64::from(self.y) + u64::from(self.height)
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Status returned by raster operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImStatus {
    Success,
    NotSupported,
    InvalidParam,
    Failed,
}

impl ImStatus {
    pub fn is_success(self) -> bool {
        self == ImStatus::Success
    }

    /// Human readable description of the status
    pub fn str_error(self) -> &'static str {
        match self {
            ImStatus::Success => "No errors during operation",
            ImStatus::NotSupported => "Unsupported function",
            ImStatus::InvalidParam => "Invalid parameters",
            ImStatus::Failed => "Operation failed",
        }
    }

    /// Convert into a `Result` so sequences of operations can use `?`
    pub fn check(self) -> Result<(), ImStatus> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ImStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str_error())
    }
}

/// Porter-Duff operator used when blending a pattern onto a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Pattern drawn over the canvas
    SrcOver,
    /// Pattern drawn beneath the canvas, showing through where the canvas is
    /// transparent
    #[default]
    DstOver,
}

/// Identifier assigned by the allocator to each buffer
pub type BufferId = u64;

/// Receives buffers back when their last owner drops them
pub trait BufferRecycler: Send + Sync {
    /// Called exactly once per buffer, with its final contents
    fn recycle(&self, id: BufferId, info: &ImageInfo, data: &[u8]);
}

/// Media buffer with scoped ownership
///
/// Storage is word aligned so ARGB pixels can be addressed as `u32` without
/// copying. Dropping the buffer hands it back to its recycler, which makes
/// release automatic on every exit path.
pub struct MediaBuffer {
    id: BufferId,
    info: ImageInfo,
    storage: Box<[u32]>,
    size: usize,
    sequence: u64,
    recycler: Option<Arc<dyn BufferRecycler>>,
}

/// Read-only buffer shared between the pipeline and the encoder
pub type SharedBuffer = Arc<MediaBuffer>;

impl MediaBuffer {
    /// Create a zeroed buffer of `size` bytes
    pub fn new(
        id: BufferId,
        info: ImageInfo,
        size: usize,
        recycler: Option<Arc<dyn BufferRecycler>>,
    ) -> Self {
        Self {
            id,
            info,
            storage: vec![0u32; size.div_ceil(4)].into_boxed_slice(),
            size,
            sequence: 0,
            recycler,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Size of the valid data in bytes
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Sequence index assigned by the producer
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    pub fn data(&self) -> &[u8] {
        &bytemuck::cast_slice::<u32, u8>(&self.storage)[..self.size]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<u32, u8>(&mut self.storage)[..self.size]
    }

    /// Whole pixels of the buffer viewed as ARGB words
    pub fn argb_pixels_mut(&mut self) -> &mut [u32] {
        let words = self.size / 4;
        &mut self.storage[..words]
    }

    /// Wrap the buffer for read-only raster access using its own layout
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: self.data(),
            info: self.info,
        }
    }

    /// Wrap the buffer for raster access using its own layout
    pub fn view_mut(&mut self) -> ImageViewMut<'_> {
        let info = self.info;
        ImageViewMut {
            data: self.data_mut(),
            info,
        }
    }

    /// Freeze the buffer so it can be handed to another owner
    pub fn into_shared(self) -> SharedBuffer {
        Arc::new(self)
    }
}

impl Drop for MediaBuffer {
    fn drop(&mut self) {
        if let Some(recycler) = self.recycler.take() {
            recycler.recycle(self.id, &self.info, self.data());
        }
    }
}

impl std::fmt::Debug for MediaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MediaBuffer(id={}, {}x{} {}, {} bytes, seq={})",
            self.id,
            self.info.width,
            self.info.height,
            self.info.image_type,
            self.size,
            self.sequence
        )
    }
}

/// Read-only raster view over a byte buffer with explicit layout metadata
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub data: &'a [u8],
    pub info: ImageInfo,
}

/// Mutable raster view over a byte buffer with explicit layout metadata
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    pub data: &'a mut [u8],
    pub info: ImageInfo,
}

/// Wrap raw memory as an image of the given layout
pub fn wrap_buffer(data: &[u8], width: u32, height: u32, image_type: ImageType) -> ImageView<'_> {
    ImageView {
        data,
        info: ImageInfo::new(width, height, image_type),
    }
}

/// Wrap raw memory as a mutable image of the given layout
pub fn wrap_buffer_mut(
    data: &mut [u8],
    width: u32,
    height: u32,
    image_type: ImageType,
) -> ImageViewMut<'_> {
    ImageViewMut {
        data,
        info: ImageInfo::new(width, height, image_type),
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Failed to initialize a channel
    InitializationFailed(String),
    /// Capture device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// Channel has already been torn down
    Destroyed,
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Destroyed => write!(f, "Channel already destroyed"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
