// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default capture width in pixels
pub const DEFAULT_SOURCE_WIDTH: u32 = 1920;

/// Default capture height in pixels
pub const DEFAULT_SOURCE_HEIGHT: u32 = 1080;

/// Default capture node of the image signal processor scaler
pub const DEFAULT_VIDEO_NODE: &str = "rkispp_scale0";

/// Number of buffers the capture channel cycles through
pub const DEFAULT_CAPTURE_BUFFER_COUNT: u32 = 3;

/// Nominal capture frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default on-screen-display rectangle (x, y, width, height)
pub const DEFAULT_OSD_X: u32 = 400;
pub const DEFAULT_OSD_Y: u32 = 400;
pub const DEFAULT_OSD_WIDTH: u32 = 320;
pub const DEFAULT_OSD_HEIGHT: u32 = 320;

/// Border line thickness in pixels
pub const DEFAULT_LINE_WIDTH: u32 = 4;

/// Frames discarded before the first raw frame
pub const DEFAULT_UNUSED_FRAMES: u32 = 0;

/// Frames forwarded to the encoder untouched
pub const DEFAULT_RAW_FRAMES: u32 = 0;

/// Frames composited with the overlay before encoding
pub const DEFAULT_PROCESSED_FRAMES: u32 = 1;

/// Default output directory for encoded packets
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/";

/// IQ file directory used when `--aiq` is given without a path
pub const DEFAULT_IQ_DIR: &str = "/oem/etc/iqfiles";

/// JPEG quality used by the software encoder
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// How often the main thread checks the termination flag
pub const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Overlay colors (ARGB8888)
pub mod colors {
    /// Fully transparent black, used to clear overlays
    pub const TRANSPARENT: u32 = 0x0000_0000;
    /// Opaque blue for the filled rectangle
    pub const OPAQUE_BLUE: u32 = 0xFF00_00FF;
    /// Opaque green for border rectangles
    pub const OPAQUE_GREEN: u32 = 0xFF00_FF00;
    /// Opaque black
    pub const OPAQUE_BLACK: u32 = 0xFF00_0000;
    /// Opaque white
    pub const OPAQUE_WHITE: u32 = 0xFFFF_FFFF;
}

/// Output file prefixes for encoded packets
pub const RAW_PACKET_PREFIX: &str = "osd_raw";
pub const PROCESSED_PACKET_PREFIX: &str = "osd_prod";
pub const PACKET_EXTENSION: &str = "jpeg";
