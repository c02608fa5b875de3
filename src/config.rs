// SPDX-License-Identifier: GPL-3.0-only

//! Run configuration

use crate::backends::types::Rect;
use crate::constants::*;
use crate::errors::ConfigError;
use crate::pipelines::osd::{CompositeMode, LumaColor, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Video input node name
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Capture buffers that may be outstanding at once
    pub buffer_count: u32,
    pub frame_rate: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_VIDEO_NODE.to_string(),
            width: DEFAULT_SOURCE_WIDTH,
            height: DEFAULT_SOURCE_HEIGHT,
            buffer_count: DEFAULT_CAPTURE_BUFFER_COUNT,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// On-screen-display geometry and drawing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsdConfig {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Border thickness in pixels
    pub line_width: u32,
    /// Compositing mode: 0 filled rect, 1 border, 2 border with raw init,
    /// 3 direct draw on the frame planes
    pub mode: u32,
    /// Border color in direct-draw mode
    pub draw_color: LumaColor,
}

impl OsdConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for OsdConfig {
    fn default() -> Self {
        Self {
            x: DEFAULT_OSD_X,
            y: DEFAULT_OSD_Y,
            width: DEFAULT_OSD_WIDTH,
            height: DEFAULT_OSD_HEIGHT,
            line_width: DEFAULT_LINE_WIDTH,
            mode: 0,
            draw_color: LumaColor::default(),
        }
    }
}

/// Everything needed to run one compositing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub osd: OsdConfig,
    pub thresholds: Thresholds,
    pub output_dir: PathBuf,
    /// ISP tuning files; no ISP session is started when unset
    pub iq_dir: Option<PathBuf>,
    pub jpeg_quality: u8,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            osd: OsdConfig::default(),
            thresholds: Thresholds::new(
                DEFAULT_UNUSED_FRAMES,
                DEFAULT_RAW_FRAMES,
                DEFAULT_PROCESSED_FRAMES,
            ),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            iq_dir: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RunConfig {
    /// Check the configuration before any channel is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.composite_mode()?;

        let (width, height) = (self.source.width, self.source.height);
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ConfigError::InvalidSourceSize { width, height });
        }

        let osd = self.osd.rect();
        if osd.is_empty() {
            return Err(ConfigError::EmptyOsd);
        }
        if !osd.fits_within(width, height) {
            return Err(ConfigError::OsdOutOfBounds {
                x: osd.x,
                y: osd.y,
                width: osd.width,
                height: osd.height,
            });
        }

        if self.source.buffer_count == 0 {
            return Err(ConfigError::InvalidBufferCount(0));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }

    /// Compositing strategy selected by `osd.mode`
    pub fn composite_mode(&self) -> Result<CompositeMode, ConfigError> {
        CompositeMode::from_index(self.osd.mode, self.osd.line_width, self.osd.draw_color)
            .ok_or(ConfigError::InvalidMode(self.osd.mode))
    }
}
