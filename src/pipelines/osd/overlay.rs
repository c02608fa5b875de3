// SPDX-License-Identifier: GPL-3.0-only

//! ARGB overlay construction

use crate::backends::types::{ImageInfo, ImageType, MediaBuffer, Rect};
use crate::backends::{BufferAllocator, Raster};
use crate::constants::colors;
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// How the overlay content is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Transparent buffer with the top half filled opaque blue
    FilledRect,
    /// Transparent buffer with an opaque green border
    BorderRect { thickness: u32 },
    /// Same output as `BorderRect`, but the buffer is cleared by writing
    /// memory directly instead of through the raster primitive
    BorderRectPreInit { thickness: u32 },
}

/// Top, bottom, left and right strips of a border drawn inside `rect`
///
/// The thickness is clamped to at least one pixel and to the rectangle's
/// size, so every strip stays inside `rect`. Strips may overlap on small
/// rectangles.
pub fn border_strips(rect: Rect, thickness: u32) -> [Rect; 4] {
    let horizontal = thickness.max(1).min(rect.height);
    let vertical = thickness.max(1).min(rect.width);
    [
        Rect::new(rect.x, rect.y, rect.width, horizontal),
        Rect::new(
            rect.x,
            rect.y + rect.height - horizontal,
            rect.width,
            horizontal,
        ),
        Rect::new(rect.x, rect.y, vertical, rect.height),
        Rect::new(
            rect.x + rect.width - vertical,
            rect.y,
            vertical,
            rect.height,
        ),
    ]
}

/// Builds overlays sized to the OSD rectangle
pub struct OverlayBuilder {
    width: u32,
    height: u32,
    allocator: Arc<dyn BufferAllocator>,
    raster: Arc<dyn Raster>,
}

impl OverlayBuilder {
    pub fn new(
        width: u32,
        height: u32,
        allocator: Arc<dyn BufferAllocator>,
        raster: Arc<dyn Raster>,
    ) -> Self {
        Self {
            width,
            height,
            allocator,
            raster,
        }
    }

    /// Allocate and draw a new overlay
    ///
    /// The returned buffer is released when dropped, including on the error
    /// path of a later operation.
    pub fn build(&self, mode: OverlayMode) -> Result<MediaBuffer, PipelineError> {
        let info = ImageInfo::new(self.width, self.height, ImageType::ARGB8888);
        let mut overlay = self
            .allocator
            .create_image_buffer(info, true)
            .ok_or_else(|| {
                PipelineError::Allocation(format!(
                    "{}x{} {} overlay",
                    self.width,
                    self.height,
                    ImageType::ARGB8888
                ))
            })?;

        let full = Rect::full(self.width, self.height);
        match mode {
            OverlayMode::FilledRect => {
                self.fill(&mut overlay, full, colors::TRANSPARENT)?;
                let top_half = Rect::new(0, 0, self.width, self.height / 2);
                if !top_half.is_empty() {
                    self.fill(&mut overlay, top_half, colors::OPAQUE_BLUE)?;
                }
            }
            OverlayMode::BorderRect { thickness } => {
                self.fill(&mut overlay, full, colors::TRANSPARENT)?;
                self.draw_border(&mut overlay, full, thickness)?;
            }
            OverlayMode::BorderRectPreInit { thickness } => {
                overlay.argb_pixels_mut().fill(colors::TRANSPARENT);
                self.draw_border(&mut overlay, full, thickness)?;
            }
        }

        trace!(id = overlay.id(), ?mode, "Overlay built");
        Ok(overlay)
    }

    fn draw_border(
        &self,
        overlay: &mut MediaBuffer,
        rect: Rect,
        thickness: u32,
    ) -> Result<(), PipelineError> {
        for strip in border_strips(rect, thickness) {
            self.fill(overlay, strip, colors::OPAQUE_GREEN)?;
        }
        Ok(())
    }

    fn fill(&self, overlay: &mut MediaBuffer, rect: Rect, color: u32) -> Result<(), PipelineError> {
        self.raster
            .fill(&mut overlay.view_mut(), rect, color)
            .check()
            .map_err(|status| PipelineError::Operation { op: "fill", status })
    }
}
