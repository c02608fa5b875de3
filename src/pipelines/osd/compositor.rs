// SPDX-License-Identifier: GPL-3.0-only

//! Compositing of the OSD onto captured NV12 frames
//!
//! Two strategies are supported:
//!
//! - Overlay blend: an ARGB overlay is built per frame and blended under the
//!   frame content with destination-over at the OSD position.
//! - Direct draw: the border is filled straight into the luma/chroma planes.
//!   Only black and white map exactly onto limited-range YUV, so the color
//!   is restricted to those two.

use super::overlay::{OverlayBuilder, OverlayMode, border_strips};
use crate::backends::Raster;
use crate::backends::types::{BlendMode, ImStatus, ImageType, MediaBuffer, Rect};
use crate::constants::colors;
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// Border color usable on a 4:2:0 canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LumaColor {
    Black,
    #[default]
    White,
}

impl LumaColor {
    pub fn argb(self) -> u32 {
        match self {
            LumaColor::Black => colors::OPAQUE_BLACK,
            LumaColor::White => colors::OPAQUE_WHITE,
        }
    }
}

impl FromStr for LumaColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(LumaColor::Black),
            "white" => Ok(LumaColor::White),
            other => Err(format!("unsupported color '{}' (expected black or white)", other)),
        }
    }
}

impl std::fmt::Display for LumaColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LumaColor::Black => write!(f, "black"),
            LumaColor::White => write!(f, "white"),
        }
    }
}

/// Compositing strategy for composite-band frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Build an overlay and blend it onto the frame
    Overlay(OverlayMode),
    /// Draw a border directly into the frame planes
    DirectDraw { color: LumaColor, thickness: u32 },
}

impl CompositeMode {
    /// Map a numeric CLI mode (0..=3) to a strategy
    pub fn from_index(mode: u32, thickness: u32, color: LumaColor) -> Option<Self> {
        match mode {
            0 => Some(CompositeMode::Overlay(OverlayMode::FilledRect)),
            1 => Some(CompositeMode::Overlay(OverlayMode::BorderRect { thickness })),
            2 => Some(CompositeMode::Overlay(OverlayMode::BorderRectPreInit {
                thickness,
            })),
            3 => Some(CompositeMode::DirectDraw { color, thickness }),
            _ => None,
        }
    }
}

/// Draws the OSD onto frames in place
pub struct Compositor {
    osd: Rect,
    mode: CompositeMode,
    overlays: OverlayBuilder,
    raster: Arc<dyn Raster>,
}

impl Compositor {
    pub fn new(
        osd: Rect,
        mode: CompositeMode,
        overlays: OverlayBuilder,
        raster: Arc<dyn Raster>,
    ) -> Self {
        Self {
            osd,
            mode,
            overlays,
            raster,
        }
    }

    /// Composite the OSD onto `frame`
    ///
    /// The frame must be NV12. On error the frame content is unspecified and
    /// any overlay built for it has already been released.
    pub fn composite(&self, frame: &mut MediaBuffer) -> Result<(), PipelineError> {
        if frame.info().image_type != ImageType::NV12 {
            return Err(PipelineError::Operation {
                op: "composite",
                status: ImStatus::NotSupported,
            });
        }

        match self.mode {
            CompositeMode::Overlay(mode) => {
                let overlay = self.overlays.build(mode)?;
                let pat_rect = Rect::full(self.osd.width, self.osd.height);

                let status = self.raster.blend(
                    &mut frame.view_mut(),
                    &overlay.view(),
                    self.osd,
                    self.osd,
                    pat_rect,
                    BlendMode::DstOver,
                );
                status
                    .check()
                    .map_err(|status| PipelineError::Operation { op: "blend", status })?;
                trace!(sequence = frame.sequence(), overlay = overlay.id(), "Overlay blended");
            }
            CompositeMode::DirectDraw { color, thickness } => {
                let mut canvas = frame.view_mut();
                for strip in border_strips(self.osd, thickness) {
                    self.raster
                        .fill(&mut canvas, strip, color.argb())
                        .check()
                        .map_err(|status| PipelineError::Operation { op: "fill", status })?;
                }
                trace!(sequence = frame.sequence(), %color, "Border drawn on frame");
            }
        }
        Ok(())
    }
}
