// SPDX-License-Identifier: MPL-2.0

//! Media processing utilities for color conversion
//!
//! Capture frames arrive as NV12 (YUV 4:2:0). Overlays are ARGB8888. The
//! raster backend and the software encoder both convert between the two.
//!
//! # Modules
//!
//! - [`color`]: BT.601 limited-range RGB/YUV conversion and alpha mixing
//! - [`nv12_converter`]: NV12 to RGB conversion for JPEG encoding

pub mod color;
pub mod nv12_converter;

pub use nv12_converter::convert_nv12_to_rgb;
