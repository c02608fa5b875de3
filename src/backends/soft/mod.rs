// SPDX-License-Identifier: GPL-3.0-only

//! CPU implementations of the media collaborators
//!
//! These let the pipeline run end to end on a development host and give
//! tests deterministic building blocks.

pub mod allocator;
pub mod capture;
pub mod encoder;
pub mod isp;
pub mod raster;

pub use allocator::{AllocatorStats, HeapAllocator};
pub use capture::SyntheticCapture;
pub use encoder::JpegEncoderChannel;
pub use isp::LoggingIsp;
pub use raster::SoftRaster;
