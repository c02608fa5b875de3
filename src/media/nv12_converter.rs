// SPDX-License-Identifier: MPL-2.0

//! NV12 to RGB conversion for the software JPEG encoder

use super::color::yuv_to_rgb;
use crate::backends::types::{ImageType, ImageView};
use image::RgbImage;

/// Convert an NV12 image to packed RGB
///
/// Rows are processed in pairs so each chroma row is read once for the two
/// luma rows it covers.
pub fn convert_nv12_to_rgb(frame: &ImageView<'_>) -> Result<RgbImage, String> {
    let info = frame.info;
    if info.image_type != ImageType::NV12 {
        return Err(format!("Expected NV12 input, got {}", info.image_type));
    }
    if frame.data.len() < info.byte_size() {
        return Err(format!(
            "NV12 buffer too small: {} bytes for {}x{}",
            frame.data.len(),
            info.width,
            info.height
        ));
    }

    let width = info.width as usize;
    let height = info.height as usize;
    let stride = info.hor_stride as usize;

    let (y_plane, uv_plane) = frame.data.split_at(info.uv_offset());

    let mut rgb_data = vec![0u8; width * height * 3];

    for y_idx in (0..height).step_by(2) {
        let uv_row = y_idx / 2;
        process_row(y_plane, uv_plane, &mut rgb_data, y_idx, uv_row, width, stride);
        if y_idx + 1 < height {
            process_row(y_plane, uv_plane, &mut rgb_data, y_idx + 1, uv_row, width, stride);
        }
    }

    RgbImage::from_raw(info.width, info.height, rgb_data)
        .ok_or_else(|| "Failed to create RGB image from buffer".to_string())
}

#[inline]
fn process_row(
    y_plane: &[u8],
    uv_plane: &[u8],
    rgb_data: &mut [u8],
    y_idx: usize,
    uv_row: usize,
    width: usize,
    stride: usize,
) {
    let y_row_start = y_idx * stride;
    let uv_row_start = uv_row * stride;
    let rgb_row_start = y_idx * width * 3;

    // One chroma pair covers two horizontal pixels
    for x_idx in (0..width).step_by(2) {
        let uv_offset = uv_row_start + x_idx;
        let u = uv_plane[uv_offset];
        let v = uv_plane[uv_offset + 1];

        for px in x_idx..(x_idx + 2).min(width) {
            let (r, g, b) = yuv_to_rgb(y_plane[y_row_start + px], u, v);
            let out = rgb_row_start + px * 3;
            rgb_data[out] = r;
            rgb_data[out + 1] = g;
            rgb_data[out + 2] = b;
        }
    }
}
