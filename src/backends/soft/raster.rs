// SPDX-License-Identifier: MPL-2.0

//! CPU raster primitive: rectangle fill and alpha blend
//!
//! Supports ARGB8888 and NV12 canvases. NV12 carries no alpha plane, so
//! when a pattern is blended onto it the pattern's own alpha is the only
//! coverage term, whichever [`BlendMode`] is requested. Colors are mapped to
//! the luma/chroma planes with BT.601 limited range; only black and white
//! are exact there.

use crate::backends::Raster;
use crate::backends::types::{
    BlendMode, ImStatus, ImageInfo, ImageType, ImageView, ImageViewMut, Rect,
};
use crate::media::color::{argb_to_yuv, mix, pack_argb, unpack_argb};
use tracing::trace;

/// Software implementation of [`Raster`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftRaster;

impl SoftRaster {
    pub fn new() -> Self {
        Self
    }
}

fn check_image(info: &ImageInfo, data_len: usize, rect: &Rect) -> Result<(), ImStatus> {
    if rect.is_empty() || !rect.fits_within(info.width, info.height) {
        return Err(ImStatus::InvalidParam);
    }
    if data_len < info.byte_size() {
        return Err(ImStatus::InvalidParam);
    }
    Ok(())
}

#[inline]
fn argb_at(data: &[u8], info: &ImageInfo, x: u32, y: u32) -> u32 {
    let offset = (y as usize * info.hor_stride as usize + x as usize) * 4;
    let mut word = [0u8; 4];
    word.copy_from_slice(&data[offset..offset + 4]);
    u32::from_ne_bytes(word)
}

#[inline]
fn put_argb(data: &mut [u8], info: &ImageInfo, x: u32, y: u32, color: u32) {
    let offset = (y as usize * info.hor_stride as usize + x as usize) * 4;
    data[offset..offset + 4].copy_from_slice(&color.to_ne_bytes());
}

#[inline]
fn luma_index(info: &ImageInfo, x: u32, y: u32) -> usize {
    y as usize * info.hor_stride as usize + x as usize
}

/// Index of the Cb sample covering pixel (x, y); Cr follows it
#[inline]
fn chroma_index(info: &ImageInfo, x: u32, y: u32) -> usize {
    info.uv_offset() + (y / 2) as usize * info.hor_stride as usize + (x / 2) as usize * 2
}

/// Non-premultiplied Porter-Duff "over": `fg` drawn on top of `bg`
fn composite_over(fg: u32, bg: u32) -> u32 {
    let (fa, fr, fg_g, fb) = unpack_argb(fg);
    let (ba, br, bg_g, bb) = unpack_argb(bg);
    let fa = u32::from(fa);
    let ba = u32::from(ba);

    let out_a = fa + ba * (255 - fa) / 255;
    if out_a == 0 {
        return 0;
    }
    let channel = |f: u8, b: u8| -> u8 {
        let num = u32::from(f) * fa * 255 + u32::from(b) * ba * (255 - fa);
        (num / (out_a * 255)).min(255) as u8
    };
    pack_argb(
        out_a as u8,
        channel(fr, br),
        channel(fg_g, bg_g),
        channel(fb, bb),
    )
}

impl SoftRaster {
    fn fill_argb(dst: &mut ImageViewMut<'_>, rect: Rect, color: u32) {
        let stride = dst.info.hor_stride as usize;
        let bytes = color.to_ne_bytes();
        for row in rect.y..rect.y + rect.height {
            let start = (row as usize * stride + rect.x as usize) * 4;
            let end = start + rect.width as usize * 4;
            for px in dst.data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&bytes);
            }
        }
    }

    fn fill_nv12(dst: &mut ImageViewMut<'_>, rect: Rect, color: u32) {
        let info = dst.info;
        let (y, u, v) = argb_to_yuv(color);

        for row in rect.y..rect.y + rect.height {
            let start = luma_index(&info, rect.x, row);
            dst.data[start..start + rect.width as usize].fill(y);
        }

        let last_x = rect.x + rect.width - 1;
        let last_y = rect.y + rect.height - 1;
        for crow in (rect.y / 2)..=(last_y / 2) {
            for ccol in (rect.x / 2)..=(last_x / 2) {
                let idx = chroma_index(&info, ccol * 2, crow * 2);
                dst.data[idx] = u;
                dst.data[idx + 1] = v;
            }
        }
    }

    fn blend_argb(
        canvas: &mut ImageViewMut<'_>,
        pattern: &ImageView<'_>,
        src_rect: Rect,
        dst_rect: Rect,
        pat_rect: Rect,
        mode: BlendMode,
    ) {
        let info = canvas.info;

        // Read the source region first so overlapping src/dst stays correct
        let mut source = Vec::with_capacity((src_rect.width * src_rect.height) as usize);
        for j in 0..src_rect.height {
            for i in 0..src_rect.width {
                source.push(argb_at(canvas.data, &info, src_rect.x + i, src_rect.y + j));
            }
        }

        for j in 0..dst_rect.height {
            for i in 0..dst_rect.width {
                let s = source[(j * src_rect.width + i) as usize];
                let p = argb_at(pattern.data, &pattern.info, pat_rect.x + i, pat_rect.y + j);
                let out = match mode {
                    BlendMode::SrcOver => composite_over(p, s),
                    BlendMode::DstOver => composite_over(s, p),
                };
                put_argb(canvas.data, &info, dst_rect.x + i, dst_rect.y + j, out);
            }
        }
    }

    fn blend_nv12(
        canvas: &mut ImageViewMut<'_>,
        pattern: &ImageView<'_>,
        src_rect: Rect,
        dst_rect: Rect,
        pat_rect: Rect,
    ) {
        let info = canvas.info;

        // Luma
        let mut source = Vec::with_capacity((src_rect.width * src_rect.height) as usize);
        for j in 0..src_rect.height {
            let start = luma_index(&info, src_rect.x, src_rect.y + j);
            source.extend_from_slice(&canvas.data[start..start + src_rect.width as usize]);
        }
        for j in 0..dst_rect.height {
            for i in 0..dst_rect.width {
                let p = argb_at(pattern.data, &pattern.info, pat_rect.x + i, pat_rect.y + j);
                let (alpha, ..) = unpack_argb(p);
                let (py, _, _) = argb_to_yuv(p);
                let s = source[(j * src_rect.width + i) as usize];
                canvas.data[luma_index(&info, dst_rect.x + i, dst_rect.y + j)] = mix(py, s, alpha);
            }
        }

        // Chroma: each sample takes its weight from the first covered pixel
        // inside the destination rectangle
        let last_x = dst_rect.x + dst_rect.width - 1;
        let last_y = dst_rect.y + dst_rect.height - 1;
        let mut updates = Vec::new();
        for crow in (dst_rect.y / 2)..=(last_y / 2) {
            for ccol in (dst_rect.x / 2)..=(last_x / 2) {
                let i = (ccol * 2).max(dst_rect.x) - dst_rect.x;
                let j = (crow * 2).max(dst_rect.y) - dst_rect.y;
                let p = argb_at(pattern.data, &pattern.info, pat_rect.x + i, pat_rect.y + j);
                let (alpha, ..) = unpack_argb(p);
                let (_, pu, pv) = argb_to_yuv(p);

                let src_idx = chroma_index(&info, src_rect.x + i, src_rect.y + j);
                let su = canvas.data[src_idx];
                let sv = canvas.data[src_idx + 1];
                updates.push((
                    chroma_index(&info, dst_rect.x + i, dst_rect.y + j),
                    mix(pu, su, alpha),
                    mix(pv, sv, alpha),
                ));
            }
        }
        for (idx, u, v) in updates {
            canvas.data[idx] = u;
            canvas.data[idx + 1] = v;
        }
    }
}

impl Raster for SoftRaster {
    fn fill(&self, dst: &mut ImageViewMut<'_>, rect: Rect, color: u32) -> ImStatus {
        if let Err(status) = check_image(&dst.info, dst.data.len(), &rect) {
            trace!(?rect, status = %status, "Fill rejected");
            return status;
        }

        match dst.info.image_type {
            ImageType::ARGB8888 => Self::fill_argb(dst, rect, color),
            ImageType::NV12 => Self::fill_nv12(dst, rect, color),
            ImageType::JPEG => return ImStatus::NotSupported,
        }
        ImStatus::Success
    }

    fn blend(
        &self,
        canvas: &mut ImageViewMut<'_>,
        pattern: &ImageView<'_>,
        src_rect: Rect,
        dst_rect: Rect,
        pat_rect: Rect,
        mode: BlendMode,
    ) -> ImStatus {
        if pattern.info.image_type != ImageType::ARGB8888 {
            return ImStatus::NotSupported;
        }
        if !src_rect.same_size(&dst_rect) || !src_rect.same_size(&pat_rect) {
            // Scaling is not supported
            return ImStatus::InvalidParam;
        }
        let checks = check_image(&canvas.info, canvas.data.len(), &src_rect)
            .and_then(|_| check_image(&canvas.info, canvas.data.len(), &dst_rect))
            .and_then(|_| check_image(&pattern.info, pattern.data.len(), &pat_rect));
        if let Err(status) = checks {
            trace!(?src_rect, ?dst_rect, ?pat_rect, status = %status, "Blend rejected");
            return status;
        }

        match canvas.info.image_type {
            ImageType::ARGB8888 => {
                Self::blend_argb(canvas, pattern, src_rect, dst_rect, pat_rect, mode)
            }
            ImageType::NV12 => Self::blend_nv12(canvas, pattern, src_rect, dst_rect, pat_rect),
            ImageType::JPEG => return ImStatus::NotSupported,
        }
        ImStatus::Success
    }
}
