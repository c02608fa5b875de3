// SPDX-License-Identifier: MPL-2.0

//! BT.601 limited-range color conversion helpers
//!
//! Integer approximations matching what camera ISPs emit for NV12. Luma
//! spans 16..=235 and chroma 16..=240 centred on 128.

/// Split an ARGB8888 word into (a, r, g, b)
#[inline]
pub fn unpack_argb(color: u32) -> (u8, u8, u8, u8) {
    (
        (color >> 24) as u8,
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
    )
}

/// Build an ARGB8888 word from components
#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Convert an RGB triple to limited-range (Y, U, V)
#[inline]
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (
        y.clamp(0, 255) as u8,
        u.clamp(0, 255) as u8,
        v.clamp(0, 255) as u8,
    )
}

/// Convert an ARGB8888 color to (Y, U, V), ignoring alpha
#[inline]
pub fn argb_to_yuv(color: u32) -> (u8, u8, u8) {
    let (_, r, g, b) = unpack_argb(color);
    rgb_to_yuv(r, g, b)
}

/// Convert limited-range (Y, U, V) to RGB
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let c = 298 * (i32::from(y) - 16);
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;

    let r = (c + 409 * e + 128) >> 8;
    let g = (c - 100 * d - 208 * e + 128) >> 8;
    let b = (c + 516 * d + 128) >> 8;
    (
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    )
}

/// Weighted mix of two 8-bit samples; `alpha` is the weight of `fg`
#[inline]
pub fn mix(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
}
