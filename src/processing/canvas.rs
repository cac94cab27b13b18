use image::{ImageBuffer, Rgba, RgbaImage};

use crate::state::Color;

/// A fresh canvas, filled with `background` or fully transparent.
pub fn blank(width: u32, height: u32, background: Option<Color>) -> RgbaImage {
    let fill = background.map(Color::to_rgba).unwrap_or(Rgba([0, 0, 0, 0]));
    ImageBuffer::from_pixel(width, height, fill)
}

/// Source-over blend of `src` (straight alpha) scaled by `coverage`.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if dst[3] == 0 {
        // Nothing underneath: keep the source colour as-is.
        *dst = Rgba([src[0], src[1], src[2], to_byte(sa * 255.0)]);
        return;
    }
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = to_byte(v);
    }
    dst[3] = to_byte(out_a * 255.0);
}

/// Draws `src` over `dst` at the origin; both must share dimensions.
pub fn composite_over(dst: &mut RgbaImage, src: &RgbaImage) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        blend_pixel(d, *s, 1.0);
    }
}

/// Fills every pixel whose centre lies inside the rectangle.
pub fn fill_rect(dst: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    let (cw, ch) = dst.dimensions();
    let first = |start: f32| (start - 0.5).ceil().max(0.0) as u32;
    let end = |stop: f32, limit: u32| ((stop - 0.5).ceil().max(0.0) as u32).min(limit);
    let src = color.to_rgba();
    for py in first(y)..end(y + height, ch) {
        for px in first(x)..end(x + width, cw) {
            blend_pixel(dst.get_pixel_mut(px, py), src, 1.0);
        }
    }
}

pub(crate) fn to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
