use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::Projection;

use crate::state::{CropPreset, CropSettings, Geometry};

use super::canvas::{blend_pixel, to_byte};

/// Region of the source image, in source pixels, that fills the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Output dimensions: the preset's fixed size, or the source size for "original".
pub fn canvas_size(preset: CropPreset, src_w: u32, src_h: u32) -> (u32, u32) {
    preset.target_size().unwrap_or((src_w, src_h))
}

/// Centered crop of the source matching the preset's aspect ratio.
///
/// A source wider than the target keeps its full height and loses its sides;
/// otherwise it keeps its full width and loses top and bottom equally.
pub fn source_rect(preset: CropPreset, src_w: u32, src_h: u32) -> SourceRect {
    let (sw, sh) = (src_w as f32, src_h as f32);
    let (width, height) = match preset.target_size() {
        Some((tw, th)) => {
            let target_aspect = tw as f32 / th as f32;
            if sw / sh > target_aspect {
                (sh * target_aspect, sh)
            } else {
                (sw, sw / target_aspect)
            }
        }
        None => (sw, sh),
    };
    SourceRect {
        x: (sw - width) / 2.0,
        y: (sh - height) / 2.0,
        width,
        height,
    }
}

/// Maps the canvas-centred drawing space into canvas pixels: translate to the
/// centre, rotate, flip, then zoom. The signed rotation is used as-is.
pub fn forward_transform(geometry: &Geometry, canvas_w: u32, canvas_h: u32) -> Projection {
    let flip_x = if geometry.flip_h { -1.0 } else { 1.0 };
    let flip_y = if geometry.flip_v { -1.0 } else { 1.0 };
    let radians = geometry.rotation as f32 * std::f32::consts::PI / 180.0;
    Projection::translate(canvas_w as f32 / 2.0, canvas_h as f32 / 2.0)
        * Projection::rotate(radians)
        * Projection::scale(flip_x, flip_y)
        * Projection::scale(geometry.zoom, geometry.zoom)
}

/// Blits the cropped source onto `canvas` through the geometric transform.
///
/// Each canvas pixel centre is pulled back into drawing space; it receives a
/// sample when it lands inside the canvas-sized destination rectangle and,
/// with circle crop on, inside the clip disc of radius `min(w, h) / 2`. The
/// disc lives in drawing space, so it scales with zoom.
pub fn draw_source(
    canvas: &mut RgbaImage,
    source: &RgbaImage,
    geometry: &Geometry,
    crop: &CropSettings,
) {
    let (cw, ch) = canvas.dimensions();
    if cw == 0 || ch == 0 || source.width() == 0 || source.height() == 0 {
        return;
    }

    let rect = source_rect(crop.preset, source.width(), source.height());
    let inverse = forward_transform(geometry, cw, ch).invert();
    let half_w = cw as f32 / 2.0;
    let half_h = ch as f32 / 2.0;
    let radius = cw.min(ch) as f32 / 2.0;
    let scale_x = rect.width / cw as f32;
    let scale_y = rect.height / ch as f32;

    for y in 0..ch {
        for x in 0..cw {
            let (lx, ly) = inverse * (x as f32 + 0.5, y as f32 + 0.5);
            if lx < -half_w || lx >= half_w || ly < -half_h || ly >= half_h {
                continue;
            }
            if crop.circle && lx * lx + ly * ly > radius * radius {
                continue;
            }
            let u = rect.x + (lx + half_w) * scale_x;
            let v = rect.y + (ly + half_h) * scale_y;
            let sample = sample_bilinear(source, u, v);
            blend_pixel(canvas.get_pixel_mut(x, y), sample, 1.0);
        }
    }
}

/// Bilinear sample at continuous coordinates (pixel centres sit at `i + 0.5`),
/// interpolating premultiplied colour and clamping at the image edge.
fn sample_bilinear(src: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    let (w, h) = src.dimensions();
    let fx = (u - 0.5).clamp(0.0, (w - 1) as f32);
    let fy = (v - 0.5).clamp(0.0, (h - 1) as f32);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let taps = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x1, y0, tx * (1.0 - ty)),
        (x0, y1, (1.0 - tx) * ty),
        (x1, y1, tx * ty),
    ];
    let mut acc = [0.0f32; 4];
    for (x, y, weight) in taps {
        let p = src.get_pixel(x, y);
        let alpha = p[3] as f32 / 255.0 * weight;
        for c in 0..3 {
            acc[c] += p[c] as f32 * alpha;
        }
        acc[3] += alpha;
    }

    if acc[3] <= f32::EPSILON {
        let nx = if tx < 0.5 { x0 } else { x1 };
        let ny = if ty < 0.5 { y0 } else { y1 };
        return *src.get_pixel(nx, ny);
    }
    Rgba([
        to_byte(acc[0] / acc[3]),
        to_byte(acc[1] / acc[3]),
        to_byte(acc[2] / acc[3]),
        to_byte(acc[3] * 255.0),
    ])
}
