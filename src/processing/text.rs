use std::collections::HashMap;
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont, point};
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Style, Weight};
use font_kit::source::SystemSource;
use image::{GrayImage, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::state::{Color, FontFamily, GenericFamily, TextOverlay, TextPosition};

use super::canvas::{blend_pixel, fill_rect};

const ANCHOR_MARGIN: f32 = 10.0;
const BOX_PADDING: f32 = 20.0;
const BOX_HEIGHT_FACTOR: f32 = 1.5;
const BOX_NUDGE: f32 = 5.0;
const SHADOW_COLOR: Color = Color([0, 0, 0, 179]);
const SHADOW_SIGMA: f32 = 1.5;
const SHADOW_OFFSET: (i32, i32) = (2, 2);

/// Resolves a styled face for the overlay.
pub trait FontSource {
    fn resolve(&self, family: FontFamily, bold: bool, italic: bool) -> Option<FontArc>;
}

/// Installed fonts via font-kit, falling back to the family's generic face.
#[derive(Default)]
pub struct SystemFonts {
    cache: Mutex<HashMap<(FontFamily, bool, bool), Option<FontArc>>>,
}

impl SystemFonts {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FontSource for SystemFonts {
    fn resolve(&self, family: FontFamily, bold: bool, italic: bool) -> Option<FontArc> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache
            .entry((family, bold, italic))
            .or_insert_with(|| load_system_font(family, bold, italic))
            .clone()
    }
}

fn load_system_font(family: FontFamily, bold: bool, italic: bool) -> Option<FontArc> {
    let mut props = Properties::new();
    if bold {
        props.weight = Weight::BOLD;
    }
    if italic {
        props.style = Style::Italic;
    }
    let generic = match family.generic() {
        GenericFamily::SansSerif => FamilyName::SansSerif,
        GenericFamily::Serif => FamilyName::Serif,
        GenericFamily::Monospace => FamilyName::Monospace,
    };

    let handle = SystemSource::new()
        .select_best_match(&[FamilyName::Title(family.name().to_string()), generic], &props)
        .map_err(|err| tracing::warn!(family = family.name(), error = ?err, "no system font matched"))
        .ok()?;
    let index = face_index(&handle);
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    let loaded = FontVec::try_from_vec_and_index((*data).clone(), index)
        .map(FontArc::new)
        .ok();
    if loaded.is_some() {
        tracing::debug!(family = family.name(), bold, italic, "loaded overlay font");
    }
    loaded
}

/// Face within the font file; non-zero for `.ttc` collections.
fn face_index(handle: &Handle) -> u32 {
    match handle {
        Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
    }
}

/// Vertical anchor and the baseline mode it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub y: f32,
    /// `true` when `y` is the vertical middle of the text, `false` when it is the top.
    pub middle: bool,
}

pub fn anchor(position: TextPosition, size: f32, canvas_h: u32) -> Anchor {
    match position {
        TextPosition::Top => Anchor {
            y: size + ANCHOR_MARGIN,
            middle: false,
        },
        TextPosition::Bottom => Anchor {
            y: canvas_h as f32 - size - ANCHOR_MARGIN,
            middle: false,
        },
        TextPosition::Center => Anchor {
            y: canvas_h as f32 / 2.0,
            middle: true,
        },
    }
}

/// Background box `(x, y, width, height)` behind text of `text_width` pixels.
pub fn background_box(
    position: TextPosition,
    anchor: Anchor,
    text_width: f32,
    size: f32,
    canvas_w: u32,
) -> (f32, f32, f32, f32) {
    let width = text_width + BOX_PADDING;
    let height = size * BOX_HEIGHT_FACTOR;
    let y = match position {
        TextPosition::Center => anchor.y - height / 2.0,
        TextPosition::Top => anchor.y - BOX_NUDGE,
        TextPosition::Bottom => anchor.y - height + BOX_NUDGE,
    };
    (canvas_w as f32 / 2.0 - width / 2.0, y, width, height)
}

/// Scale at which the font's em square is `size` pixels tall.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

/// Glyphs positioned from x = 0 on a zero baseline, plus the total advance.
fn layout(font: &FontArc, scale: PxScale, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            cursor += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        previous = Some(id);
    }
    (glyphs, cursor)
}

/// Glyph coverage rasterised into a canvas-sized mask.
fn coverage_mask(
    font: &FontArc,
    scale: PxScale,
    glyphs: &[(GlyphId, f32)],
    origin_x: f32,
    baseline: f32,
    size: (u32, u32),
) -> GrayImage {
    let (w, h) = size;
    let mut mask = GrayImage::new(w, h);
    for &(id, x) in glyphs {
        let glyph = id.with_scale_and_position(scale, point(origin_x + x, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                return;
            }
            let cell = mask.get_pixel_mut(px as u32, py as u32);
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            cell.0[0] = cell.0[0].max(value);
        });
    }
    mask
}

fn paint_mask(canvas: &mut RgbaImage, mask: &GrayImage, color: Color, offset: (i32, i32)) {
    let (w, h) = canvas.dimensions();
    let src = color.to_rgba();
    for (x, y, Luma([coverage])) in mask.enumerate_pixels() {
        if *coverage == 0 {
            continue;
        }
        let tx = x as i64 + offset.0 as i64;
        let ty = y as i64 + offset.1 as i64;
        if tx < 0 || ty < 0 || tx >= w as i64 || ty >= h as i64 {
            continue;
        }
        blend_pixel(
            canvas.get_pixel_mut(tx as u32, ty as u32),
            src,
            *coverage as f32 / 255.0,
        );
    }
}

/// Draws the text overlay, with its optional background box and shadow, on
/// top of an already filtered canvas. Empty text draws nothing at all.
///
/// The box is sized from the measured text, so when no font resolves the
/// whole overlay is skipped, box included, and a warning is logged.
pub fn draw_overlay(canvas: &mut RgbaImage, overlay: &TextOverlay, fonts: &dyn FontSource) {
    if overlay.content.is_empty() {
        return;
    }
    let Some(font) = fonts.resolve(overlay.font, overlay.bold, overlay.italic) else {
        tracing::warn!(font = overlay.font.name(), "no font available, text overlay skipped");
        return;
    };

    let (w, h) = canvas.dimensions();
    let scale = em_scale(&font, overlay.size);
    let scaled = font.as_scaled(scale);
    let (glyphs, text_width) = layout(&font, scale, &overlay.content);
    let anchor_at = anchor(overlay.position, overlay.size, h);
    let baseline = if anchor_at.middle {
        anchor_at.y + (scaled.ascent() + scaled.descent()) / 2.0
    } else {
        anchor_at.y + scaled.ascent()
    };
    let origin_x = w as f32 / 2.0 - text_width / 2.0;

    if let Some(background) = overlay.background {
        let (bx, by, bw, bh) =
            background_box(overlay.position, anchor_at, text_width, overlay.size, w);
        fill_rect(canvas, bx, by, bw, bh, background);
    }

    let mask = coverage_mask(&font, scale, &glyphs, origin_x, baseline, (w, h));
    if overlay.shadow {
        let shadow = gaussian_blur_f32(&mask, SHADOW_SIGMA);
        paint_mask(canvas, &shadow, SHADOW_COLOR, SHADOW_OFFSET);
    }
    paint_mask(canvas, &mask, overlay.color, (0, 0));
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::sync::Arc;

    use ab_glyph::FontArc;
    use font_kit::handle::Handle;
    use image::{ImageBuffer, Rgba, RgbaImage};

    use crate::processing::canvas::blank;
    use crate::state::{Color, EditState, FontFamily, TextPosition};

    use super::{
        Anchor, FontSource, SystemFonts, anchor, background_box, draw_overlay, face_index,
    };

    /// Font source for environments without installed fonts.
    pub(crate) struct NoFonts {
        pub(crate) calls: Cell<usize>,
    }

    impl NoFonts {
        pub(crate) fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl FontSource for NoFonts {
        fn resolve(&self, _family: FontFamily, _bold: bool, _italic: bool) -> Option<FontArc> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    fn canvas() -> RgbaImage {
        ImageBuffer::from_pixel(40, 30, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn empty_text_never_draws_or_looks_up_a_font() {
        let state = EditState::default()
            .with_text("")
            .with_text_background(Some(Color::rgb(255, 0, 0)))
            .with_text_shadow(true)
            .with_bold(true)
            .with_text_position(TextPosition::Top);
        let fonts = NoFonts::new();
        let mut img = canvas();
        draw_overlay(&mut img, state.text(), &fonts);
        assert_eq!(img, canvas());
        assert_eq!(fonts.calls.get(), 0);
    }

    #[test]
    fn missing_font_skips_overlay() {
        let state = EditState::default()
            .with_text("Hello")
            .with_text_background(Some(Color::rgb(255, 0, 0)));
        let fonts = NoFonts::new();
        let mut img = canvas();
        draw_overlay(&mut img, state.text(), &fonts);
        assert_eq!(img, canvas());
        assert_eq!(fonts.calls.get(), 1);
    }

    #[test]
    fn anchors_follow_position() {
        assert_eq!(
            anchor(TextPosition::Top, 24.0, 300),
            Anchor {
                y: 34.0,
                middle: false
            }
        );
        assert_eq!(
            anchor(TextPosition::Bottom, 24.0, 300),
            Anchor {
                y: 266.0,
                middle: false
            }
        );
        assert_eq!(
            anchor(TextPosition::Center, 24.0, 300),
            Anchor {
                y: 150.0,
                middle: true
            }
        );
    }

    #[test]
    fn background_box_is_padded_and_centered() {
        let center = anchor(TextPosition::Center, 20.0, 200);
        assert_eq!(
            background_box(TextPosition::Center, center, 80.0, 20.0, 200),
            (50.0, 85.0, 100.0, 30.0)
        );
        let top = anchor(TextPosition::Top, 20.0, 200);
        assert_eq!(
            background_box(TextPosition::Top, top, 80.0, 20.0, 200),
            (50.0, 25.0, 100.0, 30.0)
        );
        let bottom = anchor(TextPosition::Bottom, 20.0, 200);
        assert_eq!(
            background_box(TextPosition::Bottom, bottom, 80.0, 20.0, 200),
            (50.0, 145.0, 100.0, 30.0)
        );
    }

    #[test]
    fn collection_face_index_is_kept() {
        assert_eq!(face_index(&Handle::from_path(PathBuf::from("/fonts/a.ttc"), 3)), 3);
        assert_eq!(face_index(&Handle::from_memory(Arc::new(Vec::new()), 2)), 2);
    }

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// "Hello" at 30px, white on red, anchored top on a 200x100 canvas.
    /// `None` when the machine has no usable sans-serif face.
    fn draw_hello(shadow: bool) -> Option<RgbaImage> {
        let fonts = SystemFonts::new();
        fonts.resolve(FontFamily::Arial, false, false)?;
        let state = EditState::default()
            .with_text("Hello")
            .with_text_size(30.0)
            .with_text_color(Color::WHITE)
            .with_text_position(TextPosition::Top)
            .with_text_background(Some(Color::rgb(255, 0, 0)))
            .with_text_shadow(shadow);
        let mut img = blank(200, 100, None);
        draw_overlay(&mut img, state.text(), &fonts);
        Some(img)
    }

    fn rows_with(img: &RgbaImage, color: Rgba<u8>) -> BTreeSet<u32> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| **p == color)
            .map(|(_, y, _)| y)
            .collect()
    }

    #[test]
    fn top_background_box_spans_expected_rows() {
        let Some(img) = draw_hello(false) else {
            return;
        };
        // anchor 30 + 10 = 40, box from 40 - 5 = 35, height 1.5 * 30 = 45.
        let expected: BTreeSet<u32> = (35..80).collect();
        assert_eq!(rows_with(&img, RED), expected);
    }

    #[test]
    fn glyphs_are_painted_in_text_color_inside_the_box() {
        let Some(img) = draw_hello(false) else {
            return;
        };
        let rows = rows_with(&img, WHITE);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|y| (35..80).contains(y)));
    }

    #[test]
    fn shadow_darkens_around_glyphs_without_covering_them() {
        let (Some(plain), Some(shadowed)) = (draw_hello(false), draw_hello(true)) else {
            return;
        };
        assert_ne!(plain, shadowed);
        let count = |img: &RgbaImage| img.pixels().filter(|p| **p == WHITE).count();
        assert_eq!(count(&plain), count(&shadowed));
        // Shadow only shows where the box or the glyphs are.
        for (a, b) in plain.pixels().zip(shadowed.pixels()) {
            if a[3] == 0 {
                assert_eq!(b[3], 0);
            }
        }
    }
}
