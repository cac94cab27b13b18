use std::time::Instant;

use image::RgbaImage;

use crate::state::EditState;

use super::canvas::{blank, composite_over};
use super::filters::{adjustment_chain, apply_chain};
use super::geometry::{canvas_size, draw_source};
use super::text::{FontSource, draw_overlay};
use super::sharpness;

/// Render `source` through every stage of `state`.
/// Order: canvas + background → geometry/crop/clip → filter chain →
/// sharpening → text overlay.
///
/// The output depends only on its inputs, so re-rendering a state restored
/// from history reproduces the same pixels.
pub fn render(source: &RgbaImage, state: &EditState, fonts: &dyn FontSource) -> RgbaImage {
    let started = Instant::now();
    let (width, height) = canvas_size(state.crop().preset, source.width(), source.height());
    let mut canvas = blank(width, height, state.background());
    if width == 0 || height == 0 {
        return canvas;
    }

    draw_source(&mut canvas, source, state.geometry(), state.crop());

    // The filter chain covers the whole canvas, background included.
    if !state.adjust().is_neutral() {
        let filtered = apply_chain(&canvas, &adjustment_chain(state.adjust()));
        canvas = blank(width, height, state.background());
        composite_over(&mut canvas, &filtered);
    }

    if let Err(err) = sharpness::apply(&mut canvas, state.adjust().sharpness) {
        tracing::warn!(%err, "sharpening skipped");
    }

    draw_overlay(&mut canvas, state.text(), fonts);

    tracing::debug!(
        width,
        height,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "rendered canvas"
    );
    canvas
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use crate::processing::text::tests::NoFonts;
    use crate::state::{Color, CropPreset, EditState};

    use super::render;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_fn(w, h, |x, y| Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90, 255]))
    }

    #[test]
    fn default_state_reproduces_source() {
        let source = gradient(16, 9);
        let out = render(&source, &EditState::default(), &NoFonts::new());
        assert_eq!(out, source);
    }

    #[test]
    fn facebook_preset_scales_to_fixed_size() {
        let source: RgbaImage = ImageBuffer::from_pixel(200, 200, Rgba([255, 0, 0, 255]));
        let state = EditState::default().with_crop_preset(CropPreset::Facebook);
        let out = render(&source, &state, &NoFonts::new());
        assert_eq!(out.dimensions(), (170, 170));
        assert!(out.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn half_turn_reverses_pixels() {
        let source = gradient(6, 4);
        let out = render(&source, &EditState::default().with_rotation(180), &NoFonts::new());
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(out.get_pixel(x, y), source.get_pixel(5 - x, 3 - y));
            }
        }
    }

    #[test]
    fn empty_text_leaves_render_unchanged() {
        let source = gradient(12, 12);
        let plain = render(&source, &EditState::default(), &NoFonts::new());
        let state = EditState::default()
            .with_text("")
            .with_text_shadow(true)
            .with_text_background(Some(Color::BLACK));
        assert_eq!(render(&source, &state, &NoFonts::new()), plain);
    }

    #[test]
    fn background_shows_around_zoomed_out_image() {
        let source: RgbaImage = ImageBuffer::from_pixel(20, 20, Rgba([0, 0, 255, 255]));
        let state = EditState::default()
            .with_zoom(0.5)
            .with_background(Some(Color::rgb(255, 255, 0)));
        let out = render(&source, &state, &NoFonts::new());
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 0, 255]));
        assert_eq!(*out.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn circle_crop_keeps_background_in_corners() {
        let source: RgbaImage = ImageBuffer::from_pixel(20, 20, Rgba([0, 0, 255, 255]));
        let state = EditState::default()
            .with_circle_crop(true)
            .with_background(Some(Color::WHITE));
        let out = render(&source, &state, &NoFonts::new());
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn filters_affect_the_image() {
        let source: RgbaImage = ImageBuffer::from_pixel(8, 8, Rgba([200, 40, 40, 255]));
        let out = render(&source, &EditState::default().with_saturation(0.0), &NoFonts::new());
        let p = out.get_pixel(4, 4);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let source = gradient(24, 18);
        let state = EditState::default()
            .with_rotation(90)
            .with_zoom(1.3)
            .with_sharpness(6.0)
            .with_hue(45.0)
            .with_circle_crop(true);
        let fonts = NoFonts::new();
        assert_eq!(render(&source, &state, &fonts), render(&source, &state, &fonts));
    }
}
