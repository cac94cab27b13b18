use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

use crate::state::Adjustments;

type Rgba32Image = ImageBuffer<Rgba<f32>, Vec<f32>>;
type Matrix3 = [[f32; 3]; 3];

/// One CSS filter function. Amounts are fractions (`1.0` = 100%), hue is in
/// degrees and blur is a Gaussian standard deviation in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    HueRotate(f32),
    Grayscale(f32),
    Sepia(f32),
    Opacity(f32),
    Blur(f32),
}

impl FilterOp {
    pub fn css(&self) -> String {
        let pct = |v: f32| (v * 100.0).round();
        match *self {
            FilterOp::Brightness(a) => format!("brightness({}%)", pct(a)),
            FilterOp::Contrast(a) => format!("contrast({}%)", pct(a)),
            FilterOp::Saturate(a) => format!("saturate({}%)", pct(a)),
            FilterOp::HueRotate(deg) => format!("hue-rotate({}deg)", deg),
            FilterOp::Grayscale(a) => format!("grayscale({}%)", pct(a)),
            FilterOp::Sepia(a) => format!("sepia({}%)", pct(a)),
            FilterOp::Opacity(a) => format!("opacity({}%)", pct(a)),
            FilterOp::Blur(px) => format!("blur({}px)", px),
        }
    }
}

/// Named composite looks layered underneath the user's sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    #[default]
    Normal,
    Grayscale,
    Sepia,
    Vintage,
    Cool,
    Warm,
    Dramatic,
    Vivid,
    Matte,
    Retro,
    Cold,
    Noir,
    VintageFilm,
    Faded,
    Pastel,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 15] = [
        FilterPreset::Normal,
        FilterPreset::Grayscale,
        FilterPreset::Sepia,
        FilterPreset::Vintage,
        FilterPreset::Cool,
        FilterPreset::Warm,
        FilterPreset::Dramatic,
        FilterPreset::Vivid,
        FilterPreset::Matte,
        FilterPreset::Retro,
        FilterPreset::Cold,
        FilterPreset::Noir,
        FilterPreset::VintageFilm,
        FilterPreset::Faded,
        FilterPreset::Pastel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterPreset::Normal => "Normal",
            FilterPreset::Grayscale => "Grayscale",
            FilterPreset::Sepia => "Sepia",
            FilterPreset::Vintage => "Vintage",
            FilterPreset::Cool => "Cool",
            FilterPreset::Warm => "Warm",
            FilterPreset::Dramatic => "Dramatic",
            FilterPreset::Vivid => "Vivid",
            FilterPreset::Matte => "Matte",
            FilterPreset::Retro => "Retro",
            FilterPreset::Cold => "Cold",
            FilterPreset::Noir => "Noir",
            FilterPreset::VintageFilm => "Vintage Film",
            FilterPreset::Faded => "Faded",
            FilterPreset::Pastel => "Pastel",
        }
    }

    pub fn ops(self) -> &'static [FilterOp] {
        use FilterOp::*;
        match self {
            FilterPreset::Normal => &[],
            FilterPreset::Grayscale => &[Grayscale(1.0)],
            FilterPreset::Sepia => &[Sepia(1.0)],
            FilterPreset::Vintage => &[Sepia(0.8), Contrast(1.1), Brightness(1.1), Saturate(1.3)],
            FilterPreset::Cool => &[Saturate(1.4), HueRotate(20.0)],
            FilterPreset::Warm => &[Sepia(0.3), Saturate(1.4)],
            FilterPreset::Dramatic => &[Contrast(1.4), Brightness(0.9)],
            FilterPreset::Vivid => &[Saturate(1.8), Contrast(1.2)],
            FilterPreset::Matte => &[Brightness(0.9), Saturate(0.8), Contrast(0.9)],
            FilterPreset::Retro => &[Sepia(0.5), HueRotate(-30.0), Saturate(1.4)],
            FilterPreset::Cold => &[Brightness(1.0), Saturate(0.8), HueRotate(180.0)],
            FilterPreset::Noir => &[Grayscale(1.0), Contrast(1.2)],
            FilterPreset::VintageFilm => &[Sepia(0.3), Contrast(1.1), Brightness(1.1), HueRotate(-10.0)],
            FilterPreset::Faded => &[Opacity(0.8), Saturate(0.8), Brightness(1.1)],
            FilterPreset::Pastel => &[Saturate(0.5), Brightness(1.2)],
        }
    }

    /// The preset formula in CSS filter syntax, `none` for [`FilterPreset::Normal`].
    pub fn css(self) -> String {
        let ops = self.ops();
        if ops.is_empty() {
            return "none".to_string();
        }
        ops.iter().map(FilterOp::css).collect::<Vec<_>>().join(" ")
    }
}

/// Full filter expression for the adjustment pass: the preset formula, then
/// the sliders, then exposure as a second, independent brightness term.
pub fn adjustment_chain(adjust: &Adjustments) -> Vec<FilterOp> {
    let mut chain = adjust.filter.ops().to_vec();
    chain.extend([
        FilterOp::Brightness(adjust.brightness / 100.0),
        FilterOp::Contrast(adjust.contrast / 100.0),
        FilterOp::Saturate(adjust.saturation / 100.0),
        FilterOp::HueRotate(adjust.hue),
        FilterOp::Blur(adjust.blur),
        FilterOp::Brightness(adjust.exposure / 100.0),
    ]);
    chain
}

/// Runs `ops` left to right over `img`, clamping between primitives.
pub fn apply_chain(img: &RgbaImage, ops: &[FilterOp]) -> RgbaImage {
    let mut work: Rgba32Image = ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y).0;
        Rgba(p.map(|c| c as f32 / 255.0))
    });

    for op in ops {
        match *op {
            FilterOp::Blur(sigma) => {
                if sigma > 0.0 {
                    work = blur(&work, sigma);
                }
            }
            _ => {
                for px in work.pixels_mut() {
                    apply_to_pixel(op, &mut px.0);
                }
            }
        }
    }

    ImageBuffer::from_fn(work.width(), work.height(), |x, y| {
        Rgba(work.get_pixel(x, y).0.map(quantize))
    })
}

fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn apply_to_pixel(op: &FilterOp, px: &mut [f32; 4]) {
    match *op {
        FilterOp::Brightness(a) => {
            for c in &mut px[..3] {
                *c = (*c * a).clamp(0.0, 1.0);
            }
        }
        FilterOp::Contrast(a) => {
            for c in &mut px[..3] {
                *c = ((*c - 0.5) * a + 0.5).clamp(0.0, 1.0);
            }
        }
        FilterOp::Saturate(s) => multiply(px, &saturate_matrix(s)),
        FilterOp::HueRotate(deg) => multiply(px, &hue_rotate_matrix(deg)),
        FilterOp::Grayscale(a) => multiply(px, &grayscale_matrix(a)),
        FilterOp::Sepia(a) => multiply(px, &sepia_matrix(a)),
        FilterOp::Opacity(a) => px[3] = (px[3] * a.clamp(0.0, 1.0)).clamp(0.0, 1.0),
        FilterOp::Blur(_) => {}
    }
}

fn multiply(px: &mut [f32; 4], m: &Matrix3) {
    let [r, g, b, _] = *px;
    for (row, out) in m.iter().zip(px.iter_mut()) {
        *out = (row[0] * r + row[1] * g + row[2] * b).clamp(0.0, 1.0);
    }
}

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(deg: f32) -> Matrix3 {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix3 {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
        [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix3 {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * g, 0.769 - 0.769 * g, 0.189 - 0.189 * g],
        [0.349 - 0.349 * g, 0.686 + 0.314 * g, 0.168 - 0.168 * g],
        [0.272 - 0.272 * g, 0.534 - 0.534 * g, 0.131 + 0.869 * g],
    ]
}

/// Gaussian blur on premultiplied colour so transparent pixels do not bleed black.
fn blur(work: &Rgba32Image, sigma: f32) -> Rgba32Image {
    let premultiplied: RgbaImage = ImageBuffer::from_fn(work.width(), work.height(), |x, y| {
        let [r, g, b, a] = work.get_pixel(x, y).0;
        Rgba([quantize(r * a), quantize(g * a), quantize(b * a), quantize(a)])
    });
    let blurred = gaussian_blur_f32(&premultiplied, sigma);
    ImageBuffer::from_fn(work.width(), work.height(), |x, y| {
        let [r, g, b, a] = blurred.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        if a <= 0.0 {
            Rgba([0.0, 0.0, 0.0, 0.0])
        } else {
            Rgba([
                (r / a).clamp(0.0, 1.0),
                (g / a).clamp(0.0, 1.0),
                (b / a).clamp(0.0, 1.0),
                a,
            ])
        }
    })
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, Rgba, RgbaImage};

    use crate::state::EditState;

    use super::{FilterOp, FilterPreset, adjustment_chain, apply_chain};

    fn one_pixel(rgba: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(1, 1, Rgba(rgba))
    }

    #[test]
    fn neutral_chain_preserves_pixels() {
        let img = one_pixel([12, 130, 250, 255]);
        let chain = adjustment_chain(EditState::default().adjust());
        assert_eq!(apply_chain(&img, &chain), img);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let out = apply_chain(&one_pixel([200, 40, 90, 255]), FilterPreset::Grayscale.ops());
        let p = out.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn brightness_above_full_brightens() {
        let out = apply_chain(&one_pixel([100, 100, 100, 255]), &[FilterOp::Brightness(1.5)]);
        assert_eq!(out.get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn contrast_pushes_away_from_mid_gray() {
        let out = apply_chain(&one_pixel([64, 191, 128, 255]), &[FilterOp::Contrast(1.5)]);
        let p = out.get_pixel(0, 0);
        assert!(p[0] < 64);
        assert!(p[1] > 191);
    }

    #[test]
    fn exposure_is_a_separate_brightness_term() {
        let adjust = EditState::default().with_brightness(120.0).with_exposure(80.0);
        let chain = adjustment_chain(adjust.adjust());
        assert_eq!(chain.first(), Some(&FilterOp::Brightness(1.2)));
        assert_eq!(chain.last(), Some(&FilterOp::Brightness(0.8)));
    }

    #[test]
    fn preset_ops_run_before_sliders() {
        let adjust = EditState::default().with_filter(FilterPreset::Noir);
        let chain = adjustment_chain(adjust.adjust());
        assert_eq!(&chain[..2], FilterPreset::Noir.ops());
    }

    #[test]
    fn faded_lowers_alpha() {
        let out = apply_chain(&one_pixel([90, 90, 90, 255]), FilterPreset::Faded.ops());
        assert_eq!(out.get_pixel(0, 0)[3], 204);
    }

    #[test]
    fn hue_rotation_by_full_turn_is_identity() {
        let img = one_pixel([200, 60, 30, 255]);
        let out = apply_chain(&img, &[FilterOp::HueRotate(360.0)]);
        let (a, b) = (img.get_pixel(0, 0), out.get_pixel(0, 0));
        for c in 0..3 {
            assert!((a[c] as i32 - b[c] as i32).abs() <= 1);
        }
    }

    #[test]
    fn blur_spreads_a_bright_point() {
        let mut img: RgbaImage = ImageBuffer::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        img.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let out = apply_chain(&img, &[FilterOp::Blur(2.0)]);
        assert!(out.get_pixel(4, 4)[0] < 255);
        assert!(out.get_pixel(5, 4)[0] > 0);
    }

    #[test]
    fn css_formula_matches_catalog() {
        assert_eq!(FilterPreset::Normal.css(), "none");
        assert_eq!(
            FilterPreset::Vintage.css(),
            "sepia(80%) contrast(110%) brightness(110%) saturate(130%)"
        );
        assert_eq!(
            FilterPreset::Retro.css(),
            "sepia(50%) hue-rotate(-30deg) saturate(140%)"
        );
    }
}
