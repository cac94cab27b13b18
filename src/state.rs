use std::ops::RangeInclusive;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::processing::filters::FilterPreset;

pub const ZOOM_RANGE: RangeInclusive<f32> = 0.5..=3.0;
pub const ZOOM_STEP: f32 = 0.1;
pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = 50.0..=150.0;
pub const CONTRAST_RANGE: RangeInclusive<f32> = 50.0..=150.0;
pub const SATURATION_RANGE: RangeInclusive<f32> = 0.0..=200.0;
pub const HUE_RANGE: RangeInclusive<f32> = 0.0..=360.0;
pub const BLUR_RANGE: RangeInclusive<f32> = 0.0..=10.0;
pub const SHARPNESS_RANGE: RangeInclusive<f32> = 0.0..=10.0;
pub const EXPOSURE_RANGE: RangeInclusive<f32> = 50.0..=150.0;
pub const TEXT_SIZE_RANGE: RangeInclusive<f32> = 10.0..=100.0;

/// An sRGB colour with straight alpha, written as CSS hex (`#rrggbb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
            4 => Some(Self([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
            6 => Some(Self([byte(0)?, byte(2)?, byte(4)?, 255])),
            8 => Some(Self([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value).ok_or_else(|| format!("invalid hex colour {:?}", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Fixed social-platform output sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropPreset {
    Facebook,
    Instagram,
    Youtube,
    Linkedin,
    Twitter,
    #[default]
    Original,
}

impl CropPreset {
    pub const ALL: [CropPreset; 6] = [
        CropPreset::Facebook,
        CropPreset::Instagram,
        CropPreset::Youtube,
        CropPreset::Linkedin,
        CropPreset::Twitter,
        CropPreset::Original,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CropPreset::Facebook => "Facebook Profile",
            CropPreset::Instagram => "Instagram Profile",
            CropPreset::Youtube => "YouTube Profile",
            CropPreset::Linkedin => "LinkedIn Profile",
            CropPreset::Twitter => "Twitter/X Profile",
            CropPreset::Original => "Original",
        }
    }

    /// Declared `(width, height)`; a zero width means "source size".
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            CropPreset::Facebook => (170, 170),
            CropPreset::Instagram => (110, 110),
            CropPreset::Youtube => (800, 800),
            CropPreset::Linkedin | CropPreset::Twitter => (400, 400),
            CropPreset::Original => (0, 0),
        }
    }

    /// Fixed output size, or `None` when the source dimensions should be used.
    pub fn target_size(self) -> Option<(u32, u32)> {
        let (w, h) = self.dimensions();
        (w > 0 && h > 0).then_some((w, h))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Arial,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    #[serde(rename = "Courier New")]
    CourierNew,
    Georgia,
    Verdana,
    Impact,
}

/// Generic family a named face falls back to when it is not installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    SansSerif,
    Serif,
    Monospace,
}

impl FontFamily {
    pub const ALL: [FontFamily; 6] = [
        FontFamily::Arial,
        FontFamily::TimesNewRoman,
        FontFamily::CourierNew,
        FontFamily::Georgia,
        FontFamily::Verdana,
        FontFamily::Impact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
            FontFamily::Georgia => "Georgia",
            FontFamily::Verdana => "Verdana",
            FontFamily::Impact => "Impact",
        }
    }

    pub fn generic(self) -> GenericFamily {
        match self {
            FontFamily::TimesNewRoman | FontFamily::Georgia => GenericFamily::Serif,
            FontFamily::CourierNew => GenericFamily::Monospace,
            _ => GenericFamily::SansSerif,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl TextPosition {
    pub const ALL: [TextPosition; 3] = [TextPosition::Top, TextPosition::Center, TextPosition::Bottom];

    pub fn label(self) -> &'static str {
        match self {
            TextPosition::Top => "Top",
            TextPosition::Center => "Center",
            TextPosition::Bottom => "Bottom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Degrees, always a multiple of 90. May be negative after CCW steps.
    pub rotation: i32,
    pub zoom: f32,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            rotation: 0,
            zoom: 1.0,
            flip_h: false,
            flip_v: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSettings {
    pub preset: CropPreset,
    pub circle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Colour adjustments, all expressed the way CSS filter functions take them.
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
    pub blur: f32,
    pub sharpness: f32,
    pub exposure: f32,
    pub filter: FilterPreset,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
            blur: 0.0,
            sharpness: 0.0,
            exposure: 100.0,
            filter: FilterPreset::Normal,
        }
    }
}

impl Adjustments {
    /// True when the filter pass would be a no-op. Sharpness is a separate stage.
    pub fn is_neutral(&self) -> bool {
        self.filter == FilterPreset::Normal
            && self.brightness == 100.0
            && self.contrast == 100.0
            && self.saturation == 100.0
            && self.hue == 0.0
            && self.blur == 0.0
            && self.exposure == 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlay {
    pub content: String,
    pub color: Color,
    pub size: f32,
    pub font: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub position: TextPosition,
    pub shadow: bool,
    pub background: Option<Color>,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            content: String::new(),
            color: Color::WHITE,
            size: 24.0,
            font: FontFamily::Arial,
            bold: false,
            italic: false,
            position: TextPosition::Center,
            shadow: false,
            background: None,
        }
    }
}

/// Every parameter that drives a render.
///
/// Fields are private so that the `with_*` constructors are the only way to
/// change a value; each of them clamps to the field's bound. Deserialized
/// states go through the same constructors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "UncheckedEditState")]
pub struct EditState {
    geometry: Geometry,
    crop: CropSettings,
    adjust: Adjustments,
    text: TextOverlay,
    background: Option<Color>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct UncheckedEditState {
    geometry: Geometry,
    crop: CropSettings,
    adjust: Adjustments,
    text: TextOverlay,
    background: Option<Color>,
}

impl From<UncheckedEditState> for EditState {
    fn from(raw: UncheckedEditState) -> Self {
        EditState::default()
            .with_rotation(raw.geometry.rotation)
            .with_zoom(raw.geometry.zoom)
            .with_flip_h(raw.geometry.flip_h)
            .with_flip_v(raw.geometry.flip_v)
            .with_crop_preset(raw.crop.preset)
            .with_circle_crop(raw.crop.circle)
            .with_brightness(raw.adjust.brightness)
            .with_contrast(raw.adjust.contrast)
            .with_saturation(raw.adjust.saturation)
            .with_hue(raw.adjust.hue)
            .with_blur(raw.adjust.blur)
            .with_sharpness(raw.adjust.sharpness)
            .with_exposure(raw.adjust.exposure)
            .with_filter(raw.adjust.filter)
            .with_text(raw.text.content)
            .with_text_color(raw.text.color)
            .with_text_size(raw.text.size)
            .with_font(raw.text.font)
            .with_bold(raw.text.bold)
            .with_italic(raw.text.italic)
            .with_text_position(raw.text.position)
            .with_text_shadow(raw.text.shadow)
            .with_text_background(raw.text.background)
            .with_background(raw.background)
    }
}

fn bounded(value: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

/// Snaps to the nearest quarter turn, keeping the sign (`-90` stays `-90`).
fn snap_rotation(degrees: i32) -> i32 {
    let quarter_turns = (degrees as f64 / 90.0).round() as i32;
    (quarter_turns * 90) % 360
}

impl EditState {
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn crop(&self) -> &CropSettings {
        &self.crop
    }

    pub fn adjust(&self) -> &Adjustments {
        &self.adjust
    }

    pub fn text(&self) -> &TextOverlay {
        &self.text
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Parses a JSON document, defaulting missing fields and clamping the rest.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // Geometry

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.geometry.rotation = snap_rotation(degrees);
        self
    }

    pub fn rotated_cw(self) -> Self {
        let rotation = self.geometry.rotation;
        self.with_rotation((rotation + 90) % 360)
    }

    pub fn rotated_ccw(self) -> Self {
        let rotation = self.geometry.rotation;
        self.with_rotation((rotation - 90) % 360)
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.geometry.zoom = bounded(zoom, ZOOM_RANGE, 1.0);
        self
    }

    pub fn zoomed_in(self) -> Self {
        let zoom = self.geometry.zoom;
        self.with_zoom(zoom + ZOOM_STEP)
    }

    pub fn zoomed_out(self) -> Self {
        let zoom = self.geometry.zoom;
        self.with_zoom(zoom - ZOOM_STEP)
    }

    pub fn with_flip_h(mut self, flip: bool) -> Self {
        self.geometry.flip_h = flip;
        self
    }

    pub fn with_flip_v(mut self, flip: bool) -> Self {
        self.geometry.flip_v = flip;
        self
    }

    pub fn toggled_flip_h(self) -> Self {
        let flip = !self.geometry.flip_h;
        self.with_flip_h(flip)
    }

    pub fn toggled_flip_v(self) -> Self {
        let flip = !self.geometry.flip_v;
        self.with_flip_v(flip)
    }

    // Crop

    pub fn with_crop_preset(mut self, preset: CropPreset) -> Self {
        self.crop.preset = preset;
        self
    }

    pub fn with_circle_crop(mut self, circle: bool) -> Self {
        self.crop.circle = circle;
        self
    }

    pub fn toggled_circle_crop(self) -> Self {
        let circle = !self.crop.circle;
        self.with_circle_crop(circle)
    }

    // Colour adjustments

    pub fn with_brightness(mut self, pct: f32) -> Self {
        self.adjust.brightness = bounded(pct, BRIGHTNESS_RANGE, 100.0);
        self
    }

    pub fn with_contrast(mut self, pct: f32) -> Self {
        self.adjust.contrast = bounded(pct, CONTRAST_RANGE, 100.0);
        self
    }

    pub fn with_saturation(mut self, pct: f32) -> Self {
        self.adjust.saturation = bounded(pct, SATURATION_RANGE, 100.0);
        self
    }

    pub fn with_hue(mut self, degrees: f32) -> Self {
        self.adjust.hue = bounded(degrees, HUE_RANGE, 0.0);
        self
    }

    pub fn with_blur(mut self, px: f32) -> Self {
        self.adjust.blur = bounded(px, BLUR_RANGE, 0.0);
        self
    }

    pub fn with_sharpness(mut self, amount: f32) -> Self {
        self.adjust.sharpness = bounded(amount, SHARPNESS_RANGE, 0.0);
        self
    }

    pub fn with_exposure(mut self, pct: f32) -> Self {
        self.adjust.exposure = bounded(pct, EXPOSURE_RANGE, 100.0);
        self
    }

    pub fn with_filter(mut self, filter: FilterPreset) -> Self {
        self.adjust.filter = filter;
        self
    }

    /// Restores every colour adjustment (and the named filter) to neutral.
    pub fn reset_adjustments(mut self) -> Self {
        self.adjust = Adjustments::default();
        self
    }

    // Text overlay

    pub fn with_text(mut self, content: impl Into<String>) -> Self {
        self.text.content = content.into();
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text.color = color;
        self
    }

    pub fn with_text_size(mut self, px: f32) -> Self {
        self.text.size = bounded(px, TEXT_SIZE_RANGE, 24.0);
        self
    }

    pub fn with_font(mut self, font: FontFamily) -> Self {
        self.text.font = font;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.text.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.text.italic = italic;
        self
    }

    pub fn with_text_position(mut self, position: TextPosition) -> Self {
        self.text.position = position;
        self
    }

    pub fn with_text_shadow(mut self, shadow: bool) -> Self {
        self.text.shadow = shadow;
        self
    }

    pub fn with_text_background(mut self, color: Option<Color>) -> Self {
        self.text.background = color;
        self
    }

    // Canvas

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }
}
