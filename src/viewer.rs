use std::time::{Duration, Instant};

use crate::processing::text::FontSource;
use crate::session::EditorSession;
use crate::state::EditState;
use crate::upload::SourceImage;

/// Preview of the rendered canvas. Re-renders synchronously whenever the
/// live state differs from the one the texture was built from.
pub struct Viewer {
    texture: Option<egui::TextureHandle>,
    rendered_for: Option<EditState>,
    last_render: Option<Duration>,
}

impl Viewer {
    pub fn new() -> Self {
        Self {
            texture: None,
            rendered_for: None,
            last_render: None,
        }
    }

    /// Drops the current texture, e.g. after a new upload.
    pub fn reset(&mut self) {
        self.texture = None;
        self.rendered_for = None;
        self.last_render = None;
    }

    fn refresh(&mut self, ctx: &egui::Context, session: &EditorSession, fonts: &dyn FontSource) {
        if self.rendered_for.as_ref() == Some(session.state()) {
            return;
        }
        let started = Instant::now();
        let canvas = session.render(fonts);
        self.last_render = Some(started.elapsed());
        self.rendered_for = Some(session.state().clone());

        let (w, h) = canvas.dimensions();
        if w == 0 || h == 0 {
            self.texture = None;
            return;
        }
        let img = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], canvas.as_raw());
        match self.texture {
            Some(ref mut tex) => tex.set(img, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("canvas_tex", img, egui::TextureOptions::LINEAR));
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, session: &EditorSession, fonts: &dyn FontSource) {
        self.refresh(ui.ctx(), session, fonts);

        let Some(ref tex) = self.texture else {
            ui.centered_and_justified(|ui| {
                ui.label("⚠ Nothing to show");
            });
            return;
        };

        let avail = ui.available_size();
        let tex_size = tex.size_vec2();
        let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).min(1.0);
        let display = tex_size * scale;

        ui.vertical_centered(|ui| {
            let (img_rect, _) = ui.allocate_exact_size(display, egui::Sense::hover());
            paint_checkerboard(ui.painter(), img_rect);
            ui.painter().image(
                tex.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            let canvas = tex.size();
            let timing = self
                .last_render
                .map(|d| format!("  ·  {:.1} ms", d.as_secs_f64() * 1000.0))
                .unwrap_or_default();
            ui.weak(format!(
                "{} × {} px{}  ·  {}  ·  step {}/{}",
                canvas[0],
                canvas[1],
                timing,
                source_summary(session.source()),
                session.history().cursor() + 1,
                session.history().len()
            ));
        });
    }
}

/// Uploaded format and file size, e.g. `JPG 1.4 MB`.
fn source_summary(source: &SourceImage) -> String {
    let format = source
        .format
        .extensions_str()
        .first()
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_else(|| "image".to_string());
    let bytes = source.byte_len as f64;
    let size = if bytes >= 1024.0 * 1024.0 {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.0} KB", (bytes / 1024.0).ceil())
    };
    format!("{format} {size}")
}

/// Shows transparency behind the canvas.
fn paint_checkerboard(painter: &egui::Painter, rect: egui::Rect) {
    const CELL: f32 = 8.0;
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(200));
    let cols = (rect.width() / CELL).ceil() as usize;
    let rows = (rect.height() / CELL).ceil() as usize;
    for row in 0..rows {
        for col in (row % 2..cols).step_by(2) {
            let min = rect.min + egui::vec2(col as f32 * CELL, row as f32 * CELL);
            let cell = egui::Rect::from_min_size(min, egui::vec2(CELL, CELL)).intersect(rect);
            painter.rect_filled(cell, 0.0, egui::Color32::from_gray(235));
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, RgbaImage};

    use super::source_summary;
    use crate::upload::SourceImage;

    fn source(format: ImageFormat, byte_len: usize) -> SourceImage {
        SourceImage {
            pixels: RgbaImage::new(1, 1),
            format,
            byte_len,
        }
    }

    #[test]
    fn summary_names_format_and_size() {
        assert_eq!(source_summary(&source(ImageFormat::Png, 2048)), "PNG 2 KB");
        assert_eq!(source_summary(&source(ImageFormat::Jpeg, 3 * 1024 * 1024 / 2)), "JPG 1.5 MB");
    }
}
