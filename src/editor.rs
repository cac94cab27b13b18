use std::ops::RangeInclusive;

use crate::processing::filters::FilterPreset;
use crate::session::EditorSession;
use crate::state::{
    BLUR_RANGE, BRIGHTNESS_RANGE, CONTRAST_RANGE, Color, CropPreset, EXPOSURE_RANGE, EditState,
    FontFamily, HUE_RANGE, SATURATION_RANGE, SHARPNESS_RANGE, TEXT_SIZE_RANGE, TextPosition,
    ZOOM_RANGE,
};

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    Crop,
    Adjust,
    Filters,
    Text,
    Effects,
}

impl Tab {
    const ALL: [Tab; 5] = [Tab::Crop, Tab::Adjust, Tab::Filters, Tab::Text, Tab::Effects];

    fn label(self) -> &'static str {
        match self {
            Tab::Crop => "Crop",
            Tab::Adjust => "Adjust",
            Tab::Filters => "Filters",
            Tab::Text => "Text",
            Tab::Effects => "Effects",
        }
    }
}

/// Tabbed controls. Continuous controls (sliders, colour pickers) preview
/// while the pointer is held and commit one history entry on release;
/// buttons commit immediately.
#[derive(Default)]
pub struct EditorPanel {
    tab: Tab,
    pending_commit: bool,
}

impl EditorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut EditorSession) {
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.label());
            }
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("editor_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| match self.tab {
                Tab::Crop => self.show_crop(ui, session),
                Tab::Adjust => self.show_adjust(ui, session),
                Tab::Filters => show_filters(ui, session),
                Tab::Text => self.show_text(ui, session),
                Tab::Effects => self.show_effects(ui, session),
            });

        if self.pending_commit && !ui.ctx().input(|i| i.pointer.any_down()) {
            session.commit();
            self.pending_commit = false;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn slider(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut EditorSession,
        label: &str,
        value: f32,
        range: RangeInclusive<f32>,
        suffix: &str,
        set: fn(EditState, f32) -> EditState,
    ) {
        let mut v = value;
        ui.label(format!("{label}: {v:.0}{suffix}"));
        let resp = ui.add(
            egui::Slider::new(&mut v, range)
                .show_value(false)
                .clamping(egui::SliderClamping::Always),
        );
        if resp.changed() {
            session.preview(|s| set(s, v));
            self.pending_commit = true;
        }
    }

    fn color(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut EditorSession,
        value: Color,
        set: impl FnOnce(EditState, Color) -> EditState,
    ) {
        let [r, g, b, a] = value.0;
        let mut c = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
        if ui.color_edit_button_srgba(&mut c).changed() {
            let picked = Color(c.to_srgba_unmultiplied());
            session.preview(|s| set(s, picked));
            self.pending_commit = true;
        }
    }

    fn show_crop(&mut self, ui: &mut egui::Ui, session: &mut EditorSession) {
        ui.strong("Platform Presets");
        egui::Grid::new("crop_presets").num_columns(2).show(ui, |ui| {
            for (i, preset) in CropPreset::ALL.into_iter().enumerate() {
                let selected = session.state().crop().preset == preset;
                let hint = match preset.target_size() {
                    Some((w, h)) => format!("{w} × {h} px"),
                    None => "Source size".to_string(),
                };
                if ui.selectable_label(selected, preset.label()).on_hover_text(hint).clicked() {
                    session.apply(|s| s.with_crop_preset(preset));
                }
                if i % 2 == 1 {
                    ui.end_row();
                }
            }
        });

        ui.separator();
        ui.strong("Transform");
        ui.horizontal(|ui| {
            let geometry = session.state().geometry().clone();
            if ui.selectable_label(geometry.flip_h, "↔ Flip Horizontal").clicked() {
                session.apply(EditState::toggled_flip_h);
            }
            if ui.selectable_label(geometry.flip_v, "↕ Flip Vertical").clicked() {
                session.apply(EditState::toggled_flip_v);
            }
        });
        let zoom = session.state().geometry().zoom;
        self.slider(ui, session, "Zoom", zoom * 100.0, pct(ZOOM_RANGE), "%", |s, v| {
            s.with_zoom(v / 100.0)
        });
    }

    fn show_adjust(&mut self, ui: &mut egui::Ui, session: &mut EditorSession) {
        let adjust = session.state().adjust().clone();
        self.slider(ui, session, "Brightness", adjust.brightness, BRIGHTNESS_RANGE, "%", EditState::with_brightness);
        self.slider(ui, session, "Contrast", adjust.contrast, CONTRAST_RANGE, "%", EditState::with_contrast);
        self.slider(ui, session, "Saturation", adjust.saturation, SATURATION_RANGE, "%", EditState::with_saturation);
        self.slider(ui, session, "Hue Rotation", adjust.hue, HUE_RANGE, "°", EditState::with_hue);
        self.slider(ui, session, "Blur", adjust.blur, BLUR_RANGE, "px", EditState::with_blur);
        self.slider(ui, session, "Sharpness", adjust.sharpness, SHARPNESS_RANGE, "", EditState::with_sharpness);
        self.slider(ui, session, "Exposure", adjust.exposure, EXPOSURE_RANGE, "%", EditState::with_exposure);

        ui.add_space(8.0);
        let neutral = EditState::default();
        let untouched = session.state().adjust() == neutral.adjust();
        if ui.add_enabled(!untouched, egui::Button::new("Reset Adjustments")).clicked() {
            session.apply(EditState::reset_adjustments);
        }
    }

    fn show_text(&mut self, ui: &mut egui::Ui, session: &mut EditorSession) {
        let text = session.state().text().clone();

        ui.label("Text Overlay");
        let mut content = text.content.clone();
        let resp = ui.add(egui::TextEdit::singleline(&mut content).hint_text("Enter text..."));
        if resp.changed() {
            session.preview(|s| s.with_text(content));
        }
        if resp.lost_focus() {
            session.commit();
        }

        ui.add_space(4.0);
        let mut font = text.font;
        egui::ComboBox::from_label("Font")
            .selected_text(font.name())
            .show_ui(ui, |ui| {
                for f in FontFamily::ALL {
                    ui.selectable_value(&mut font, f, f.name());
                }
            });
        if font != text.font {
            session.apply(|s| s.with_font(font));
        }

        ui.horizontal(|ui| {
            ui.label("Text Color");
            self.color(ui, session, text.color, EditState::with_text_color);
        });
        self.slider(ui, session, "Size", text.size, TEXT_SIZE_RANGE, "px", EditState::with_text_size);

        ui.horizontal(|ui| {
            if ui.selectable_label(text.bold, egui::RichText::new("B").strong()).clicked() {
                session.apply(|s| s.with_bold(!text.bold));
            }
            if ui.selectable_label(text.italic, egui::RichText::new("I").italics()).clicked() {
                session.apply(|s| s.with_italic(!text.italic));
            }
        });

        ui.label("Text Position");
        ui.horizontal(|ui| {
            for position in TextPosition::ALL {
                if ui.selectable_label(text.position == position, position.label()).clicked() {
                    session.apply(|s| s.with_text_position(position));
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Text Shadow");
            let label = if text.shadow { "On" } else { "Off" };
            if ui.selectable_label(text.shadow, label).clicked() {
                session.apply(|s| s.with_text_shadow(!text.shadow));
            }
        });

        ui.label("Text Background");
        ui.horizontal(|ui| {
            match text.background {
                Some(bg) => self.color(ui, session, bg, |s, c| s.with_text_background(Some(c))),
                None => {
                    ui.weak("No Background");
                }
            }
            if ui.button("Clear").clicked() {
                session.apply(|s| s.with_text_background(None));
            }
            if ui.button("Black").clicked() {
                session.apply(|s| s.with_text_background(Some(Color::BLACK)));
            }
        });
    }

    fn show_effects(&mut self, ui: &mut egui::Ui, session: &mut EditorSession) {
        ui.label("Background Color");
        ui.horizontal(|ui| {
            match session.state().background() {
                Some(bg) => self.color(ui, session, bg, |s, c| s.with_background(Some(c))),
                None => {
                    ui.weak("Transparent");
                }
            }
            if ui.button("Transparent").clicked() {
                session.apply(|s| s.with_background(None));
            }
            if ui.button("White").clicked() {
                session.apply(|s| s.with_background(Some(Color::WHITE)));
            }
        });

        ui.add_space(8.0);
        ui.label("Image Shape");
        ui.horizontal(|ui| {
            let circle = session.state().crop().circle;
            if ui.selectable_label(!circle, "▭ Rectangle").clicked() {
                session.apply(|s| s.with_circle_crop(false));
            }
            if ui.selectable_label(circle, "◯ Circle").clicked() {
                session.apply(|s| s.with_circle_crop(true));
            }
        });
    }
}

fn show_filters(ui: &mut egui::Ui, session: &mut EditorSession) {
    egui::Grid::new("filter_presets").num_columns(2).show(ui, |ui| {
        for (i, filter) in FilterPreset::ALL.into_iter().enumerate() {
            let selected = session.state().adjust().filter == filter;
            let resp = ui.selectable_label(selected, filter.label()).on_hover_text(filter.css());
            if resp.clicked() {
                session.apply(|s| s.with_filter(filter));
            }
            if i % 2 == 1 {
                ui.end_row();
            }
        }
    });
}

fn pct(range: RangeInclusive<f32>) -> RangeInclusive<f32> {
    range.start() * 100.0..=range.end() * 100.0
}
