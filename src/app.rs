use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::{
    config::AppConfig,
    editor::EditorPanel,
    export,
    processing::text::SystemFonts,
    session::EditorSession,
    state::EditState,
    upload::{self, ACCEPTED_EXTENSIONS, SourceImage, UploadError},
    viewer::Viewer,
};

const STATUS_TTL: Duration = Duration::from_secs(4);

struct Status {
    message: String,
    is_error: bool,
    shown_at: Instant,
}

pub struct ProfileEditorApp {
    session: Option<EditorSession>,
    viewer: Viewer,
    editor: EditorPanel,
    fonts: SystemFonts,
    status: Option<Status>,
    dark_mode: bool,
    config: AppConfig,
}

impl ProfileEditorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let dark_mode = config
            .dark_mode
            .unwrap_or_else(|| cc.egui_ctx.style().visuals.dark_mode);
        cc.egui_ctx.set_visuals(visuals(dark_mode));
        Self {
            session: None,
            viewer: Viewer::new(),
            editor: EditorPanel::new(),
            fonts: SystemFonts::new(),
            status: None,
            dark_mode,
            config,
        }
    }

    fn notify(&mut self, message: impl Into<String>, is_error: bool) {
        self.status = Some(Status {
            message: message.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    fn open_upload(&mut self, result: Result<SourceImage, UploadError>) {
        match result {
            Ok(source) => {
                self.session = Some(EditorSession::new(source));
                self.viewer.reset();
                self.notify("Image uploaded successfully!", false);
            }
            Err(err) => {
                tracing::warn!(%err, "upload rejected");
                self.notify(upload_message(&err), true);
            }
        }
    }

    fn pick_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", &ACCEPTED_EXTENSIONS);
        if let Some(dir) = self.config.last_open_dir.as_ref().filter(|d| d.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        self.config.last_open_dir = path.parent().map(PathBuf::from);
        self.open_upload(upload::load_path(&path));
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        let mime = (!file.mime.is_empty()).then_some(file.mime.as_str());
        let result = if let Some(bytes) = file.bytes.as_deref() {
            upload::load_bytes(bytes, mime)
        } else if let Some(path) = file.path.as_ref() {
            upload::load_path(path)
        } else {
            Err(UploadError::Empty)
        };
        self.open_upload(result);
    }

    fn download(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let canvas = session.render(&self.fonts);
        let dir = self.config.resolved_export_dir();
        match export::write_png(&canvas, &dir, self.config.file_name(), self.config.compression()) {
            Ok(path) => self.notify(format!("Image downloaded successfully! ({})", path.display()), false),
            Err(err) => {
                tracing::error!(%err, "export failed");
                self.notify("Failed to download image. Please try again.", true);
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // Leave text fields their own undo.
        if ctx.wants_keyboard_input() {
            return;
        }
        let redo = ctx.input_mut(|i| {
            i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
        });
        let undo = ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z));
        if redo {
            session.redo();
        } else if undo {
            session.undo();
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Social Media Image Editor");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.dark_mode { "☀ Light" } else { "🌙 Dark" };
                    if ui.button(label).clicked() {
                        self.dark_mode = !self.dark_mode;
                        self.config.dark_mode = Some(self.dark_mode);
                        ctx.set_visuals(visuals(self.dark_mode));
                    }
                });
            });
        });
    }

    fn show_status(&mut self, ctx: &egui::Context) {
        let Some(status) = self.status.as_ref() else {
            return;
        };
        let age = status.shown_at.elapsed();
        if age >= STATUS_TTL {
            self.status = None;
            return;
        }
        ctx.request_repaint_after(STATUS_TTL - age);
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let color = if status.is_error {
                ui.visuals().error_fg_color
            } else {
                ui.visuals().strong_text_color()
            };
            ui.colored_label(color, &status.message);
        });
    }

    fn show_upload_screen(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading("Edit Your Social Media Profile Images");
                ui.label(
                    "Upload an image, customize it for different platforms, and download the perfect profile picture.",
                );
                ui.add_space(24.0);

                let frame = egui::Frame::group(ui.style()).inner_margin(32.0);
                let frame = if hovering {
                    frame.fill(ui.visuals().selection.bg_fill)
                } else {
                    frame
                };
                frame.show(ui, |ui| {
                    ui.set_min_width(ui.available_width().min(520.0));
                    ui.label(egui::RichText::new("Drag & drop your image here").size(18.0));
                    ui.weak("or click to browse files (JPEG, PNG, WebP)");
                    ui.add_space(12.0);
                    if ui.button("🖼 Select Image").clicked() {
                        self.pick_file();
                    }
                });
            });
        });
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut back = false;
        let mut download = false;

        egui::SidePanel::right("editor_panel")
            .resizable(false)
            .exact_width(320.0)
            .show(ctx, |ui| {
                self.editor.show(ui, session);
            });

        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("⟲ Rotate Left").clicked() {
                    session.apply(EditState::rotated_ccw);
                }
                if ui.button("⟳ Rotate Right").clicked() {
                    session.apply(EditState::rotated_cw);
                }
                if ui.button("＋ Zoom In").clicked() {
                    session.apply(EditState::zoomed_in);
                }
                if ui.button("－ Zoom Out").clicked() {
                    session.apply(EditState::zoomed_out);
                }
                let circle = session.state().crop().circle;
                let label = if circle { "◯ Disable Circle" } else { "◯ Enable Circle" };
                if ui.selectable_label(circle, label).clicked() {
                    session.apply(EditState::toggled_circle_crop);
                }
                ui.separator();
                if ui.button("⬇ Download").clicked() {
                    download = true;
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.add_enabled(session.can_undo(), egui::Button::new("↶")).on_hover_text("Undo").clicked() {
                    session.undo();
                }
                if ui.add_enabled(session.can_redo(), egui::Button::new("↷")).on_hover_text("Redo").clicked() {
                    session.redo();
                }
                if ui.button("Back").clicked() {
                    back = true;
                }
            });
            ui.separator();
            self.viewer.show(ui, session, &self.fonts);
        });

        if back {
            self.session = None;
            self.viewer.reset();
        }
        if download {
            self.download();
        }
    }
}

fn visuals(dark_mode: bool) -> egui::Visuals {
    if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    }
}

fn upload_message(err: &UploadError) -> String {
    match err {
        UploadError::NotAnImage(_) => "Only image files are allowed".to_string(),
        UploadError::Unsupported | UploadError::Empty => {
            "Please upload an image file (JPEG, PNG, WebP)".to_string()
        }
        other => other.to_string(),
    }
}

impl eframe::App for ProfileEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window size for saving on exit
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        self.show_header(ctx);
        self.show_status(ctx);
        if self.session.is_some() {
            self.show_editor(ctx);
        } else {
            self.show_upload_screen(ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}

#[cfg(test)]
mod tests {
    use super::upload_message;
    use crate::upload::UploadError;

    #[test]
    fn upload_messages_match_failure_kind() {
        assert_eq!(
            upload_message(&UploadError::NotAnImage("text/plain".into())),
            "Only image files are allowed"
        );
        assert_eq!(
            upload_message(&UploadError::Unsupported),
            "Please upload an image file (JPEG, PNG, WebP)"
        );
    }
}
