mod app;
mod config;
mod editor;
mod export;
mod history;
mod processing;
mod session;
mod state;
mod upload;
mod viewer;

use app::ProfileEditorApp;
use config::AppConfig;
use image::{ImageBuffer, Rgba, RgbaImage};

const ICON_SIZE: u32 = 128;

/// Accent disc with a ring, drawn at startup.
fn build_window_icon() -> egui::IconData {
    let center = ICON_SIZE as f32 / 2.0;
    let icon: RgbaImage = ImageBuffer::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let r = (dx * dx + dy * dy).sqrt();
        if r > center - 2.0 {
            Rgba([0, 0, 0, 0])
        } else if r > center - 14.0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([124, 58, 237, 255])
        }
    });
    let (width, height) = icon.dimensions();

    egui::IconData {
        rgba: icon.into_raw(),
        width,
        height,
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let width = config.window_width.unwrap_or(1200.0);
    let height = config.window_height.unwrap_or(800.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Social Media Image Editor")
            .with_app_id("profile-editor")
            .with_icon(build_window_icon())
            .with_inner_size([width, height])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "profile-editor",
        native_options,
        Box::new(|cc| Ok(Box::new(ProfileEditorApp::new(cc, config)))),
    )
}
