use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

#[path = "../config.rs"]
mod config;
#[path = "../export.rs"]
mod export;
#[path = "../processing/mod.rs"]
mod processing;
#[path = "../state.rs"]
mod state;
#[path = "../upload.rs"]
mod upload;

const USAGE: &str = "usage: render_file <image> [params.json] [output.png]";

fn read_state(path: Option<&Path>) -> Result<state::EditState> {
    let Some(path) = path else {
        return Ok(state::EditState::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("read params failed for {}", path.display()))?;
    state::EditState::from_json(&json)
        .with_context(|| format!("invalid params in {}", path.display()))
}

/// Splits an explicit output path into directory and file name.
fn output_target(output: Option<PathBuf>, config: &config::AppConfig) -> Result<(PathBuf, String)> {
    let Some(output) = output else {
        return Ok((config.resolved_export_dir(), config.file_name().to_string()));
    };
    let name = output
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("output path has no file name: {}", output.display()))?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args();
    let _bin = args.next();
    let input = args.next().map(PathBuf::from).context(USAGE)?;
    let params = args.next().map(PathBuf::from);
    let output = args.next().map(PathBuf::from);

    let config = config::AppConfig::load();
    let edit_state = read_state(params.as_deref())?;
    let source = upload::load_path(&input)
        .with_context(|| format!("upload failed for {}", input.display()))?;

    tracing::info!(
        format = ?source.format,
        bytes = source.byte_len,
        width = source.pixels.width(),
        height = source.pixels.height(),
        "source loaded"
    );

    let fonts = processing::text::SystemFonts::new();
    let t0 = Instant::now();
    let canvas = processing::render::render(&source.pixels, &edit_state, &fonts);
    let render_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let (dir, name) = output_target(output, &config)?;
    let written = export::write_png(&canvas, &dir, &name, config.compression())
        .with_context(|| format!("export failed for {}", dir.join(&name).display()))?;

    println!(
        "{} ({}x{}, {:.2} ms)",
        written.display(),
        canvas.width(),
        canvas.height(),
        render_ms
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{config::AppConfig, output_target};

    #[test]
    fn bare_file_name_lands_in_current_dir() {
        let (dir, name) = output_target(Some(PathBuf::from("me.png")), &AppConfig::default()).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "me.png");
    }

    #[test]
    fn explicit_directory_is_kept() {
        let (dir, name) =
            output_target(Some(PathBuf::from("out/avatars/me.png")), &AppConfig::default()).unwrap();
        assert_eq!(dir, PathBuf::from("out/avatars"));
        assert_eq!(name, "me.png");
    }

    #[test]
    fn missing_output_uses_configured_name() {
        let (_, name) = output_target(None, &AppConfig::default()).unwrap();
        assert_eq!(name, "social-profile-image.png");
    }
}
