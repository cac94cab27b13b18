use image::RgbaImage;

use crate::export::{self, ExportError};
use crate::history::History;
use crate::processing::render::render;
use crate::processing::text::FontSource;
use crate::state::EditState;
use crate::upload::SourceImage;

/// One open image: the decoded source, the live parameters and their history.
///
/// The live state may run ahead of the history while a slider is dragged
/// (`preview`); it is committed when the gesture ends.
pub struct EditorSession {
    source: SourceImage,
    state: EditState,
    history: History,
}

impl EditorSession {
    pub fn new(source: SourceImage) -> Self {
        let state = EditState::default();
        Self {
            source,
            history: History::new(state.clone()),
            state,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Changes the live state without recording it.
    pub fn preview(&mut self, change: impl FnOnce(EditState) -> EditState) {
        self.state = change(self.state.clone());
    }

    /// Changes the live state and records the result.
    pub fn apply(&mut self, change: impl FnOnce(EditState) -> EditState) {
        self.preview(change);
        self.commit();
    }

    /// Records the live state unless it already matches the cursor entry.
    pub fn commit(&mut self) {
        if self.history.current() != &self.state {
            self.history.commit(self.state.clone());
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Steps back one snapshot. Returns `false` at the start of history.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                self.state = state.clone();
                true
            }
            None => false,
        }
    }

    /// Steps forward one snapshot. Returns `false` at the end of history.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                self.state = state.clone();
                true
            }
            None => false,
        }
    }

    pub fn render(&self, fonts: &dyn FontSource) -> RgbaImage {
        render(&self.source.pixels, &self.state, fonts)
    }

    /// Renders the live state and encodes it as PNG.
    pub fn export_png(&self, fonts: &dyn FontSource, compression: u8) -> Result<Vec<u8>, ExportError> {
        export::encode_png(&self.render(fonts), compression)
    }
}

#[cfg(test)]
mod tests {
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};

    use crate::processing::text::tests::NoFonts;
    use crate::state::{CropPreset, EditState};
    use crate::upload::SourceImage;

    use super::EditorSession;

    fn session() -> EditorSession {
        let pixels: RgbaImage =
            ImageBuffer::from_fn(30, 20, |x, y| Rgba([(x * 8) as u8, (y * 12) as u8, 77, 255]));
        EditorSession::new(SourceImage {
            pixels,
            format: ImageFormat::Png,
            byte_len: 0,
        })
    }

    #[test]
    fn starts_with_default_state_committed() {
        let s = session();
        assert_eq!(s.state(), &EditState::default());
        assert_eq!(s.history().len(), 1);
        assert!(!s.can_undo());
        assert!(!s.can_redo());
    }

    #[test]
    fn preview_is_not_recorded_until_commit() {
        let mut s = session();
        s.preview(|st| st.with_brightness(120.0));
        s.preview(|st| st.with_brightness(130.0));
        assert_eq!(s.history().len(), 1);
        s.commit();
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.state().adjust().brightness, 130.0);
    }

    #[test]
    fn commit_without_change_is_ignored() {
        let mut s = session();
        s.commit();
        s.apply(|st| st);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn undo_and_redo_restore_identical_renders() {
        let mut s = session();
        let fonts = NoFonts::new();
        s.apply(|st| st.rotated_cw());
        s.apply(|st| st.with_crop_preset(CropPreset::Instagram));
        s.apply(|st| st.with_sharpness(5.0).with_contrast(140.0));
        let final_state = s.state().clone();
        let final_render = s.render(&fonts);

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.undo());
        assert!(!s.undo());
        assert_eq!(s.state(), &EditState::default());
        assert_eq!(s.render(&fonts), s.source().pixels);

        assert!(s.redo());
        assert!(s.redo());
        assert!(s.redo());
        assert!(!s.redo());
        assert_eq!(s.state(), &final_state);
        assert_eq!(s.render(&fonts), final_render);
    }

    #[test]
    fn new_change_after_undo_drops_redo() {
        let mut s = session();
        s.apply(|st| st.rotated_cw());
        s.apply(|st| st.rotated_cw());
        s.undo();
        s.apply(|st| st.toggled_flip_h());
        assert!(!s.can_redo());
        assert_eq!(s.history().len(), 3);
        assert_eq!(s.state().geometry().rotation, 90);
        assert!(s.state().geometry().flip_h);
    }

    #[test]
    fn export_encodes_the_render() {
        let mut s = session();
        s.apply(|st| st.with_crop_preset(CropPreset::Instagram));
        let bytes = s.export_png(&NoFonts::new(), 6).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (110, 110));
    }
}
