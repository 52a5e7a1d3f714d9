//! Selection clamping and per-mode generator interaction state.

use crate::render::{Mode, ReferenceImage, RenderRequest, RenderedImage};

/// Clamps a candidate selection to at most `max` items.
///
/// This is a clamp, not a rejection: excess items are silently dropped and
/// the kept items are the prefix of the input, in order. An empty input
/// stays empty.
pub fn clamp_selection<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.truncate(max);
    items
}

/// One finished render in the single-mode gallery.
#[derive(Debug, Clone)]
pub struct RenderEntry {
    /// Displayable data URL.
    pub data_url: String,
    /// Download filename, distinct per entry.
    pub filename: String,
}

/// Interaction state of the generator screen for one mode.
///
/// Single mode holds one reference at a time and accumulates every finished
/// render in a gallery. Mix mode accumulates up to ten references and keeps
/// only the latest result.
#[derive(Debug)]
pub struct Workbench {
    mode: Mode,
    selected: Vec<ReferenceImage>,
    latest: Option<String>,
    gallery: Vec<RenderEntry>,
}

impl Workbench {
    /// Creates an empty workbench for the given mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            selected: Vec::new(),
            latest: None,
            gallery: Vec::new(),
        }
    }

    /// The workbench mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Currently selected reference images.
    pub fn selected(&self) -> &[ReferenceImage] {
        &self.selected
    }

    /// Adds newly picked files.
    ///
    /// Single mode replaces the current selection; mix mode appends to it.
    /// Either way the result is re-clamped to the mode's cap, so dropping a
    /// pile of files at once never overflows it.
    pub fn add_files(&mut self, files: Vec<ReferenceImage>) {
        let max = self.mode.max_references();
        let combined = match self.mode {
            Mode::Single => files,
            Mode::Mix => {
                let mut combined = std::mem::take(&mut self.selected);
                combined.extend(files);
                combined
            }
        };
        self.selected = clamp_selection(combined, max);
    }

    /// Removes the selected image at `index`, if any.
    pub fn remove(&mut self, index: usize) {
        if index < self.selected.len() {
            self.selected.remove(index);
        }
    }

    /// True once at least one reference is selected.
    pub fn can_generate(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Builds the render request for the current selection.
    pub fn request(&self) -> RenderRequest {
        RenderRequest::new(self.mode).with_references(self.selected.clone())
    }

    /// Records a finished render. The latest result is always shown; single
    /// mode additionally appends it to the gallery under a distinct
    /// download filename.
    pub fn record(&mut self, image: &RenderedImage) {
        let data_url = image.to_data_url();
        self.latest = Some(data_url.clone());
        if self.mode == Mode::Single {
            let filename = format!("product-{}.{}", self.gallery.len(), image.format.extension());
            self.gallery.push(RenderEntry { data_url, filename });
        }
    }

    /// The most recent render, as a data URL.
    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// Prior renders (single mode only; always empty in mix mode).
    pub fn gallery(&self) -> &[RenderEntry] {
        &self.gallery
    }

    /// Clears the upload form and current result to start the next item.
    /// Prior gallery entries are kept.
    pub fn reset_uploads(&mut self) {
        self.selected.clear();
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ImageFormat, RenderMetadata};
    use std::collections::HashSet;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn reference(name: &str) -> ReferenceImage {
        ReferenceImage::from_bytes(PNG_MAGIC.to_vec())
            .unwrap()
            .with_name(name)
    }

    fn rendered(byte: u8) -> RenderedImage {
        let mut data = PNG_MAGIC.to_vec();
        data.push(byte);
        RenderedImage::new(data, ImageFormat::Png, RenderMetadata::default())
    }

    #[test]
    fn test_clamp_is_order_preserving_prefix() {
        let clamped = clamp_selection(vec![1, 2, 3, 4, 5], 3);
        assert_eq!(clamped, vec![1, 2, 3]);
    }

    #[test]
    fn test_clamp_one_of_three_keeps_first() {
        let clamped = clamp_selection(vec!["a", "b", "c"], 1);
        assert_eq!(clamped, vec!["a"]);
    }

    #[test]
    fn test_clamp_under_limit_unchanged() {
        let clamped = clamp_selection(vec![1, 2, 3, 4, 5], 10);
        assert_eq!(clamped, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_clamp_empty_is_empty() {
        let clamped: Vec<u8> = clamp_selection(Vec::new(), 10);
        assert!(clamped.is_empty());
    }

    #[test]
    fn test_single_mode_replaces_selection() {
        let mut bench = Workbench::new(Mode::Single);
        bench.add_files(vec![reference("a"), reference("b"), reference("c")]);
        assert_eq!(bench.selected().len(), 1);
        assert_eq!(bench.selected()[0].name.as_deref(), Some("a"));

        bench.add_files(vec![reference("d")]);
        assert_eq!(bench.selected()[0].name.as_deref(), Some("d"));
    }

    #[test]
    fn test_mix_mode_appends_and_reclamps() {
        let mut bench = Workbench::new(Mode::Mix);
        bench.add_files((0..6).map(|i| reference(&i.to_string())).collect());
        assert_eq!(bench.selected().len(), 6);

        bench.add_files((6..12).map(|i| reference(&i.to_string())).collect());
        assert_eq!(bench.selected().len(), 10);
        // Earlier picks win; the overflow from the second batch is dropped.
        assert_eq!(bench.selected()[0].name.as_deref(), Some("0"));
        assert_eq!(bench.selected()[9].name.as_deref(), Some("9"));
    }

    #[test]
    fn test_remove_by_index() {
        let mut bench = Workbench::new(Mode::Mix);
        bench.add_files(vec![reference("a"), reference("b"), reference("c")]);
        bench.remove(1);
        assert_eq!(bench.selected().len(), 2);
        assert_eq!(bench.selected()[1].name.as_deref(), Some("c"));

        // Out-of-range removal is a no-op.
        bench.remove(10);
        assert_eq!(bench.selected().len(), 2);
    }

    #[test]
    fn test_single_mode_gallery_accumulates() {
        let mut bench = Workbench::new(Mode::Single);
        bench.add_files(vec![reference("a")]);

        for i in 0..3u8 {
            bench.record(&rendered(i));
            bench.reset_uploads();
            bench.add_files(vec![reference("next")]);
        }

        assert_eq!(bench.gallery().len(), 3);
        let filenames: HashSet<_> = bench.gallery().iter().map(|e| e.filename.clone()).collect();
        assert_eq!(filenames.len(), 3, "download filenames must be distinct");
    }

    #[test]
    fn test_mix_mode_keeps_only_latest() {
        let mut bench = Workbench::new(Mode::Mix);
        bench.add_files(vec![reference("a")]);

        for i in 0..3u8 {
            bench.record(&rendered(i));
        }

        assert!(bench.gallery().is_empty());
        assert_eq!(bench.latest(), Some(rendered(2).to_data_url().as_str()));
    }

    #[test]
    fn test_reset_uploads_keeps_gallery() {
        let mut bench = Workbench::new(Mode::Single);
        bench.add_files(vec![reference("a")]);
        bench.record(&rendered(0));

        bench.reset_uploads();
        assert!(bench.selected().is_empty());
        assert!(bench.latest().is_none());
        assert!(!bench.can_generate());
        assert_eq!(bench.gallery().len(), 1);
    }

    #[test]
    fn test_request_reflects_selection() {
        let mut bench = Workbench::new(Mode::Mix);
        bench.add_files(vec![reference("a"), reference("b")]);
        let request = bench.request();
        assert_eq!(request.mode, Mode::Mix);
        assert_eq!(request.references.len(), 2);
        assert!(request.validate().is_ok());
    }
}
