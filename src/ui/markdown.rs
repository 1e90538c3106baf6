//! Markdown rendering for message bodies

use egui_commonmark::{CommonMarkCache, CommonMarkViewer};

/// Renders markdown text with a shared image/link cache
#[derive(Default)]
pub struct MarkdownView {
    cache: CommonMarkCache,
}

impl MarkdownView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, text: &str) {
        CommonMarkViewer::new().show(ui, &mut self.cache, text);
    }
}
