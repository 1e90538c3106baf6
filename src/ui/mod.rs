//! GUI implementation with egui/eframe
//!
//! This module provides the desktop chat view using the eframe framework.

mod app;
pub mod components;
mod markdown;
mod state;
mod theme;

use crate::config::ChatterConfig;

pub use app::ChatterApp;
pub use markdown::MarkdownView;
pub use state::AppState;
pub use theme::{toggle_theme, Theme, ThemeMode, ThemeState, ThemeStore};

/// Run the chat application
pub fn run(config: ChatterConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Chatter"),
        ..Default::default()
    };

    eframe::run_native(
        "Chatter",
        options,
        Box::new(move |_cc| Ok(Box::new(ChatterApp::from_config(&config)))),
    )
}
