//! Utility bar: theme toggle and repository link

use crate::ui::theme::{toggle_theme, Theme, ThemeMode, ThemeStore};
use egui::{self, Align, Layout, RichText, WidgetInfo, WidgetType};

pub const TOGGLE_THEME_LABEL: &str = "Toggle theme";
pub const REPOSITORY_LABEL: &str = "Open repository";

/// Holds rendering back until the first pass has completed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountGate {
    mounted: bool,
}

impl MountGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns whether this pass may render. The first call flips the gate
    /// and returns false.
    pub fn pass(&mut self) -> bool {
        if self.mounted {
            true
        } else {
            self.mounted = true;
            false
        }
    }
}

/// What the bar did during one pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UtilityBarOutput {
    /// Number of controls drawn
    pub controls: usize,
    /// Theme after a toggle, if one happened
    pub toggled: Option<ThemeMode>,
}

pub struct UtilityBar<'a> {
    gate: &'a mut MountGate,
    store: &'a mut dyn ThemeStore,
    theme: &'a Theme,
    repository_url: &'a str,
}

impl<'a> UtilityBar<'a> {
    pub fn new(
        gate: &'a mut MountGate,
        store: &'a mut dyn ThemeStore,
        theme: &'a Theme,
        repository_url: &'a str,
    ) -> Self {
        Self {
            gate,
            store,
            theme,
            repository_url,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) -> UtilityBarOutput {
        let mut output = UtilityBarOutput::default();

        if !self.gate.pass() {
            ui.ctx().request_repaint();
            return output;
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.spacing_mut().item_spacing.x = self.theme.spacing_sm;

            let icon = match self.store.theme() {
                ThemeMode::Light => "🌙",
                ThemeMode::Dark => "☀",
            };
            let toggle = ui
                .add(
                    egui::Button::new(RichText::new(icon).size(16.0))
                        .rounding(self.theme.button_rounding),
                )
                .on_hover_text(TOGGLE_THEME_LABEL);
            toggle.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, TOGGLE_THEME_LABEL));
            output.controls += 1;

            if toggle.clicked() {
                output.toggled = Some(toggle_theme(self.store));
            }

            // open_in_new_tab maps to a fresh browsing context; the native
            // handler passes neither referrer nor opener.
            let link = ui
                .add(
                    egui::Hyperlink::from_label_and_url(
                        RichText::new("GitHub").color(self.theme.text_muted),
                        self.repository_url,
                    )
                    .open_in_new_tab(true),
                )
                .on_hover_text(self.repository_url);
            link.widget_info(|| WidgetInfo::labeled(WidgetType::Link, true, REPOSITORY_LABEL));
            output.controls += 1;
        });

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_blocks_only_first_pass() {
        let mut gate = MountGate::new();
        assert!(!gate.pass());
        assert!(gate.is_mounted());
        assert!(gate.pass());
        assert!(gate.pass());
    }
}
