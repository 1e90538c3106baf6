//! Input bar component
//!
//! Provides the text input and send control.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2, WidgetInfo, WidgetType};

pub const SEND_LABEL: &str = "Send message";

/// Input bar component for text input
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_text_input(ui);

                    ui.add_space(self.theme.spacing_sm);

                    self.show_send_button(ui);
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let is_loading = self.state.is_loading;

        // Reserve space for the send button
        let available_width = ui.available_width() - 60.0;

        let hint = if is_loading {
            "Waiting for reply..."
        } else {
            "Type a message..."
        };

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text(hint)
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0));

        let response = ui.add_enabled(!is_loading, text_edit);

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = self.state.can_send();

        let button_color = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding)
            .fill(button_color);

        let response = ui
            .add_enabled(can_send, button)
            .on_hover_text("Send message (Enter)");
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, can_send, SEND_LABEL));

        if response.clicked() {
            self.state.send_message();
        }
    }
}
