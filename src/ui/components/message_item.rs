//! Message item component
//!
//! Renders one chat message with its contextual actions and drives the
//! speech playback of the message it shows.

use crate::messages::ChatMessage;
use crate::speech::{PlaybackInputs, SpeechPlayback, SpeechPolicy};
use crate::ui::markdown::MarkdownView;
use crate::ui::theme::Theme;
use egui::{self, Align, Layout, RichText, Vec2, WidgetInfo, WidgetType};

pub const REFRESH_LABEL: &str = "Regenerate response";
pub const REMOVE_LABEL: &str = "Remove message";
pub const SPEAK_LABEL: &str = "Read aloud";
pub const STOP_LABEL: &str = "Stop reading";

/// Which action buttons a message shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageActions {
    pub refresh: bool,
    pub remove: bool,
    pub speak: bool,
}

impl MessageActions {
    pub fn for_message(
        is_last: bool,
        is_user: bool,
        is_loading: bool,
        policy: SpeechPolicy,
    ) -> Self {
        let available = is_last && !is_loading;
        Self {
            refresh: available && is_user,
            remove: available,
            speak: available && !is_user && policy == SpeechPolicy::Manual,
        }
    }

    pub fn any(&self) -> bool {
        self.refresh || self.remove || self.speak
    }
}

type Callback<'a> = Box<dyn FnMut() + 'a>;

/// A single message row
pub struct MessageItem<'a> {
    message: &'a ChatMessage,
    theme: &'a Theme,
    markdown: &'a mut MarkdownView,
    assistant_name: &'a str,
    is_last: bool,
    is_loading: bool,
    policy: SpeechPolicy,
    playback: Option<&'a mut SpeechPlayback>,
    on_refresh: Option<Callback<'a>>,
    on_remove: Option<Callback<'a>>,
}

impl<'a> MessageItem<'a> {
    pub fn new(message: &'a ChatMessage, theme: &'a Theme, markdown: &'a mut MarkdownView) -> Self {
        Self {
            message,
            theme,
            markdown,
            assistant_name: "Assistant",
            is_last: false,
            is_loading: false,
            policy: SpeechPolicy::default(),
            playback: None,
            on_refresh: None,
            on_remove: None,
        }
    }

    /// Name shown next to assistant messages
    pub fn assistant_name(mut self, name: &'a str) -> Self {
        self.assistant_name = name;
        self
    }

    pub fn last_message(mut self, is_last: bool) -> Self {
        self.is_last = is_last;
        self
    }

    /// A reply is currently being generated
    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    pub fn policy(mut self, policy: SpeechPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach the speech lifecycle for this message
    pub fn playback(mut self, playback: &'a mut SpeechPlayback) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn on_refresh(mut self, callback: impl FnMut() + 'a) -> Self {
        self.on_refresh = Some(Box::new(callback));
        self
    }

    pub fn on_remove(mut self, callback: impl FnMut() + 'a) -> Self {
        self.on_remove = Some(Box::new(callback));
        self
    }

    pub fn show(mut self, ui: &mut egui::Ui) -> egui::Response {
        let is_user = self.message.is_user();

        if let Some(playback) = self.playback.as_deref_mut() {
            playback.reconcile(
                PlaybackInputs::new(self.message, self.is_last, self.is_loading),
                self.policy,
            );
            if playback.is_active() {
                ui.ctx().request_repaint();
            }
        }

        let actions =
            MessageActions::for_message(self.is_last, is_user, self.is_loading, self.policy);
        let fill = if is_user {
            self.theme.user_row
        } else {
            self.theme.assistant_row
        };

        egui::Frame::none()
            .fill(fill)
            .inner_margin(egui::Margin::symmetric(self.theme.spacing, self.theme.spacing))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());

                ui.horizontal(|ui| {
                    let (icon, name) = if is_user {
                        ("👤", "You")
                    } else {
                        ("🤖", self.assistant_name)
                    };
                    ui.label(RichText::new(icon).size(16.0));
                    ui.label(
                        RichText::new(name)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    if actions.any() {
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            ui.spacing_mut().item_spacing = Vec2::splat(self.theme.spacing);
                            self.show_actions(ui, actions);
                        });
                    }
                });

                ui.add_space(self.theme.spacing_sm);
                self.markdown.show(ui, &self.message.content);
            })
            .response
    }

    fn show_actions(&mut self, ui: &mut egui::Ui, actions: MessageActions) {
        // Laid out right to left
        if actions.remove && icon_button(ui, "🗑", REMOVE_LABEL, self.theme.text_muted) {
            if let Some(callback) = self.on_remove.as_mut() {
                callback();
            }
        }

        if actions.refresh && icon_button(ui, "🔄", REFRESH_LABEL, self.theme.text_muted) {
            if let Some(callback) = self.on_refresh.as_mut() {
                callback();
            }
        }

        if actions.speak {
            let audible = self.playback.as_deref().is_some_and(|p| p.is_audible());
            let active = self.playback.as_deref().is_some_and(|p| p.is_active());
            let (label, color) = if active {
                (STOP_LABEL, self.theme.success)
            } else {
                (SPEAK_LABEL, self.theme.text_muted)
            };
            let color = if active && !audible {
                color.gamma_multiply(0.6)
            } else {
                color
            };

            if icon_button(ui, "🔊", label, color) {
                if let Some(playback) = self.playback.as_deref_mut() {
                    playback.toggle(&self.message.content);
                }
            }
        }
    }
}

/// Small borderless icon button with an accessible label. Returns true when
/// clicked.
fn icon_button(ui: &mut egui::Ui, icon: &str, label: &str, color: egui::Color32) -> bool {
    let response = ui
        .add(egui::Button::new(RichText::new(icon).size(14.0).color(color)).frame(false))
        .on_hover_text(label);
    response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, label));
    response.clicked()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_last_has_no_actions() {
        for is_user in [true, false] {
            for loading in [true, false] {
                for policy in [SpeechPolicy::Manual, SpeechPolicy::Automatic] {
                    let actions = MessageActions::for_message(false, is_user, loading, policy);
                    assert!(!actions.any());
                }
            }
        }
    }

    #[test]
    fn test_loading_has_no_actions() {
        for is_last in [true, false] {
            for is_user in [true, false] {
                let actions =
                    MessageActions::for_message(is_last, is_user, true, SpeechPolicy::Manual);
                assert!(!actions.any());
            }
        }
    }

    #[test]
    fn test_last_user_message_actions() {
        let actions = MessageActions::for_message(true, true, false, SpeechPolicy::Manual);
        assert_eq!(
            actions,
            MessageActions {
                refresh: true,
                remove: true,
                speak: false
            }
        );
    }

    #[test]
    fn test_last_assistant_message_actions() {
        let manual = MessageActions::for_message(true, false, false, SpeechPolicy::Manual);
        assert!(manual.speak && manual.remove && !manual.refresh);

        let automatic = MessageActions::for_message(true, false, false, SpeechPolicy::Automatic);
        assert!(!automatic.speak && automatic.remove && !automatic.refresh);
    }
}
