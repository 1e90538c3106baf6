//! Main application struct and eframe integration
//!
//! This module contains the `ChatterApp` that implements `eframe::App`.

use crate::config::ChatterConfig;
use crate::messages::ChatMessage;
use crate::responder::{EchoResponder, ReplyEvent, Responder};
use crate::speech::{self, SharedSpeech, SpeechPlayback, SpeechPolicy};
use crate::ui::components::{InputBar, MessageItem, MountGate, UtilityBar};
use crate::ui::markdown::MarkdownView;
use crate::ui::state::AppState;
use crate::ui::theme::{Theme, ThemeMode, ThemeState, ThemeStore};
use crossbeam_channel::Receiver;
use egui::{self, CentralPanel, RichText, ScrollArea, TopBottomPanel};
use std::time::Duration;
use tracing::info;

/// Main chat application
pub struct ChatterApp {
    /// Conversation state
    state: AppState,
    /// Current theme and its palette
    theme: ThemeState,
    /// Speech lifecycle of the last message
    playback: SpeechPlayback,
    policy: SpeechPolicy,
    markdown: MarkdownView,
    utility_gate: MountGate,
    assistant_name: String,
    repository_url: String,
}

impl ChatterApp {
    /// Assemble the app from its collaborators
    pub fn new(
        config: &ChatterConfig,
        speech: Option<SharedSpeech>,
        responder: Box<dyn Responder>,
        replies_rx: Receiver<ReplyEvent>,
    ) -> Self {
        Self {
            state: AppState::new(responder, replies_rx),
            theme: ThemeState::new(config.ui.theme),
            playback: SpeechPlayback::new(speech, config.speech.lang.as_str()),
            policy: config.speech.policy,
            markdown: MarkdownView::new(),
            utility_gate: MountGate::new(),
            assistant_name: config.chat.assistant_name.clone(),
            repository_url: config.ui.repository_url.clone(),
        }
    }

    /// App wired to the host speech backend and the echo responder
    pub fn from_config(config: &ChatterConfig) -> Self {
        let speech = speech::detect(&config.speech);
        let (responder, replies_rx) =
            EchoResponder::new(Duration::from_millis(config.chat.reply_delay_ms));

        info!(
            "[CHAT] Starting (speech: {}, policy: {:?})",
            if speech.is_some() { "available" } else { "unavailable" },
            config.speech.policy
        );

        Self::new(config, speech, Box::new(responder), replies_rx)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn playback(&self) -> &SpeechPlayback {
        &self.playback
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme.theme()
    }

    /// Render one frame
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.state.poll_events();
        self.theme.apply_if_changed(ctx);

        let palette = self.theme.palette().clone();

        self.show_header(ctx, &palette);
        // Bottom panels stack upwards in the order they are shown
        self.show_utility_bar(ctx, &palette);
        self.show_input_area(ctx, &palette);
        self.show_content(ctx, &palette);

        if self.state.is_loading {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }

    /// Show the top header bar
    fn show_header(&mut self, ctx: &egui::Context, palette: &Theme) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(palette.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Chatter")
                            .size(20.0)
                            .strong()
                            .color(palette.text_primary),
                    );

                    ui.label(
                        RichText::new(format!("with {}", self.assistant_name))
                            .size(14.0)
                            .color(palette.text_muted),
                    );
                });
            });
    }

    /// Show the utility bar along the bottom edge
    fn show_utility_bar(&mut self, ctx: &egui::Context, palette: &Theme) {
        TopBottomPanel::bottom("utility_bar")
            .frame(
                egui::Frame::none()
                    .fill(palette.bg_secondary)
                    .inner_margin(palette.spacing_sm),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let output = UtilityBar::new(
                        &mut self.utility_gate,
                        &mut self.theme,
                        palette,
                        &self.repository_url,
                    )
                    .show(ui);

                    if output.toggled.is_some() {
                        ctx.request_repaint();
                    }
                });
            });
    }

    /// Show the bottom input area
    fn show_input_area(&mut self, ctx: &egui::Context, palette: &Theme) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(palette.bg_primary).inner_margin(palette.spacing))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    if let Some(error) = &self.state.last_error {
                        ui.label(
                            RichText::new(format!("⚠ {error}"))
                                .size(12.0)
                                .color(egui::Color32::from_rgb(239, 68, 68)),
                        );
                        ui.add_space(palette.spacing_sm);
                    }

                    InputBar::new(&mut self.state, palette).show(ui);
                });
            });
    }

    /// Show the main content area (message list)
    fn show_content(&mut self, ctx: &egui::Context, palette: &Theme) {
        let messages = self.state.history();

        CentralPanel::default()
            .frame(egui::Frame::none().fill(palette.bg_primary))
            .show(ctx, |ui| {
                if messages.is_empty() {
                    // The last message went away, so its speech does too
                    self.playback.unmount();
                    show_welcome(ui, palette, &self.assistant_name);
                    return;
                }

                let (refresh, remove) = self.show_messages(ui, palette, &messages);

                if refresh {
                    self.state.refresh();
                } else if remove {
                    self.state.remove_last();
                }
            });
    }

    /// Returns whether refresh or remove was requested
    fn show_messages(
        &mut self,
        ui: &mut egui::Ui,
        palette: &Theme,
        messages: &[ChatMessage],
    ) -> (bool, bool) {
        let mut refresh = false;
        let mut remove = false;
        let last_index = messages.len() - 1;
        let is_loading = self.state.is_loading;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for (index, message) in messages.iter().enumerate() {
                    let is_last = index == last_index;

                    let mut item = MessageItem::new(message, palette, &mut self.markdown)
                        .assistant_name(&self.assistant_name)
                        .last_message(is_last)
                        .loading(is_loading)
                        .policy(self.policy)
                        .on_refresh(|| refresh = true)
                        .on_remove(|| remove = true);

                    if is_last {
                        item = item.playback(&mut self.playback);
                    }

                    item.show(ui);
                }

                if is_loading {
                    ui.add_space(palette.spacing_sm);
                    ui.horizontal(|ui| {
                        ui.add_space(palette.spacing);
                        ui.spinner();
                        ui.label(
                            RichText::new(format!("{} is typing...", self.assistant_name))
                                .color(palette.text_muted),
                        );
                    });
                }
            });

        (refresh, remove)
    }
}

fn show_welcome(ui: &mut egui::Ui, palette: &Theme, assistant_name: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.label(RichText::new("💬").size(48.0));
        ui.add_space(palette.spacing_lg);
        ui.label(
            RichText::new(format!("Start a conversation with {assistant_name}"))
                .size(18.0)
                .color(palette.text_secondary),
        );
        ui.add_space(palette.spacing_sm);
        ui.label(
            RichText::new("Replies can be read aloud when speech synthesis is available")
                .size(13.0)
                .color(palette.text_muted),
        );
    });
}

impl eframe::App for ChatterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.playback.unmount();
        info!("[CHAT] Shutting down");
    }
}
