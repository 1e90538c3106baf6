//! Theme and styling
//!
//! Colours for the two supported modes, plus the store the utility bar
//! toggles through.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// The two recognised theme values, `"light"` and `"dark"`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("unknown theme {other:?}")),
        }
    }
}

/// Read/write access to the current theme
pub trait ThemeStore {
    fn theme(&self) -> ThemeMode;
    fn set_theme(&mut self, mode: ThemeMode);
}

/// Flip between light and dark. Returns the new mode.
pub fn toggle_theme(store: &mut dyn ThemeStore) -> ThemeMode {
    let next = store.theme().toggled();
    store.set_theme(next);
    next
}

/// Theme store backed by the egui context
///
/// Changes are recorded immediately and pushed to egui on the next
/// [`ThemeState::apply_if_changed`].
#[derive(Clone, Debug)]
pub struct ThemeState {
    mode: ThemeMode,
    palette: Theme,
    dirty: bool,
}

impl ThemeState {
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            mode,
            palette: Theme::for_mode(mode),
            dirty: true,
        }
    }

    pub fn palette(&self) -> &Theme {
        &self.palette
    }

    /// Apply pending changes to egui
    pub fn apply_if_changed(&mut self, ctx: &egui::Context) {
        if self.dirty {
            self.palette.apply(ctx);
            self.dirty = false;
        }
    }
}

impl ThemeStore for ThemeState {
    fn theme(&self) -> ThemeMode {
        self.mode
    }

    fn set_theme(&mut self, mode: ThemeMode) {
        if mode != self.mode {
            info!("[THEME] Switching to {}", mode);
        }
        self.mode = mode;
        self.palette = Theme::for_mode(mode);
        self.dirty = true;
    }
}

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    pub mode: ThemeMode,

    /// Primary accent color
    pub primary: Color32,
    /// Speaking indicator
    pub success: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Message backgrounds
    pub user_row: Color32,
    pub assistant_row: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    /// Create a dark theme
    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,

            primary: Color32::from_rgb(99, 102, 241), // Indigo
            success: Color32::from_rgb(34, 197, 94),  // Green

            bg_primary: Color32::from_rgb(12, 10, 9),
            bg_secondary: Color32::from_rgb(28, 25, 23),
            bg_tertiary: Color32::from_rgb(41, 37, 36),

            text_primary: Color32::from_rgb(250, 250, 249),
            text_secondary: Color32::from_rgb(214, 211, 209),
            text_muted: Color32::from_rgb(168, 162, 158),

            user_row: Color32::from_rgb(12, 10, 9),
            assistant_row: Color32::from_rgb(25, 26, 48), // primary at ~10%

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Create a light theme
    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,

            primary: Color32::from_rgb(79, 70, 229),
            success: Color32::from_rgb(22, 163, 74),

            bg_primary: Color32::from_rgb(255, 255, 255),
            bg_secondary: Color32::from_rgb(245, 245, 244),
            bg_tertiary: Color32::from_rgb(231, 229, 228),

            text_primary: Color32::from_rgb(28, 25, 23),
            text_secondary: Color32::from_rgb(68, 64, 60),
            text_muted: Color32::from_rgb(120, 113, 108),

            user_row: Color32::from_rgb(255, 255, 255),
            assistant_row: Color32::from_rgb(237, 236, 252),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let (egui_theme, mut visuals) = match self.mode {
            ThemeMode::Light => (egui::Theme::Light, Visuals::light()),
            ThemeMode::Dark => (egui::Theme::Dark, Visuals::dark()),
        };

        // Pin the mode so the system preference does not override it
        ctx.set_theme(egui_theme);

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;

        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);
        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.weak_bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.hyperlink_color = self.primary;
        visuals.window_rounding = self.card_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing_sm, self.spacing_sm / 2.0);
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(13.0, FontFamily::Monospace),
        );
        ctx.set_style(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_two_cycle() {
        let mut store = ThemeState::new(ThemeMode::Light);

        assert_eq!(toggle_theme(&mut store), ThemeMode::Dark);
        assert_eq!(store.theme().to_string(), "dark");

        assert_eq!(toggle_theme(&mut store), ThemeMode::Light);
        assert_eq!(store.theme().to_string(), "light");
    }

    #[test]
    fn test_palette_follows_mode() {
        let mut store = ThemeState::new(ThemeMode::Dark);
        store.set_theme(ThemeMode::Light);
        assert_eq!(store.palette().mode, ThemeMode::Light);
    }

    #[test]
    fn test_parse_theme_names() {
        assert_eq!("light".parse::<ThemeMode>(), Ok(ThemeMode::Light));
        assert_eq!("dark".parse::<ThemeMode>(), Ok(ThemeMode::Dark));
        assert!("system".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_apply_sets_visuals() {
        let ctx = egui::Context::default();
        let mut store = ThemeState::new(ThemeMode::Light);
        store.apply_if_changed(&ctx);
        assert!(!ctx.style().visuals.dark_mode);

        toggle_theme(&mut store);
        store.apply_if_changed(&ctx);
        assert!(ctx.style().visuals.dark_mode);
    }

    #[test]
    fn test_spacing_scale_is_ordered() {
        for palette in [Theme::light(), Theme::dark()] {
            assert!(palette.spacing_sm < palette.spacing);
            assert!(palette.spacing < palette.spacing_lg);
        }
    }
}
