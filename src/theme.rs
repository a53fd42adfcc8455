use std::fs;
use std::io;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::{debug, warn};

pub const THEME_FILE_NAME: &str = "theme.toml";

/// Colours for everything printed to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub text_fg: Color,
    pub muted_fg: Color,
    pub prompt_fg: Color,
    pub command_fg: Color,
    pub success_fg: Color,
    pub warning_fg: Color,
    pub error_fg: Color,
    pub spinner_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(150, 150, 150),
            prompt_fg: Color::Rgb(120, 180, 255),
            command_fg: Color::Rgb(255, 200, 90),
            success_fg: Color::Rgb(110, 200, 120),
            warning_fg: Color::Rgb(230, 180, 60),
            error_fg: Color::Rgb(240, 90, 90),
            spinner_fg: Color::Rgb(185, 185, 185),
        }
    }
}

impl Theme {
    /// A missing file means defaults; an unreadable or invalid one is logged
    /// and also falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    warn!(path = %path_ref.display(), %err, "invalid theme file, using defaults");
                    Self::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path_ref.display(), "no theme file, using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path_ref.display(), %err, "unreadable theme file, using defaults");
                Self::default()
            }
        }
    }

    /// Colours left out of the file keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let defaults = Self::default();
        let colors = cfg.colors;
        let pick = |value: Option<RgbToml>, fallback: Color| {
            value.map(|rgb| rgb.to_color()).unwrap_or(fallback)
        };
        Ok(Self {
            text_fg: pick(colors.text_fg, defaults.text_fg),
            muted_fg: pick(colors.muted_fg, defaults.muted_fg),
            prompt_fg: pick(colors.prompt_fg, defaults.prompt_fg),
            command_fg: pick(colors.command_fg, defaults.command_fg),
            success_fg: pick(colors.success_fg, defaults.success_fg),
            warning_fg: pick(colors.warning_fg, defaults.warning_fg),
            error_fg: pick(colors.error_fg, defaults.error_fg),
            spinner_fg: pick(colors.spinner_fg, defaults.spinner_fg),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    #[serde(default)]
    colors: ThemeColorsToml,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeColorsToml {
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    prompt_fg: Option<RgbToml>,
    command_fg: Option<RgbToml>,
    success_fg: Option<RgbToml>,
    warning_fg: Option<RgbToml>,
    error_fg: Option<RgbToml>,
    spinner_fg: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
