use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Concrete scheme after `System` is resolved against the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" | "auto" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Display settings passed down to every card.
///
/// Values are immutable: every change produces a new preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreference {
    theme: Theme,
}

impl DisplayPreference {
    pub fn new(theme: Theme) -> Self {
        DisplayPreference { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        DisplayPreference { theme }
    }

    /// Dark becomes light; light and system both become dark.
    pub fn toggled(self) -> Self {
        let theme = match self.theme {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::System => Theme::Dark,
        };
        self.with_theme(theme)
    }

    pub fn resolve(&self, system_prefers_dark: bool) -> ResolvedTheme {
        match self.theme {
            Theme::Light => ResolvedTheme::Light,
            Theme::Dark => ResolvedTheme::Dark,
            Theme::System if system_prefers_dark => ResolvedTheme::Dark,
            Theme::System => ResolvedTheme::Light,
        }
    }
}
