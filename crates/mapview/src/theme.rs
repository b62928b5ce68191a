use tracing::{debug, warn};

use crate::preferences::{PreferenceError, PreferenceStore};

/// Preference key holding `light` or `dark`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Basemap light preset of the standard style.
    pub fn light_preset(&self) -> &'static str {
        match self {
            Theme::Light => "day",
            Theme::Dark => "night",
        }
    }

    pub fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme plus the store it is persisted to.
///
/// Passed explicitly to whatever renders; there is no global theme.
pub struct ThemeController<S: PreferenceStore> {
    theme: Theme,
    store: S,
}

impl<S: PreferenceStore> ThemeController<S> {
    /// Stored theme, or the system preference when none is stored or the
    /// stored value cannot be read.
    pub fn load(store: S, prefers_dark: bool) -> Self {
        let fallback = Theme::from_system(prefers_dark);
        let theme = match store.get(THEME_KEY) {
            Ok(Some(v)) => Theme::parse(&v).unwrap_or_else(|| {
                debug!("unrecognized stored theme {v:?}, using {fallback}");
                fallback
            }),
            Ok(None) => fallback,
            Err(e) => {
                warn!("theme preference unreadable: {e}");
                fallback
            }
        };
        Self { theme, store }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and persist it. The in-memory theme flips even when
    /// persisting fails.
    pub fn toggle(&mut self) -> Result<Theme, PreferenceError> {
        self.set(self.theme.toggled())
    }

    pub fn set(&mut self, theme: Theme) -> Result<Theme, PreferenceError> {
        self.theme = theme;
        self.store.set(THEME_KEY, theme.as_str())?;
        Ok(theme)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
