use serde::Serialize;

use crate::theme::Theme;

pub const STANDARD_STYLE: &str = "mapbox://styles/mapbox/standard";

/// Environment variable the viewer reads the access token from.
pub const TOKEN_ENV: &str = "PARKING_MAP_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

/// Seattle Center.
pub const INITIAL_VIEW: ViewState = ViewState {
    longitude: -122.3519,
    latitude: 47.6223,
    zoom: 16.0,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAvailability {
    Ready,
    /// No access token; only the basemap is lost, the spot feed still runs.
    TokenMissing { hint: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub initial_view: ViewState,
    pub style: String,
    pub access_token: Option<String>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_view: INITIAL_VIEW,
            style: STANDARD_STYLE.to_string(),
            access_token: None,
        }
    }
}

impl MapSettings {
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            access_token: token.filter(|t| !t.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn availability(&self) -> MapAvailability {
        match &self.access_token {
            Some(_) => MapAvailability::Ready,
            None => MapAvailability::TokenMissing {
                hint: format!("set {TOKEN_ENV}=<your access token> and restart"),
            },
        }
    }

    /// `(property, value)` to apply on the basemap when the theme changes,
    /// so the style itself never has to be swapped.
    pub fn basemap_preset(&self, theme: Theme) -> (&'static str, &'static str) {
        ("lightPreset", theme.light_preset())
    }
}
