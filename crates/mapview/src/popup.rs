use spots::{SpotRecord, SpotStatus};

/// Human-readable status for popups.
pub fn status_label(status: SpotStatus) -> &'static str {
    match status {
        SpotStatus::Available => "Available",
        SpotStatus::Soon => "Potentially soon",
        SpotStatus::Occupied => "Occupied",
    }
}

/// Directions link to a spot.
pub fn navigate_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps/dir/?api=1&destination={lat},{lng}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub heading: String,
    pub status: &'static str,
    pub confidence_pct: u8,
    pub updated_at: String,
    pub camera_id: Option<String>,
    pub navigate_url: String,
}

impl Popup {
    pub fn for_spot(spot: &SpotRecord) -> Self {
        Self {
            heading: format!("Spot {}", spot.id),
            status: status_label(spot.status),
            confidence_pct: (spot.confidence.clamp(0.0, 1.0) * 100.0).round() as u8,
            updated_at: spot.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            camera_id: spot.camera_id.clone(),
            navigate_url: navigate_url(spot.lat, spot.lng),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<div class=\"spot-popup\">");
        html.push_str(&format!("<h3>{}</h3>", escape(&self.heading)));
        html.push_str(&format!(
            "<p>{} ({}% confidence)</p>",
            self.status, self.confidence_pct
        ));
        html.push_str(&format!("<p>Updated {}</p>", escape(&self.updated_at)));
        if let Some(camera) = &self.camera_id {
            html.push_str(&format!("<p>Camera {}</p>", escape(camera)));
        }
        html.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">Navigate</a>",
            escape(&self.navigate_url)
        ));
        html.push_str("</div>");
        html
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
