use feed::{BootstrapState, ChannelState, FeedHealth};
use mapview::{LEGEND, Popup, Theme, markers_for, status_label};
use spots::{SpotStatus, SpotView};

fn ansi(status: SpotStatus) -> &'static str {
    match status {
        SpotStatus::Available => "\x1b[32m",
        SpotStatus::Soon => "\x1b[33m",
        SpotStatus::Occupied => "\x1b[31m",
    }
}

const RESET: &str = "\x1b[0m";

/// One frame of the marker list.
pub fn render_view(view: &SpotView, theme: Theme, color: bool) -> String {
    let markers = markers_for(view);
    let mut out = format!(
        "-- rev {} | {} shown, {} hidden | theme {} ({}) --\n",
        view.revision,
        markers.len(),
        view.suppressed.len(),
        theme,
        theme.light_preset()
    );
    for m in &markers {
        let (on, off) = if color { (ansi(m.status), RESET) } else { ("", "") };
        out.push_str(&format!(
            "{on}\u{25cf}{off} {:<6} {:<17} {:>9.5},{:>10.5}  {}\n",
            m.id,
            status_label(m.status),
            m.lat,
            m.lng,
            m.color
        ));
    }
    out
}

/// Popup content for every visible spot, as indented text or as the HTML
/// fragment a map popup would show.
pub fn render_details(view: &SpotView, html: bool) -> String {
    let mut out = String::new();
    for spot in view.visible() {
        let popup = Popup::for_spot(spot);
        if html {
            out.push_str(&popup.to_html());
            out.push('\n');
            continue;
        }
        out.push_str(&format!(
            "  {}: {} ({}% confidence), updated {}\n",
            popup.heading, popup.status, popup.confidence_pct, popup.updated_at
        ));
        if let Some(camera) = &popup.camera_id {
            out.push_str(&format!("    camera {camera}\n"));
        }
        out.push_str(&format!("    {}\n", popup.navigate_url));
    }
    out
}

pub fn render_legend() -> String {
    LEGEND
        .iter()
        .map(|e| format!("{} {}", e.color, e.label))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_health(health: &FeedHealth) -> String {
    let bootstrap = match &health.bootstrap {
        BootstrapState::Pending => "loading".to_string(),
        BootstrapState::Loaded { count } => format!("{count} spots loaded"),
        BootstrapState::Failed { reason } => format!("initial load failed ({reason})"),
    };
    let channel = match &health.channel {
        ChannelState::NotStarted => "not started".to_string(),
        ChannelState::Connecting => "connecting".to_string(),
        ChannelState::Open => "live".to_string(),
        ChannelState::Closed => "closed, updates stopped".to_string(),
        ChannelState::Failed { reason } => format!("unavailable ({reason})"),
    };
    format!("feed: {bootstrap}; updates: {channel}")
}
