mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use feed::{ConfigError, FeedConfig, HttpTransport, SessionOptions, spawn_session};
use mapview::{FilePreferenceStore, MapAvailability, MapSettings, ThemeController};
use spots::StaleTimerPolicy;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Live parking spot viewer for the terminal")]
struct Args {
    /// Backend base URL (overrides PARKING_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Grace window before an occupied spot is hidden, in ms (overrides PARKING_GRACE_MS)
    #[arg(long)]
    grace_ms: Option<u64>,

    /// `cancel` or `legacy` (overrides PARKING_STALE_TIMERS)
    #[arg(long)]
    stale_timers: Option<String>,

    /// Preference file holding the theme
    #[arg(long, default_value = "parking-viewer.json")]
    prefs: PathBuf,

    /// Flip the stored light/dark theme before starting
    #[arg(long)]
    toggle_theme: bool,

    /// System preference used when no theme is stored
    #[arg(long)]
    prefers_dark: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Print popup details under each frame
    #[arg(long)]
    details: bool,

    /// Print popup details as HTML (implies --details)
    #[arg(long)]
    html: bool,
}

fn feed_config(args: &Args) -> Result<FeedConfig, ConfigError> {
    let mut cfg = FeedConfig::from_env()?;
    if let Some(url) = &args.api_url {
        cfg = cfg.with_api_url(url.clone())?;
    }
    if let Some(ms) = args.grace_ms {
        cfg.grace = Duration::from_millis(ms);
    }
    if let Some(raw) = &args.stale_timers {
        cfg.stale_timers =
            StaleTimerPolicy::parse(raw).ok_or_else(|| ConfigError::InvalidPolicy(raw.clone()))?;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = feed_config(&args)?;

    let mut theme = ThemeController::load(FilePreferenceStore::open(&args.prefs)?, args.prefers_dark);
    if args.toggle_theme {
        if let Err(e) = theme.toggle() {
            warn!("theme not saved: {e}");
        }
    }

    let map = MapSettings::with_token(cfg.map_token.clone());
    match map.availability() {
        MapAvailability::Ready => {
            let (prop, preset) = map.basemap_preset(theme.theme());
            info!("basemap {} with {prop}={preset}", map.style);
        }
        MapAvailability::TokenMissing { hint } => warn!("basemap disabled: {hint}"),
    }

    info!(
        "following {} (grace {:?}, stale timers {:?})",
        cfg.api_url, cfg.grace, cfg.stale_timers
    );
    println!("{}", render::render_legend());

    let transport = Arc::new(HttpTransport::new(&cfg));
    let handle = spawn_session(transport, SessionOptions::from(&cfg));
    let mut view = handle.view();
    let mut health = handle.health();
    let color = !args.no_color;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                print!("{}", render::render_view(&snapshot, theme.theme(), color));
                if args.details || args.html {
                    print!("{}", render::render_details(&snapshot, args.html));
                }
            }
            changed = health.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = render::render_health(&health.borrow_and_update());
                println!("{line}");
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
