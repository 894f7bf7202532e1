//! Censo Dashboard - School Census Microdata Dashboard
//!
//! Usage: censo-dashboard [SOURCE]
//! SOURCE is a path or http(s) URL of the semicolon-separated census file.

use anyhow::{Context, Result};
use censo_dashboard::config::DashboardConfig;
use censo_dashboard::data::DataSource;
use censo_dashboard::geo::RegionLookup;
use censo_dashboard::gui::DashboardApp;
use eframe::egui;

/// Optional override for the region boundary asset
const REGIONS_ENV_VAR: &str = "CENSO_DASHBOARD_REGIONS";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_env().context("Invalid dashboard configuration")?;
    let regions = match std::env::var_os(REGIONS_ENV_VAR) {
        Some(path) => RegionLookup::from_file(std::path::Path::new(&path))
            .with_context(|| format!("Invalid region asset {:?}", path))?,
        None => RegionLookup::builtin(),
    };

    let source = std::env::args()
        .nth(1)
        .map(|raw| DataSource::parse(&raw))
        .or_else(|| {
            let default = DataSource::parse(&config.source);
            match &default {
                DataSource::Path(path) if !path.exists() => {
                    log::info!("{} not found, waiting for a file to be chosen", path.display());
                    None
                }
                _ => Some(default),
            }
        });

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title(config.title.as_str()),
        ..Default::default()
    };

    // Run the application
    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config, regions, source)))),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard window failed: {}", e))
}
