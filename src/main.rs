mod app;
mod color;
mod state;
mod ui;

use app::DashboardApp;
use eframe::egui;
use edu_dashboard::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("Ignoring dashboard config: {e}");
        DashboardConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Education Insights Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
}
