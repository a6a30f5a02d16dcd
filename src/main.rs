mod app;

use std::str::FromStr;

use log::{LevelFilter, info};

fn main() -> eframe::Result<()> {
    let settings = sanuml::settings::load_or_default();

    let level = LevelFilter::from_str(&settings.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            settings.log_level
        );
        LevelFilter::Warn
    });
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::default())
        .init();
    info!(log_level:? = level; "Starting sanuml");

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Class Diagrams",
        native_options,
        Box::new(|_cc| Ok(Box::new(app::DiagramApp::new(settings)))),
    )
}
