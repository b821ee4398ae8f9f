use std::sync::OnceLock;

use models::settings::Settings;

pub mod catalog;
pub mod game;
pub mod models;
pub mod room;
pub mod store;
pub mod sync;
pub mod utils;

/// Process-wide settings, initialized once by the embedding application.
pub static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Loads the settings from `Settings.toml`/environment and stores them in
/// the global cell. Returns the loaded settings, or the previously stored
/// ones if initialization already happened.
pub fn init_settings() -> Result<&'static Settings, config::ConfigError> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }

    let settings = Settings::load()?;
    Ok(SETTINGS.get_or_init(|| settings))
}
