use serde::Deserialize;

fn default_catalog_interval() -> u64 {
    100
}

fn default_sync_debounce() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(rename = "CATALOG_SERVER")]
    pub catalog_server: String,
    /// Minimum gap between outbound catalog calls, in milliseconds.
    #[serde(rename = "CATALOG_INTERVAL_MS", default = "default_catalog_interval")]
    pub catalog_interval_ms: u64,
    /// Quiet window after a local mutation before a sync write goes out.
    #[serde(rename = "SYNC_DEBOUNCE_MS", default = "default_sync_debounce")]
    pub sync_debounce_ms: u64,
}

impl Settings {
    /// Reads `Settings.toml` (optional) and environment variables, the
    /// environment taking precedence.
    pub fn load() -> Result<Settings, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("Settings").required(false))
            .add_source(config::Environment::default())
            .build()?;

        return settings.try_deserialize::<Settings>();
    }
}
