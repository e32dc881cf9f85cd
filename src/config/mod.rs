// Configuration module entry point
// Runtime settings, the controller definitions file store and shared state

mod state;
pub mod store;
mod types;

use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use store::{ConfigFileStore, KeyCheck, StoreError};
pub use types::{
    AccessLogFormat, ErrorStatusMode, HttpSettings, LoggingSettings, ServerSettings, Settings,
    SshSettings,
};

/// Prefix of environment variables overriding settings,
/// e.g. `STUDIOCONTROLLER_SSH__TIMEOUT_SECS=10`
pub const ENV_PREFIX: &str = "STUDIOCONTROLLER";

impl Settings {
    /// Load settings from the given file path (extension optional, file optional),
    /// then environment overrides, on top of the built-in defaults
    pub fn load_from(settings_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.default_port", 10_000)?
            .set_default("server.shutdown_timeout_secs", 2)?
            .set_default("http.server_name", "studiocontroller")?
            .set_default("http.error_status", "legacy")?
            .set_default("http.static_root", ".")?
            .set_default("http.index_files", vec!["index.html"])?
            .set_default("ssh.program", "ssh")?
            .set_default("ssh.timeout_secs", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.log_file", "studiocontroller_log.txt")?
            .set_default("logging.max_log_size_mb", 1)?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .add_source(config::File::with_name(settings_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub const fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh.timeout_secs)
    }

    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    pub const fn max_log_size_bytes(&self) -> u64 {
        self.logging.max_log_size_mb * 1024 * 1024
    }
}
