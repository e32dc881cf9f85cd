// Configuration types module
// Runtime settings for the server, SSH runner and logging

use serde::Deserialize;

/// Main settings structure
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub http: HttpSettings,
    pub ssh: SshSettings,
    pub logging: LoggingSettings,
}

/// Server runtime settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
    /// Port used when `--public-http` is not given
    pub default_port: u16,
    /// How long shutdown waits for open connections
    pub shutdown_timeout_secs: u64,
}

/// HTTP dispatch settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    /// Name reported in error diagnostics
    pub server_name: String,
    pub error_status: ErrorStatusMode,
    /// Directory the static fallback reads from
    pub static_root: String,
    /// Zip archive searched before `static_root`
    #[serde(default)]
    pub archive: Option<String>,
    pub index_files: Vec<String>,
}

/// How dispatch failures map to HTTP status codes
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusMode {
    /// Every failure is a 404
    #[default]
    Legacy,
    /// 404 for unknown paths, 400 for bad arguments, 500 for handler failures
    Distinct,
}

/// SSH command runner settings
#[derive(Debug, Deserialize, Clone)]
pub struct SshSettings {
    /// Client binary to execute
    pub program: String,
    pub timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
    /// Log file path (stdout only if not set)
    #[serde(default)]
    pub log_file: Option<String>,
    /// Rotate the log file once it grows past this size
    pub max_log_size_mb: u64,
    pub access_log: bool,
    pub access_log_format: AccessLogFormat,
}

/// Access log line layout
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLogFormat {
    #[default]
    Combined,
    Common,
    Json,
}
