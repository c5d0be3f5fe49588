// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::report::ColumnOrder;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub sheet: SheetConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit timestamped trace lines for every request step
    #[serde(default)]
    pub debug: bool,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
    /// Advertise `Authorization` in `Access-Control-Allow-Headers`
    pub allow_authorization_header: bool,
    /// Use 400/503/204 instead of answering every request with 200
    pub strict_status: bool,
}

/// Sheet storage backend selection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Memory,
    Csv,
}

/// Sheet configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SheetConfig {
    /// Sheet that receives the reports
    pub name: String,
    pub backend: BackendKind,
    /// Directory holding one CSV file per sheet (csv backend only)
    pub data_dir: String,
    /// Fallback sheet when `name` does not exist
    pub active_sheet: String,
    pub column_order: ColumnOrder,
    /// Upper bound for a single storage call, in milliseconds
    pub timeout_ms: u64,
    #[serde(default)]
    pub header_style: HeaderStyle,
}

/// Header row formatting applied by `provision`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HeaderStyle {
    #[serde(default = "default_bold")]
    pub bold: bool,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default = "default_auto_resize")]
    pub auto_resize: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_bold() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_background() -> String {
    "#4285f4".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_font_color() -> String {
    "white".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_auto_resize() -> bool {
    true
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            bold: default_bold(),
            background: default_background(),
            font_color: default_font_color(),
            auto_resize: default_auto_resize(),
        }
    }
}
