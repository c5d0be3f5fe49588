// Configuration module entry point
// Loads application configuration and builds the runtime state from it

mod state;
mod types;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::{
    BackendKind, Config, HeaderStyle, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    SheetConfig,
};

use crate::report::Schema;
use crate::router::RouterSettings;
use crate::sheet::{CsvWorkbook, MemoryWorkbook, SharedStore};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Missing file is fine, defaults and `HOOK_*` environment variables still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("HOOK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.debug", false)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "sheethook/0.1")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("http.allow_authorization_header", true)?
            .set_default("http.strict_status", false)?
            .set_default("sheet.name", "Field Marketing Data")?
            .set_default("sheet.backend", "csv")?
            .set_default("sheet.data_dir", "data")?
            .set_default("sheet.active_sheet", "Sheet1")?
            .set_default("sheet.column_order", "timestamp_first")?
            .set_default("sheet.timeout_ms", 10_000)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Router settings derived from the sheet and logging sections
    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            sheet_name: self.sheet.name.clone(),
            schema: Schema::new(self.sheet.column_order),
            storage_timeout: Duration::from_millis(self.sheet.timeout_ms),
            debug: self.logging.debug,
        }
    }

    /// Open the configured sheet backend
    pub fn open_store(&self) -> Result<SharedStore, String> {
        match self.sheet.backend {
            BackendKind::Memory => Ok(Arc::new(MemoryWorkbook::new(&self.sheet.active_sheet))),
            BackendKind::Csv => {
                let workbook =
                    CsvWorkbook::open(Path::new(&self.sheet.data_dir), &self.sheet.active_sheet)
                        .map_err(|e| {
                            format!("Failed to open data dir '{}': {e}", self.sheet.data_dir)
                        })?;
                Ok(Arc::new(workbook))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ColumnOrder;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/sheethook").expect("defaults load");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.sheet.name, "Field Marketing Data");
        assert_eq!(cfg.sheet.backend, BackendKind::Csv);
        assert_eq!(cfg.sheet.column_order, ColumnOrder::TimestampFirst);
        assert!(cfg.http.allow_authorization_header);
        assert!(!cfg.http.strict_status);
        assert_eq!(cfg.sheet.header_style, HeaderStyle::default());
    }

    #[test]
    fn test_router_settings_follow_config() {
        let mut cfg = Config::load_from("does-not-exist/sheethook").expect("defaults load");
        cfg.sheet.timeout_ms = 250;
        cfg.sheet.column_order = ColumnOrder::TimestampLast;
        cfg.logging.debug = true;

        let settings = cfg.router_settings();
        assert_eq!(settings.storage_timeout, Duration::from_millis(250));
        assert_eq!(settings.schema, Schema::new(ColumnOrder::TimestampLast));
        assert!(settings.debug);
    }

    #[test]
    fn test_invalid_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/sheethook").expect("defaults load");
        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
