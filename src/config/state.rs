// Application state module
// Holds the loaded configuration and the request router shared by all connections

use super::types::Config;
use crate::router::Router;
use crate::sheet::SharedStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub router: Router,
    /// Write one access log line per request
    pub access_log: bool,
}

impl AppState {
    pub fn new(config: &Config, store: SharedStore) -> Self {
        Self {
            config: config.clone(),
            router: Router::new(store, config.router_settings()),
            access_log: config.logging.access_log,
        }
    }
}
