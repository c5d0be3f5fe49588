//! Request router
//!
//! Entry point for hook requests: picks one of the handlers by method and
//! `action`, and turns every error into a failure envelope.
//!
//! | Method  | action          | Handler    |
//! |---------|-----------------|------------|
//! | OPTIONS | any             | preflight  |
//! | any     | `test` (query)  | diagnostic |
//! | POST    | `add` (body)    | create     |
//! | GET     | `add` (query)   | create     |
//! | GET     | none            | list       |

mod handlers;
mod types;

pub use types::{HookRequest, HookResponse, Outcome};

use std::sync::Arc;
use std::time::Duration;

use hyper::Method;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinError;

use crate::error::{HookError, HookResult, StorageError, ValidationError};
use crate::logger;
use crate::report::Schema;
use crate::sheet::SharedStore;

/// Router settings taken from configuration at start-up
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub sheet_name: String,
    pub schema: Schema,
    /// Upper bound for a single storage call
    pub storage_timeout: Duration,
    /// Trace every request step
    pub debug: bool,
}

pub struct Router {
    store: SharedStore,
    settings: RouterSettings,
    // FIFO gate: appends land in arrival order
    write_gate: Arc<Mutex<()>>,
}

impl Router {
    pub fn new(store: SharedStore, settings: RouterSettings) -> Self {
        Self {
            store,
            settings,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Handle one request; never fails, errors become failure envelopes
    pub async fn dispatch(&self, req: &HookRequest) -> HookResponse {
        self.trace(&format!("{} request received", req.method));

        if req.method == Method::OPTIONS {
            return self.handle_preflight();
        }
        if req.param("action") == Some("test") {
            return self.handle_diagnostic(req);
        }

        let result = match req.method {
            Method::POST => self.route_post(req).await,
            Method::GET => self.route_get(req).await,
            ref other => Err(ValidationError::UnsupportedMethod(other.to_string()).into()),
        };

        result.unwrap_or_else(|err| {
            match &err {
                HookError::Storage(e) => {
                    logger::log_error(&format!("{} {}: {e}", req.method, self.settings.sheet_name));
                }
                HookError::Validation(_) | HookError::BodyRead(_) => {
                    self.trace(&format!("Rejected: {err}"));
                }
            }
            HookResponse::failure(&err)
        })
    }

    /// POST: `{action:"add", data:{...}}` in the body
    async fn route_post(&self, req: &HookRequest) -> HookResult<HookResponse> {
        let body = req
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or(ValidationError::NoData)?;
        let mut request: Value = parse_json(body)?;
        self.trace(&format!("Parsed data: {request}"));

        let action = match request.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(other) => other.to_string(),
            None => "(missing)".to_string(),
        };
        if action != "add" {
            return Err(ValidationError::UnknownAction(action).into());
        }

        let data = request
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);
        self.handle_create(data).await
    }

    /// GET: `?action=add&data=<json>` creates, no action lists
    async fn route_get(&self, req: &HookRequest) -> HookResult<HookResponse> {
        match req.param("action") {
            Some("add") => {
                self.trace("Add action detected in GET request");
                let data = req
                    .param("data")
                    .filter(|d| !d.trim().is_empty())
                    .ok_or(ValidationError::NoData)?;
                let data = parse_json(data)?;
                self.handle_create(data).await
            }
            None => self.handle_list().await,
            Some(other) => Err(ValidationError::UnknownAction(other.to_string()).into()),
        }
    }

    /// Run a blocking read under the configured timeout
    async fn run_storage<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&SharedStore, &str) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let sheet_name = self.settings.sheet_name.clone();
        let task = tokio::task::spawn_blocking(move || op(&store, &sheet_name));

        match tokio::time::timeout(self.settings.storage_timeout, task).await {
            Ok(joined) => flatten_join(joined),
            Err(_) => Err(StorageError::Timeout),
        }
    }

    fn trace(&self, message: &str) {
        if self.settings.debug {
            logger::log_debug(message);
        }
    }
}

/// Result of a blocking storage task
fn flatten_join<T>(joined: Result<Result<T, StorageError>, JoinError>) -> Result<T, StorageError> {
    joined.unwrap_or_else(|join_err| Err(StorageError::Task(join_err.to_string())))
}

fn parse_json(text: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(text).map_err(|e| ValidationError::InvalidJson(e.to_string()))
}
