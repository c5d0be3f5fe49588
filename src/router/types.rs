// Router request/response types

use std::collections::BTreeMap;

use hyper::Method;
use serde_json::{json, Value};

use crate::error::HookError;
use crate::report::iso_now;

/// Transport-independent view of an inbound request
#[derive(Debug, Clone)]
pub struct HookRequest {
    pub method: Method,
    /// Decoded query parameters, first occurrence wins
    pub params: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HookRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: BTreeMap::new(),
            body: None,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        self
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// How a request ended, used to pick a status code in strict mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Invalid,
    StorageFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookResponse {
    /// JSON body (envelope or row list)
    Json { body: Value, outcome: Outcome },
    /// Empty preflight answer
    Preflight,
}

impl HookResponse {
    pub fn success(body: Value) -> Self {
        Self::Json {
            body,
            outcome: Outcome::Ok,
        }
    }

    /// Failure envelope `{success:false, error, timestamp}`
    pub fn failure(err: &HookError) -> Self {
        let outcome = match err {
            HookError::Validation(_) | HookError::BodyRead(_) => Outcome::Invalid,
            HookError::Storage(_) => Outcome::StorageFailed,
        };
        Self::Json {
            body: json!({
                "success": false,
                "error": err.to_string(),
                "timestamp": iso_now(),
            }),
            outcome,
        }
    }

    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Json { outcome, .. } => *outcome,
            Self::Preflight => Outcome::Ok,
        }
    }

    /// JSON body, `None` for preflight
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Json { body, .. } => Some(body),
            Self::Preflight => None,
        }
    }
}
