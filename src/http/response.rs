//! HTTP response building module
//!
//! Turns router results into hyper responses. Every response carries the
//! cross-origin headers browsers need to call the hook from another origin.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use crate::config::HttpConfig;
use crate::router::{HookResponse, Outcome};

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Start a response with CORS and server headers
fn cors_builder(status: StatusCode, http: &HttpConfig) -> Builder {
    let allow_headers = if http.allow_authorization_header {
        "Content-Type, Authorization"
    } else {
        "Content-Type"
    };

    Response::builder()
        .status(status)
        .header("Server", http.server_name.as_str())
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", allow_headers)
}

/// Status code for an outcome; everything is 200 unless strict mode is on
pub const fn status_for(outcome: Outcome, strict: bool) -> StatusCode {
    if !strict {
        return StatusCode::OK;
    }
    match outcome {
        Outcome::Ok => StatusCode::OK,
        Outcome::Invalid => StatusCode::BAD_REQUEST,
        Outcome::StorageFailed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build the HTTP response for a router result
pub fn build_hook_response(resp: &HookResponse, http: &HttpConfig) -> Response<Full<Bytes>> {
    match resp {
        HookResponse::Preflight => {
            let status = if http.strict_status {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::OK
            };
            cors_builder(status, http)
                .header("Content-Type", "text/plain")
                .header("Content-Length", 0)
                .body(Full::new(Bytes::new()))
                .unwrap_or_else(|e| {
                    log_build_error("OPTIONS", &e);
                    Response::new(Full::new(Bytes::new()))
                })
        }
        HookResponse::Json { body, outcome } => {
            let json = body.to_string();
            cors_builder(status_for(*outcome, http.strict_status), http)
                .header("Content-Type", "application/json")
                .header("Content-Length", json.len())
                .body(Full::new(Bytes::from(json)))
                .unwrap_or_else(|e| {
                    log_build_error("JSON", &e);
                    Response::new(Full::new(Bytes::from(r#"{"success":false}"#)))
                })
        }
    }
}

/// Build 413 Payload Too Large response
pub fn build_413_response(http: &HttpConfig) -> Response<Full<Bytes>> {
    let body = format!(
        r#"{{"success":false,"error":"Request body exceeds {} bytes"}}"#,
        http.max_body_size
    );
    cors_builder(StatusCode::PAYLOAD_TOO_LARGE, http)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http_config(strict: bool, auth: bool) -> HttpConfig {
        HttpConfig {
            server_name: "sheethook/test".to_string(),
            max_body_size: 16,
            allow_authorization_header: auth,
            strict_status: strict,
        }
    }

    fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> &'a str {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn test_cors_headers_on_json() {
        let resp = build_hook_response(
            &HookResponse::success(json!([])),
            &http_config(false, true),
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "*");
        assert_eq!(header(&resp, "Access-Control-Allow-Methods"), "GET, POST, OPTIONS");
        assert_eq!(
            header(&resp, "Access-Control-Allow-Headers"),
            "Content-Type, Authorization"
        );
        assert_eq!(header(&resp, "Content-Type"), "application/json");
        assert_eq!(header(&resp, "Server"), "sheethook/test");
    }

    #[test]
    fn test_preflight_is_empty() {
        let resp = build_hook_response(&HookResponse::Preflight, &http_config(false, false));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "Access-Control-Allow-Headers"), "Content-Type");
        assert_eq!(header(&resp, "Content-Length"), "0");

        let resp = build_hook_response(&HookResponse::Preflight, &http_config(true, false));
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(Outcome::Invalid, false), StatusCode::OK);
        assert_eq!(status_for(Outcome::StorageFailed, false), StatusCode::OK);
        assert_eq!(status_for(Outcome::Invalid, true), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(Outcome::StorageFailed, true),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(Outcome::Ok, true), StatusCode::OK);
    }

    #[test]
    fn test_413_keeps_cors() {
        let resp = build_413_response(&http_config(false, true));
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(header(&resp, "Access-Control-Allow-Origin"), "*");
    }
}
