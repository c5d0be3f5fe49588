//! Request service
//!
//! Bridges hyper and the router: enforces the body size limit, decodes the
//! query string, dispatches, builds the HTTP response and writes the access
//! log line.

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::http::request::Parts;
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppState, HttpConfig};
use crate::error::{HookError, ValidationError};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::router::{HookRequest, HookResponse};

/// Body could not be accepted
#[derive(Debug, PartialEq, Eq)]
enum BodyRejection {
    TooLarge,
    /// Transport failure while the body was streamed in
    Read(String),
    NotUtf8(String),
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let http_config = &state.config.http;

    let mut access = access_entry(&parts, peer_addr);

    let response = match read_body(&parts, body, http_config.max_body_size).await {
        Ok(body) => {
            let hook_req = HookRequest {
                params: http::parse_query(parts.uri.query()),
                body,
                ..HookRequest::new(parts.method.clone())
            };
            access.action = hook_req.param("action").map(ToString::to_string);
            let result = state.router.dispatch(&hook_req).await;
            http::build_hook_response(&result, http_config)
        }
        Err(rejection) => rejection_response(rejection, http_config),
    };

    if state.access_log {
        access.status = response.status().as_u16();
        access.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        access.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&access, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn access_entry(parts: &Parts, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.user_agent = parts
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

/// Answer for a body that never reached the router
fn rejection_response(rejection: BodyRejection, http_config: &HttpConfig) -> Response<Full<Bytes>> {
    let err = match rejection {
        BodyRejection::TooLarge => return http::build_413_response(http_config),
        BodyRejection::Read(detail) => HookError::BodyRead(detail),
        BodyRejection::NotUtf8(detail) => ValidationError::InvalidJson(detail).into(),
    };
    http::build_hook_response(&HookResponse::failure(&err), http_config)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Validate Content-Length against the limit
fn check_content_length(parts: &Parts, max_body_size: u64) -> Result<(), BodyRejection> {
    let Some(content_length) = parts.headers.get("content-length") else {
        return Ok(());
    };
    match content_length.to_str().map(str::parse::<u64>) {
        Ok(Ok(size)) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Err(BodyRejection::TooLarge)
        }
        Ok(Ok(_)) => Ok(()),
        _ => {
            logger::log_warning("Invalid Content-Length header, relying on streamed limit");
            Ok(())
        }
    }
}

/// Collect the request body as text, `None` when there is none
async fn read_body(
    parts: &Parts,
    body: Incoming,
    max_body_size: u64,
) -> Result<Option<String>, BodyRejection> {
    check_content_length(parts, max_body_size)?;

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            if e.is::<http_body_util::LengthLimitError>() {
                logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
                return Err(BodyRejection::TooLarge);
            }
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(BodyRejection::Read(e.to_string()));
        }
    };

    decode_body(&bytes)
}

/// Body text, `None` when empty; bytes that are not UTF-8 are refused
fn decode_body(bytes: &[u8]) -> Result<Option<String>, BodyRejection> {
    if bytes.is_empty() {
        return Ok(None);
    }
    std::str::from_utf8(bytes)
        .map(|text| Some(text.to_string()))
        .map_err(|e| BodyRejection::NotUtf8(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::connection::accept_connection;
    use crate::sheet::MemoryWorkbook;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn test_state(max_body_size: u64) -> Arc<AppState> {
        let mut cfg = Config::load_from("does-not-exist/sheethook").unwrap();
        cfg.http.max_body_size = max_body_size;
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg, Arc::new(MemoryWorkbook::new("Sheet1"))))
    }

    /// Send one raw request on a fresh loopback connection, return the raw response
    async fn round_trip(state: &Arc<AppState>, request: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, peer_addr) = listener.accept().await.unwrap();
        accept_connection(stream, peer_addr, state, &Arc::new(AtomicUsize::new(0)));

        client.write_all(request).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn post(path: &str, body: &[u8]) -> Vec<u8> {
        let mut request = format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        request.extend_from_slice(body);
        request
    }

    fn get(path: &str) -> Vec<u8> {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").into_bytes()
    }

    #[tokio::test]
    async fn test_preflight_over_loopback() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = test_state(1024);
                let resp = round_trip(
                    &state,
                    b"OPTIONS /hook HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
                let lower = resp.to_lowercase();
                assert!(lower.contains("access-control-allow-origin: *"));
                assert!(lower.contains("access-control-allow-methods: get, post, options"));
                assert!(lower.contains("content-length: 0"));
                assert!(resp.ends_with("\r\n\r\n"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_query_and_empty_body_reach_router() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = test_state(1024);

                let resp = round_trip(&state, &get("/hook?action=test&who=J.+Smith%21&who=ignored")).await;
                assert!(resp.contains(r#""who":"J. Smith!""#), "{resp}");
                assert!(resp.contains(r#""method":"GET""#));
                assert!(resp.contains(r#""postData":"No postData""#));

                let resp = round_trip(&state, &post("/?action=test", b"")).await;
                assert!(resp.contains(r#""method":"POST""#), "{resp}");
                assert!(resp.contains(r#""postData":"No postData""#));
            })
            .await;
    }

    #[tokio::test]
    async fn test_add_then_list_over_loopback() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = test_state(1024);
                let body = br#"{"action":"add","data":{"Date":"2024-01-05","Officer Name":"Ana"}}"#;

                let resp = round_trip(&state, &post("/", body)).await;
                assert!(resp.contains(r#""success":true"#), "{resp}");
                assert!(resp.to_lowercase().contains("content-type: application/json"));

                let resp = round_trip(&state, &get("/")).await;
                assert!(resp.contains(r#""Officer Name":"Ana""#), "{resp}");
            })
            .await;
    }

    #[tokio::test]
    async fn test_body_rejections_over_loopback() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = test_state(16);

                // Chunked, so only the streamed limit can catch it
                let mut chunked = b"POST /?action=add HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nTransfer-Encoding: chunked\r\n\r\n20\r\n".to_vec();
                chunked.extend_from_slice(&[b'a'; 32]);
                chunked.extend_from_slice(b"\r\n0\r\n\r\n");
                let resp = round_trip(&state, &chunked).await;
                assert!(resp.starts_with("HTTP/1.1 413"), "{resp}");
                assert!(resp.to_lowercase().contains("access-control-allow-origin: *"));

                let resp = round_trip(&state, &post("/", b"{\"a\":\"\xff\"}")).await;
                assert!(resp.contains("Invalid JSON"), "{resp}");
                assert!(resp.contains(r#""success":false"#));
            })
            .await;
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Ok(None));
        assert_eq!(decode_body(b"ping"), Ok(Some("ping".to_string())));
        assert!(matches!(decode_body(&[b'{', 0xff]), Err(BodyRejection::NotUtf8(_))));
    }

    #[tokio::test]
    async fn test_read_failure_is_not_reported_as_missing_data() {
        let mut http_config = test_state(16).config.http.clone();
        let resp = rejection_response(BodyRejection::Read("connection reset".into()), &http_config);
        assert_eq!(resp.status(), hyper::StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to read request body: connection reset");

        http_config.strict_status = true;
        let resp = rejection_response(BodyRejection::Read("eof".into()), &http_config);
        assert_eq!(resp.status(), hyper::StatusCode::BAD_REQUEST);
    }

    fn parts_with_length(value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .method("POST")
            .uri("/?action=add")
            .header("content-length", value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_content_length_limit() {
        assert_eq!(check_content_length(&parts_with_length("10"), 16), Ok(()));
        assert_eq!(
            check_content_length(&parts_with_length("17"), 16),
            Err(BodyRejection::TooLarge)
        );
        assert_eq!(check_content_length(&parts_with_length("abc"), 16), Ok(()));
    }

    #[test]
    fn test_access_entry_from_parts() {
        let (parts, ()) = Request::builder()
            .method("GET")
            .uri("/hook?action=test")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts();
        let entry = access_entry(&parts, "10.0.0.7:5555".parse().unwrap());
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.path, "/hook");
        assert_eq!(entry.query.as_deref(), Some("action=test"));
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(entry.http_version, "1.1");
    }
}
