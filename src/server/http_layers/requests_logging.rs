//! Request logging middleware

use crate::media::PUBLIC_IMAGES_PREFIX;
use crate::server::metrics::record_http_request;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "x-rapidapi-key"];

/// What to do with a body at the `Body` level.
#[derive(Debug, PartialEq)]
enum BodyLog {
    /// Small textual body, read and printed.
    Print(usize),
    /// Only the size or the reason is printed; the body streams through untouched.
    Describe(String),
}

fn is_textual(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(true, |ct| ct.starts_with("application/json") || ct.starts_with("text/"))
}

fn classify_body(headers: &HeaderMap) -> BodyLog {
    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    match length {
        None => BodyLog::Describe("unknown length".to_string()),
        Some(0) => BodyLog::Describe("empty".to_string()),
        Some(size) if !is_textual(headers) => {
            BodyLog::Describe(format!("binary, {:#}", byte_unit::Byte::from(size)))
        }
        Some(size) if size < MAX_LOGGABLE_BODY_LENGTH => BodyLog::Print(size),
        Some(size) => BodyLog::Describe(format!("too big to log, {:#}", byte_unit::Byte::from(size))),
    }
}

async fn log_body(label: &str, headers: &HeaderMap, body: Body) -> Result<Body, StatusCode> {
    match classify_body(headers) {
        BodyLog::Describe(description) => {
            info!("  {} body: {}", label, description);
            Ok(body)
        }
        BodyLog::Print(size) => {
            let bytes = axum::body::to_bytes(body, size).await.map_err(|err| {
                error!("Failed to read {} body: {:?}", label, err);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            info!("  {} body:\n{}", label, String::from_utf8_lossy(&bytes));
            Ok(Body::from(bytes))
        }
    }
}

fn log_headers(label: &str, headers: &HeaderMap) {
    info!("  {} headers:", label);
    for (name, value) in headers {
        if REDACTED_HEADERS.contains(&name.as_str()) {
            info!("    {}: <redacted>", name);
        } else {
            info!("    {}: {:?}", name, value);
        }
    }
}

pub async fn log_requests(
    State(level): State<RequestsLoggingLevel>,
    mut request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let start = Instant::now();

    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let path = request.uri().path().to_string();
    // Image fetches are too frequent for info
    let is_image = path
        .trim_start_matches('/')
        .starts_with(PUBLIC_IMAGES_PREFIX);
    let verbose = level > RequestsLoggingLevel::None && !is_image;

    if verbose {
        info!(">>> {} {}", method, uri);
    } else if is_image {
        debug!(">>> {} {}", method, uri);
    }

    if verbose && level >= RequestsLoggingLevel::Headers {
        log_headers("Req", request.headers());
    }

    if verbose && level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        match log_body("Req", &parts.headers, body).await {
            Ok(body) => request = Request::from_parts(parts, body),
            Err(status) => return status.into_response(),
        }
    }

    let mut response = next.run(request).await;

    if verbose && level >= RequestsLoggingLevel::Headers {
        log_headers("Resp", response.headers());
    }

    if verbose && level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        match log_body("Resp", &parts.headers, body).await {
            Ok(body) => response = Response::from_parts(parts, body),
            Err(status) => return status.into_response(),
        }
    }

    let status = response.status().as_u16();
    let duration = start.elapsed();

    if verbose {
        info!("<<< {} ({}ms)", status, duration.as_millis());
    }

    record_http_request(&method, &path, status, duration);

    response
}
