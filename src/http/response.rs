//! HTTP response building module
//!
//! Builders for the status codes the server emits. None of them panic:
//! a builder failure is logged and replaced by an empty response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCEPT_RANGES, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, VARY,
};
use hyper::{Response, StatusCode};

use super::range::ByteRange;

pub type HttpResponse = Response<Full<Bytes>>;

/// Headers shared by every representation of one static asset
#[derive(Debug, Clone, Copy)]
pub struct AssetHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub cache_control: &'a str,
    /// Whether a gzip variant exists, so caches must key on `Accept-Encoding`
    pub vary_encoding: bool,
}

/// Build 200 response for an asset body
///
/// `body` is the representation actually sent (gzip or identity);
/// for HEAD requests it is measured but not transmitted.
pub fn build_asset_response(
    headers: &AssetHeaders<'_>,
    body: Bytes,
    gzip: bool,
    is_head: bool,
) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, headers.content_type)
        .header(CONTENT_LENGTH, body.len())
        .header(ETAG, headers.etag)
        .header(CACHE_CONTROL, headers.cache_control);

    if gzip {
        builder = builder.header(CONTENT_ENCODING, "gzip");
    } else {
        builder = builder.header(ACCEPT_RANGES, "bytes");
    }
    if headers.vary_encoding {
        builder = builder.header(VARY, "Accept-Encoding");
    }

    let body = if is_head { Bytes::new() } else { body };
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        empty(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build 206 Partial Content response over an identity body
pub fn build_partial_response(
    headers: &AssetHeaders<'_>,
    full_body: &Bytes,
    range: ByteRange,
    is_head: bool,
) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, headers.content_type)
        .header(CONTENT_LENGTH, range.byte_count())
        .header(CONTENT_RANGE, range.content_range(full_body.len()))
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, headers.etag)
        .header(CACHE_CONTROL, headers.cache_control);

    if headers.vary_encoding {
        builder = builder.header(VARY, "Accept-Encoding");
    }

    let body = if is_head {
        Bytes::new()
    } else {
        full_body.slice(range.start..=range.end)
    };

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("206", &e);
        empty(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache_control: &str, vary_encoding: bool) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, etag)
        .header(CACHE_CONTROL, cache_control);

    if vary_encoding {
        builder = builder.header(VARY, "Accept-Encoding");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        empty(StatusCode::NOT_MODIFIED)
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_direct_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_direct_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> HttpResponse {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            empty(StatusCode::RANGE_NOT_SATISFIABLE)
        })
}

/// Build a plain-text response with the given status
pub fn build_direct_response(status: StatusCode, body: &'static str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            empty(status)
        })
}

fn empty(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
