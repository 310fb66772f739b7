//! Function invocation seam
//!
//! Requests that match no static asset are handed to a `FunctionBackend`.
//! Executing function code is the job of an external runtime; the
//! backend shipped here answers 404 so a deployment that is all assets
//! behaves like a plain static site.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, StatusCode, Uri};

use crate::http::response::{build_direct_response, HttpResponse};

/// A request routed to a function
#[derive(Debug, Clone)]
pub struct FunctionRequest {
    pub function: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub remote_addr: Option<SocketAddr>,
    /// Environment recorded with the deployment
    pub env: BTreeMap<String, String>,
}

#[async_trait]
pub trait FunctionBackend: Send + Sync {
    async fn invoke(&self, request: FunctionRequest) -> HttpResponse;
}

/// Backend used when no function runtime is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundBackend;

#[async_trait]
impl FunctionBackend for NotFoundBackend {
    async fn invoke(&self, request: FunctionRequest) -> HttpResponse {
        tracing::debug!(
            function = %request.function,
            method = %request.method,
            path = request.uri.path(),
            "No function runtime attached"
        );
        build_direct_response(StatusCode::NOT_FOUND, "404 Not Found")
    }
}
