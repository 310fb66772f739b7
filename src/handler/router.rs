//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: picks the function, serves a
//! static asset when one matches and forwards everything else to the
//! function backend.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderMap, ACCEPT_ENCODING, HOST, IF_NONE_MATCH, RANGE, REFERER, USER_AGENT,
};
use hyper::{Method, Request};

use crate::config::{AppState, Site};
use crate::function::backend::FunctionRequest;
use crate::handler::static_files;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// A missing favicon never reaches the function
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Request context encapsulating information needed for asset responses
pub struct RequestContext<'a> {
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range_header: Option<&'a str>,
    pub accept_encoding: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    fn new(method: &Method, headers: &'a HeaderMap) -> Self {
        Self {
            is_head: method == Method::HEAD,
            if_none_match: header_str(headers, IF_NONE_MATCH),
            range_header: header_str(headers, RANGE),
            accept_encoding: header_str(headers, ACCEPT_ENCODING),
        }
    }
}

/// How a request was answered, for the access log
struct Outcome {
    response: HttpResponse,
    function: Option<String>,
    asset: bool,
    gzip: bool,
}

impl Outcome {
    const fn plain(response: HttpResponse, function: Option<String>) -> Self {
        Self {
            response,
            function,
            asset: false,
            gzip: false,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log.then(|| access_entry(&req, remote_addr));

    let outcome = dispatch(req, &state, remote_addr).await;

    if let Some(mut entry) = access_log {
        entry.status = outcome.response.status().as_u16();
        entry.body_bytes = usize::try_from(outcome.response.body().size_hint().lower())
            .unwrap_or(usize::MAX);
        entry.function = outcome.function;
        entry.asset = outcome.asset;
        entry.gzip = outcome.gzip;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(outcome.response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState, remote_addr: Option<SocketAddr>) -> Outcome
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // Owned so no borrow of the request is held across the await
    let host = header_str(req.headers(), HOST)
        .or_else(|| req.uri().host())
        .map(ToString::to_string);
    let Some(site) = state.resolve_site(host.as_deref()).await else {
        tracing::debug!(host = ?host, "No function for host");
        return Outcome::plain(http::build_404_response(), None);
    };
    let function = Some(site.name.clone());

    // 1. Static assets (GET/HEAD only)
    if matches!(*req.method(), Method::GET | Method::HEAD) {
        let path = req.uri().path();
        if let Some(asset) = site.assets.find(path) {
            let ctx = RequestContext::new(req.method(), req.headers());
            let served = static_files::serve_asset(&ctx, asset, &state.cache_control);
            return Outcome {
                response: served.response,
                function,
                asset: true,
                gzip: served.gzip,
            };
        }

        // 2. Missing favicon
        if path == FAVICON_PATH {
            return Outcome::plain(http::build_404_response(), function);
        }
    }

    // 3. Function
    let response = match forward_to_function(req, state, &site, remote_addr).await {
        Ok(response) => response,
        Err(response) => response,
    };
    Outcome::plain(response, function)
}

/// Buffer the body (bounded) and hand the request to the backend
async fn forward_to_function<B>(
    req: Request<B>,
    state: &AppState,
    site: &Site,
    remote_addr: Option<SocketAddr>,
) -> Result<HttpResponse, HttpResponse>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.server.max_body_size;
    if let Some(declared) = header_str(req.headers(), hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok())
    {
        if declared > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {declared} bytes (max: {max_body_size})"
            ));
            return Err(http::build_413_response());
        }
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            return Err(http::build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(http::response::build_direct_response(
                hyper::StatusCode::BAD_REQUEST,
                "400 Bad Request",
            ));
        }
    };

    let request = FunctionRequest {
        function: site.name.clone(),
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        remote_addr,
        env: site.env.clone(),
    };
    Ok(state.backend.invoke(request).await)
}

fn access_entry<B>(req: &Request<B>, remote_addr: Option<SocketAddr>) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header_str(req.headers(), REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), USER_AGENT).map(ToString::to_string);
    entry
}

fn header_str<K: hyper::header::AsHeaderName>(headers: &HeaderMap, name: K) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{gzip, Asset, AssetSet};
    use crate::config::{AssetsConfig, Config, Routing};
    use async_trait::async_trait;
    use http_body_util::Full;
    use hyper::header::{CACHE_CONTROL, CONTENT_ENCODING};
    use hyper::StatusCode;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Backend that records what reached it
    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<(String, String, Bytes)>>,
    }

    #[async_trait]
    impl crate::function::FunctionBackend for RecordingBackend {
        async fn invoke(&self, request: FunctionRequest) -> HttpResponse {
            self.seen.lock().unwrap().push((
                request.function,
                request.uri.path().to_string(),
                request.body,
            ));
            http::response::build_direct_response(StatusCode::OK, "from function")
        }
    }

    fn assets() -> AssetSet {
        let mut set = AssetSet::new();
        set.insert(Asset::new(
            "images/image.png".to_string(),
            Bytes::from_static(b"png"),
            None,
        ));
        let css = "h1 { font-weight: bold; }\n".repeat(40);
        let encoded = gzip::encode(css.as_bytes(), &AssetsConfig::default()).unwrap();
        set.insert(Asset::new("style.css".to_string(), Bytes::from(css), encoded));
        set
    }

    async fn state(backend: Arc<RecordingBackend>) -> Arc<AppState> {
        let mut config = Config::load_from("/nonexistent/edgehost-test-config").unwrap();
        config.logging.access_log = false;
        config.server.max_body_size = 16;
        let state = AppState::new(config, Routing::ByHost).with_backend(backend);
        state
            .install(Site {
                name: "hello".to_string(),
                deployment_id: Some("1".to_string()),
                assets: assets(),
                env: BTreeMap::new(),
            })
            .await;
        Arc::new(state)
    }

    fn request(method: Method, path: &str, host: &str) -> hyper::http::request::Builder {
        Request::builder().method(method).uri(path).header(HOST, host)
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> HttpResponse {
        handle_request(req, Arc::clone(state), None).await.unwrap()
    }

    #[tokio::test]
    async fn test_asset_served_with_cache_header() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        let req = request(Method::GET, "/images/image.png", "hello.localhost:8080")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CACHE_CONTROL], "max-age=604800");
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_asset_gzip_negotiated() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(backend).await;

        let req = request(Method::GET, "/style.css", "hello.localhost")
            .header(ACCEPT_ENCODING, "gzip")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.headers()[CONTENT_ENCODING], "gzip");
    }

    #[tokio::test]
    async fn test_unknown_path_goes_to_function() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        let req = request(Method::POST, "/api/items", "hello.localhost")
            .body(Full::new(Bytes::from_static(b"{\"a\":1}")))
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "hello");
        assert_eq!(seen[0].1, "/api/items");
        assert_eq!(seen[0].2, Bytes::from_static(b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_post_to_asset_path_goes_to_function() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        let req = request(Method::POST, "/style.css", "hello.localhost")
            .body(Full::new(Bytes::new()))
            .unwrap();
        send(&state, req).await;
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_favicon_skips_function() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        let req = request(Method::GET, FAVICON_PATH, "hello.localhost")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_host_is_404() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        let req = request(Method::GET, "/images/image.png", "other.localhost")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let backend = Arc::new(RecordingBackend::default());
        let state = state(Arc::clone(&backend)).await;

        // no Content-Length: the limit is enforced while reading
        let req = request(Method::POST, "/api", "hello.localhost")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = request(Method::POST, "/api", "hello.localhost")
            .header(hyper::header::CONTENT_LENGTH, "1000")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(backend.seen.lock().unwrap().is_empty());
    }
}
