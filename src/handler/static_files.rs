//! Static file serving module
//!
//! Builds the response for a matched asset: content negotiation between
//! the identity and gzip bodies, conditional requests and byte ranges.

use crate::assets::Asset;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, encoding, response, RangeOutcome};

/// Response for an asset plus whether the body went out gzip-encoded
pub struct AssetResponse {
    pub response: http::HttpResponse,
    pub gzip: bool,
}

/// Serve a matched asset
///
/// The gzip body is chosen when one exists, the client accepts it and no
/// `Range` header is present (ranges address the identity body).
pub fn serve_asset(ctx: &RequestContext<'_>, asset: &Asset, cache_control: &str) -> AssetResponse {
    let has_gzip = asset.gzip.is_some();
    let use_gzip =
        has_gzip && ctx.range_header.is_none() && encoding::accepts_gzip(ctx.accept_encoding);

    let etag = if use_gzip {
        cache::gzip_etag(&asset.etag)
    } else {
        asset.etag.clone()
    };

    if cache::check_etag_match(ctx.if_none_match, &etag) {
        return AssetResponse {
            response: http::build_304_response(&etag, cache_control, has_gzip),
            gzip: false,
        };
    }

    let headers = response::AssetHeaders {
        content_type: asset.content_type,
        etag: &etag,
        cache_control,
        vary_encoding: has_gzip,
    };

    if let (true, Some(body)) = (use_gzip, asset.gzip.as_ref()) {
        return AssetResponse {
            response: response::build_asset_response(&headers, body.clone(), true, ctx.is_head),
            gzip: true,
        };
    }

    let response = match http::parse_range(ctx.range_header, asset.content.len()) {
        RangeOutcome::Partial(range) => {
            response::build_partial_response(&headers, &asset.content, range, ctx.is_head)
        }
        RangeOutcome::NotSatisfiable => http::build_416_response(asset.content.len()),
        RangeOutcome::Full => {
            response::build_asset_response(&headers, asset.content.clone(), false, ctx.is_head)
        }
    };

    AssetResponse {
        response,
        gzip: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::gzip;
    use crate::config::AssetsConfig;
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use hyper::header::{CACHE_CONTROL, CONTENT_ENCODING, CONTENT_RANGE, ETAG, VARY};
    use hyper::StatusCode;

    const CACHE: &str = "max-age=604800";

    fn css_asset() -> Asset {
        let content = "body { color: red; }\n".repeat(50);
        let encoded = gzip::encode(content.as_bytes(), &AssetsConfig::default()).unwrap();
        Asset::new("style.css".to_string(), Bytes::from(content), encoded)
    }

    fn ctx<'a>() -> RequestContext<'a> {
        RequestContext {
            is_head: false,
            if_none_match: None,
            range_header: None,
            accept_encoding: Some("gzip, br"),
        }
    }

    async fn body_of(resp: http::HttpResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_gzip_when_accepted() {
        let asset = css_asset();
        let served = serve_asset(&ctx(), &asset, CACHE);
        assert!(served.gzip);
        let resp = served.response;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_ENCODING], "gzip");
        assert_eq!(resp.headers()[CACHE_CONTROL], "max-age=604800");
        assert_eq!(resp.headers()[VARY], "Accept-Encoding");
        assert_eq!(resp.headers()[ETAG], cache::gzip_etag(&asset.etag).as_str());
        assert_eq!(body_of(resp).await, asset.gzip.unwrap());
    }

    #[tokio::test]
    async fn test_identity_without_accept_encoding() {
        let asset = css_asset();
        let mut ctx = ctx();
        ctx.accept_encoding = None;
        let served = serve_asset(&ctx, &asset, CACHE);
        assert!(!served.gzip);
        assert!(served.response.headers().get(CONTENT_ENCODING).is_none());
        assert_eq!(body_of(served.response).await, asset.content);
    }

    #[test]
    fn test_not_modified() {
        let asset = css_asset();
        let etag = cache::gzip_etag(&asset.etag);
        let mut ctx = ctx();
        ctx.if_none_match = Some(&etag);
        let resp = serve_asset(&ctx, &asset, CACHE).response;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[CACHE_CONTROL], "max-age=604800");

        // identity tag does not validate the gzip representation
        let mut ctx2 = self::ctx();
        ctx2.if_none_match = Some(&asset.etag);
        assert_eq!(serve_asset(&ctx2, &asset, CACHE).response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_uses_identity_body() {
        let asset = css_asset();
        let mut ctx = ctx();
        ctx.range_header = Some("bytes=0-3");
        let served = serve_asset(&ctx, &asset, CACHE);
        assert!(!served.gzip);
        let resp = served.response;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers()[CONTENT_RANGE],
            format!("bytes 0-3/{}", asset.content.len()).as_str()
        );
        assert_eq!(body_of(resp).await, Bytes::from_static(b"body"));

        ctx.range_header = Some("bytes=99999-");
        assert_eq!(
            serve_asset(&ctx, &asset, CACHE).response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let asset = css_asset();
        let mut ctx = ctx();
        ctx.is_head = true;
        let resp = serve_asset(&ctx, &asset, CACHE).response;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).await.is_empty());
    }

    #[test]
    fn test_uncompressed_asset_has_no_vary() {
        let asset = Asset::new("a.png".to_string(), Bytes::from_static(b"png"), None);
        let served = serve_asset(&ctx(), &asset, CACHE);
        assert!(!served.gzip);
        assert!(served.response.headers().get(VARY).is_none());
    }
}
