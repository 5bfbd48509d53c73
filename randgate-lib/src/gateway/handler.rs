use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use hyper::{Request, Response};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

use crate::delivery::{self, OutputFormat, RandomRequest, RandomResult, DEFAULT_BYTES, MAX_BYTES, MIN_BYTES};
use crate::gateway::context::GatewayContext;
use crate::gateway::http_result::{HandlerError, HandlerResult};
use crate::gateway::query::QueryParams;
use crate::gateway::response::{
    apply_cors_headers, error_response, full_body, json_response, preflight_response,
    text_response, RespBody,
};
use crate::security::{api_key_matches, client_key};
use crate::verify::{self, VerifyError, VerifyRequest};

/// Largest accepted `/v1/verify` body
const MAX_VERIFY_BODY: usize = 16 * 1024;

const LANDING_PAGE: &str = "<!doctype html>\n<html>\n<head><title>randgate</title></head>\n<body>\n<h1>randgate</h1>\n<p>Authenticated randomness gateway.</p>\n<ul>\n<li><code>GET /v1/health</code></li>\n<li><code>GET /v1/meta</code></li>\n<li><code>GET /v1/random?n=32&amp;fmt=hex</code> (API key required)</li>\n<li><code>GET /v1/vrf?sig=ecdsa</code> (API key required)</li>\n<li><code>POST /v1/verify</code></li>\n</ul>\n</body>\n</html>\n";

/// Entry point for every inbound request.
///
/// Never fails: every error becomes a synthetic response, and CORS headers
/// are injected on all outcomes.
pub async fn handle_request<B>(
    ctx: Arc<GatewayContext>,
    peer: Option<SocketAddr>,
    req: Request<B>,
) -> Response<RespBody>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut resp = match route(&ctx, peer, req).await {
        Ok(resp) => resp,
        Err(err) => {
            debug!(%method, %path, %err, "request rejected");
            error_response(err)
        }
    };
    apply_cors_headers(&mut resp);
    resp
}

async fn route<B>(
    ctx: &GatewayContext,
    peer: Option<SocketAddr>,
    req: Request<B>,
) -> HandlerResult<Response<RespBody>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let path = req.uri().path().to_string();
    let params = QueryParams::parse(req.uri().query());
    let headers = req.headers().clone();

    match path.as_str() {
        "/" if method == Method::GET => Ok(landing_page()),
        "/v1/health" if method == Method::GET => {
            Ok(json_response(StatusCode::OK, &json!({"ok": true})))
        }
        "/v1/meta" if method == Method::GET => Ok(meta(ctx)),
        "/v1/random" if method == Method::GET => random(ctx, peer, &headers, &params).await,
        "/v1/vrf" if method == Method::GET => vrf(ctx, peer, &headers, &params).await,
        "/v1/verify" if method == Method::POST => {
            let body = read_body(req).await?;
            verify_route(&body)
        }
        _ => Err(HandlerError::NotFound),
    }
}

fn landing_page() -> Response<RespBody> {
    text_response(StatusCode::OK, "text/html; charset=utf-8", LANDING_PAGE)
}

fn meta(ctx: &GatewayContext) -> Response<RespBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "gateway_version": ctx.config.gateway_version,
            "core_url": ctx.config.core_url,
            "vrf_url": ctx.config.vrf_url,
        }),
    )
}

fn authorize(ctx: &GatewayContext, headers: &HeaderMap, params: &QueryParams) -> HandlerResult<()> {
    if api_key_matches(headers, params.get("api_key"), &ctx.config.public_api_key) {
        Ok(())
    } else {
        Err(HandlerError::Unauthorized)
    }
}

/// `GET /v1/random`: authenticate, consume the "default" scope, run the
/// delivery pipeline, render in the requested format.
async fn random(
    ctx: &GatewayContext,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    params: &QueryParams,
) -> HandlerResult<Response<RespBody>> {
    authorize(ctx, headers, params)?;
    ctx.limiter.admit(&client_key(peer), &ctx.scopes.default)?;

    let n = match params.get("n") {
        None => DEFAULT_BYTES,
        Some(raw) => raw
            .parse()
            .map_err(|_| HandlerError::BadRequest(format!("n must be an integer, got '{raw}'")))?,
    };
    let format = match params.get("fmt") {
        None => OutputFormat::Hex,
        Some(raw) => raw.parse().map_err(|_| {
            HandlerError::BadRequest(format!("fmt must be one of hex, json, raw; got '{raw}'"))
        })?,
    };
    let request = RandomRequest::new(n, format).ok_or_else(|| {
        HandlerError::BadRequest(format!("n must be between {MIN_BYTES} and {MAX_BYTES}"))
    })?;

    let result = delivery::get_random(&ctx.upstream, &request)
        .await
        .map_err(|e| HandlerError::Unavailable(e.to_string()))?;

    Ok(render_random(&result, format))
}

fn render_random(result: &RandomResult, format: OutputFormat) -> Response<RespBody> {
    match format {
        OutputFormat::Hex => text_response(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            result.bytes_hex.clone(),
        ),
        OutputFormat::Json => json_response(
            StatusCode::OK,
            &json!({
                "hex": result.bytes_hex,
                "n": result.byte_count,
                "source": result.source.as_str(),
            }),
        ),
        // Hex text is the wire form even for raw
        OutputFormat::Raw => text_response(
            StatusCode::OK,
            "application/octet-stream",
            result.bytes_hex.clone(),
        ),
    }
}

/// `GET /v1/vrf`: authenticate, consume the "vrf" scope, relay the VRF
/// upstream's status, content type and body verbatim.
async fn vrf(
    ctx: &GatewayContext,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    params: &QueryParams,
) -> HandlerResult<Response<RespBody>> {
    authorize(ctx, headers, params)?;
    ctx.limiter.admit(&client_key(peer), &ctx.scopes.vrf)?;

    let sig = params.get("sig").unwrap_or("ecdsa");
    let outcome = ctx
        .upstream
        .fetch_vrf_passthrough(sig)
        .await
        .map_err(|_| HandlerError::Unavailable("vrf upstream is unavailable".to_string()))?;

    let mut resp = Response::new(full_body(outcome.body));
    *resp.status_mut() = outcome.status;
    let content_type = outcome
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    resp.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
    Ok(resp)
}

fn verify_route(body: &Bytes) -> HandlerResult<Response<RespBody>> {
    let request: VerifyRequest = serde_json::from_slice(body)
        .map_err(|e| HandlerError::BadRequest(format!("invalid verify request: {e}")))?;

    match verify::verify(&request) {
        Ok(report) => Ok(json_response(StatusCode::OK, &report)),
        Err(err @ (VerifyError::MalformedHex(_)
        | VerifyError::MalformedRecoveryId
        | VerifyError::MalformedAddress)) => Err(HandlerError::BadRequest(err.to_string())),
        Err(err @ VerifyError::Recovery(_)) => {
            Err(HandlerError::Internal(format!("verify_failed: {err}")))
        }
    }
}

async fn read_body<B>(req: Request<B>) -> HandlerResult<Bytes>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| HandlerError::BadRequest(format!("failed to read request body: {e}")))?
        .to_bytes();

    if body.len() > MAX_VERIFY_BODY {
        return Err(HandlerError::BadRequest("request body too large".to_string()));
    }

    Ok(body)
}
