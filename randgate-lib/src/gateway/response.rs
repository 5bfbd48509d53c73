use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::Response;
use serde::Serialize;

use crate::gateway::http_result::HandlerError;

pub(crate) type RespBody = BoxBody<Bytes, hyper::Error>;

pub(crate) fn full_body(data: impl Into<Bytes>) -> RespBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

pub(crate) fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<RespBody> {
    let mut resp = Response::new(full_body(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<RespBody> {
    match serde_json::to_vec(value) {
        Ok(body) => text_response(status, "application/json", body),
        Err(e) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            format!("response serialization failed: {e}"),
        ),
    }
}

/// Render a handler error as its fixed status code.
///
/// 429 carries a Retry-After header plus the estimated delay in the body;
/// 503 stays plain text (never JSON) per the unavailability contract.
pub(crate) fn error_response(err: HandlerError) -> Response<RespBody> {
    let status = StatusCode::from(err.clone());
    let mut resp = text_response(status, "text/plain; charset=utf-8", err.to_string());

    if let HandlerError::RateLimited { retry_after_secs } = err {
        if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
            resp.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    resp
}

/// Permissive wildcard CORS, applied to every response including errors.
pub(crate) fn apply_cors_headers(resp: &mut Response<RespBody>) {
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
}

pub(crate) fn preflight_response() -> Response<RespBody> {
    let mut resp = Response::new(full_body(Bytes::new()));
    *resp.status_mut() = StatusCode::NO_CONTENT;
    resp
}
