use crate::utils::{config::ServerConfig, error::INTERNAL_MESSAGE, ApiError, ErrorCode};
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{self, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub type RequestSpanFn = fn(&Request<Body>) -> Span;
pub type PanicHandlerFn = fn(Box<dyn Any + Send>) -> Response;

/// CORS middleware configuration
///
/// `*` allows any origin without credentials; an explicit list allows
/// credentials for those origins only.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(cors::Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins).allow_credentials(true)
}

/// Request ID middleware
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Copies the request id onto the response
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Tracing middleware
pub fn trace_layer(
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpanFn, DefaultOnRequest, DefaultOnResponse>
{
    TraceLayer::new_for_http()
        .make_span_with(make_request_span as RequestSpanFn)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Answers a panicking handler with the generic Internal failure.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandlerFn> {
    CatchPanicLayer::custom(handle_panic as PanicHandlerFn)
}

fn handle_panic(payload: Box<dyn Any + Send>) -> Response {
    let reason = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal(INTERNAL_MESSAGE, ErrorCode::InternalException)
        .with_detail(Value::String(format!("handler panicked: {reason}")))
        .into_response()
}
