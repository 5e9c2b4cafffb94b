use axum::extract::FromRequest;

use super::ApiError;

/// JSON request body whose rejections travel the typed error channel.
///
/// Plain `axum::Json` answers malformed bodies with a text response; this
/// wrapper turns them into a 422 `VALIDATION_ERROR` failure instead.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
