use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use validator::ValidationErrors;

/// Message used for every failure the handlers did not anticipate.
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Result type returned by route handlers and the authentication middleware.
pub type ApiResult<T> = Result<T, HandlerError>;

/// Stable machine-readable failure code.
///
/// Serialized as the numeric string clients match on, never as the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "1001")]
    UserNotFound,
    #[serde(rename = "1002")]
    UserAlreadyExists,
    #[serde(rename = "1003")]
    IncorrectPassword,
    #[serde(rename = "1004")]
    ValidationError,
    #[serde(rename = "1005")]
    InternalException,
    #[serde(rename = "1006")]
    Unauthorized,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UserNotFound => "1001",
            ErrorCode::UserAlreadyExists => "1002",
            ErrorCode::IncorrectPassword => "1003",
            ErrorCode::ValidationError => "1004",
            ErrorCode::InternalException => "1005",
            ErrorCode::Unauthorized => "1006",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by every [`ApiError`] variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    pub error_code: ErrorCode,
    /// Structured context; opaque to the error pipeline.
    pub detail: Option<Value>,
}

impl Failure {
    pub fn new(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            error_code,
            detail: None,
        }
    }
}

/// Typed request failure.
///
/// The variant decides the HTTP status; everything else lives in the shared
/// [`Failure`] payload. Construction never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(Failure),
    NotFound(Failure),
    Unauthorized(Failure),
    UnprocessableEntity(Failure),
    Internal(Failure),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::BadRequest(Failure::new(message, error_code))
    }

    pub fn not_found(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::NotFound(Failure::new(message, error_code))
    }

    pub fn unauthorized(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::Unauthorized(Failure::new(message, error_code))
    }

    pub fn unprocessable_entity(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::UnprocessableEntity(Failure::new(message, error_code))
    }

    pub fn internal(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::Internal(Failure::new(message, error_code))
    }

    /// Attach structured detail, replacing any previous value.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.failure_mut().detail = Some(detail);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn failure(&self) -> &Failure {
        match self {
            ApiError::BadRequest(failure)
            | ApiError::NotFound(failure)
            | ApiError::Unauthorized(failure)
            | ApiError::UnprocessableEntity(failure)
            | ApiError::Internal(failure) => failure,
        }
    }

    fn failure_mut(&mut self) -> &mut Failure {
        match self {
            ApiError::BadRequest(failure)
            | ApiError::NotFound(failure)
            | ApiError::Unauthorized(failure)
            | ApiError::UnprocessableEntity(failure)
            | ApiError::Internal(failure) => failure,
        }
    }

    pub fn into_failure(self) -> Failure {
        match self {
            ApiError::BadRequest(failure)
            | ApiError::NotFound(failure)
            | ApiError::Unauthorized(failure)
            | ApiError::UnprocessableEntity(failure)
            | ApiError::Internal(failure) => failure,
        }
    }

    pub fn message(&self) -> &str {
        &self.failure().message
    }

    pub fn error_code(&self) -> ErrorCode {
        self.failure().error_code
    }

    pub fn detail(&self) -> Option<&Value> {
        self.failure().detail.as_ref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ApiError {}

/// JSON body written for every failed request.
///
/// `errors` is always present and is `null` when there is no detail to share.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub error_code: ErrorCode,
    pub errors: Option<Value>,
}

/// The single place a failure becomes a client-visible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let internal = matches!(self, ApiError::Internal(_));
        let Failure {
            message,
            error_code,
            detail,
        } = self.into_failure();

        if internal {
            tracing::error!(
                status = status.as_u16(),
                error_code = %error_code,
                message = %message,
                detail = ?detail,
                "request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                error_code = %error_code,
                message = %message,
                "request rejected"
            );
        }

        let message = if message.trim().is_empty() {
            INTERNAL_MESSAGE.to_string()
        } else {
            message
        };

        // Internal detail is for the logs only.
        let errors = if internal { None } else { detail };

        let body = ErrorBody {
            message,
            error_code,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Error channel between a handler and the response terminator.
///
/// `?` accepts any error. A typed [`ApiError`] travels through unchanged;
/// anything else is downgraded to an Internal failure carrying the original
/// error text as detail.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

impl HandlerError {
    pub fn into_api_error(self) -> ApiError {
        match self.0.downcast::<ApiError>() {
            Ok(typed) => typed,
            Err(untyped) => ApiError::internal(INTERNAL_MESSAGE, ErrorCode::InternalException)
                .with_detail(Value::String(format!("{untyped:#}"))),
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.into_api_error().into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let detail = serde_json::to_value(&errors).unwrap_or(Value::Null);
        ApiError::unprocessable_entity("Unprocessable entity", ErrorCode::ValidationError)
            .with_detail(detail)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unprocessable_entity("Unprocessable entity", ErrorCode::ValidationError)
            .with_detail(json!([{ "message": rejection.body_text() }]))
    }
}
