pub mod config;
pub mod error;
pub mod extract;

pub use config::Config;
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode, Failure, HandlerError};
pub use extract::JsonBody;
