//! HTTP request, response and error types

pub mod ask;
pub mod error;
pub mod json;

pub use ask::{AskRequest, AskResponse};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
