//! JSON body extractor whose rejections use the API error body

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiErrorType};

static MISSING_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]+)`").expect("valid regex"));

// axum prefixes "...target type: ", then the failing field's path when there is one
static INVALID_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"target type: (?:([\w.\[\]]+): )?invalid type: (.+?), expected (.+?) at line")
        .expect("valid regex")
});

/// `axum::Json` that rejects with `{"error": {...}}` instead of plain text
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumJson::<T>::from_request(req, state)
            .await
            .map(|AxumJson(value)| Json(value))
            .map_err(rejection_to_error)
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let (code, message) = match &rejection {
        JsonRejection::JsonDataError(err) => describe_data_error(&err.body_text()),
        JsonRejection::JsonSyntaxError(_) => {
            ("invalid_json", "Request body is not valid JSON".to_string())
        }
        JsonRejection::MissingJsonContentType(_) => (
            "invalid_content_type",
            "Content-Type must be application/json".to_string(),
        ),
        JsonRejection::BytesRejection(err) => (
            "invalid_body",
            format!("Failed to read request body: {}", err.body_text()),
        ),
        _ => ("invalid_body", "Invalid JSON request body".to_string()),
    };

    ApiError::new(rejection.status(), ApiErrorType::InvalidRequestError, message).with_code(code)
}

/// Turn a deserialization failure into a message naming the offending field
fn describe_data_error(body: &str) -> (&'static str, String) {
    if let Some(captures) = MISSING_FIELD.captures(body) {
        return (
            "missing_field",
            format!("Missing required field '{}'", &captures[1]),
        );
    }

    if let Some(captures) = INVALID_TYPE.captures(body) {
        let found = &captures[2];
        let expected = &captures[3];
        let message = match captures.get(1) {
            Some(field) => format!(
                "Field '{}' must be {}, got {}",
                field.as_str(),
                expected,
                found
            ),
            None => format!("Request body must be a JSON object, got {}", found),
        };
        return ("invalid_field", message);
    }

    ("invalid_body", body.to_string())
}
