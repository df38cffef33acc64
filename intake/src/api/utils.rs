use crate::errors::{IntakeError, Result};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Response, StatusCode};
use serde::Serialize;
use shared::http::{make_error_response, make_json_response};

pub type HandlerBody = BoxBody<Bytes, IntakeError>;

/// Submissions are a few short strings; anything larger is not from the form.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Collects a request body, failing with `InvalidInput` if it cannot be read
/// or exceeds [`MAX_BODY_BYTES`].
pub async fn collect_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| IntakeError::InvalidInput(format!("Failed to read request body: {e}")))
}

/// Serializes a value to a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<HandlerBody> {
    match serde_json::to_vec(value) {
        Ok(bytes) => make_json_response(status, bytes),
        Err(e) => {
            let e = IntakeError::ResponseSerializationError(e.to_string());
            tracing::error!(error = %e, "Failed to build response");
            make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
