use axum::{
    Json,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use mirror_types::api::ErrorBody;

use crate::dispatcher::CaptureError;

/// Everything a request can fail with. Backend detail never reaches the
/// response body; it is logged where the error is produced.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("you must provide the most recent last_updated_date to modify this message")]
    VersionRequired,

    #[error(
        "this message has been updated by someone else - please resubmit with most recent last_updated_date"
    )]
    Conflict,

    #[error("you must provide a valid api_key")]
    Credential,

    #[error("not found")]
    NotFound,

    #[error("invalid route method supplied")]
    MethodNotAllowed(Vec<Method>),

    #[error("could not encode response")]
    Encoding,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::VersionRequired | Self::Conflict | Self::Credential => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Encoding | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A failed read: logged, reported as a missing resource.
    pub fn read_failure(context: &str, err: anyhow::Error) -> Self {
        error!("{}: {:#}", context, err);
        Self::NotFound
    }

    /// A failed write: logged, reported as a generic rejection.
    pub fn write_failure(context: &str, err: anyhow::Error) -> Self {
        error!("{}: {:#}", context, err);
        Self::Validation("unable to save changes".into())
    }
}

/// Decode a JSON request body. Any serde failure is a validation error.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))
}

impl From<CaptureError> for ApiError {
    fn from(err: CaptureError) -> Self {
        error!("Handler read a path capture the route does not provide: {}", err);
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::MethodNotAllowed(allow) => {
                let allow = allow
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                (status, [(header::ALLOW, allow)], status_line(status)).into_response()
            }
            Self::NotFound | Self::Encoding | Self::Internal => {
                (status, status_line(status)).into_response()
            }
            other => (
                status,
                Json(ErrorBody {
                    error_msg: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// `"404 Not Found"` style plain-text body.
fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_str(),
        status.canonical_reason().unwrap_or_default()
    )
}
