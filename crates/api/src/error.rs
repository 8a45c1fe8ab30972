//! HTTP rendering of application errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use splittrip_db::Outcome;
use splittrip_shared::AppError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body: `{"error": "<code>", "message": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// An `AppError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

/// Body of a request whose primary effect succeeded while a secondary step
/// did not; the warning sits next to the result fields.
#[derive(Debug, Serialize)]
pub struct WithWarning<T> {
    /// The committed result.
    #[serde(flatten)]
    pub data: T,
    /// The degraded step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ErrorBody>,
}

impl<T> From<Outcome<T>> for WithWarning<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self {
            warning: outcome.upstream_error.as_ref().map(ErrorBody::from),
            data: outcome.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[case(AppError::Forbidden("x".into()), StatusCode::FORBIDDEN)]
    #[case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::Conflict("x".into()), StatusCode::CONFLICT)]
    #[case(AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(AppError::Upstream("x".into()), StatusCode::BAD_GATEWAY)]
    fn test_status_mapping(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(ApiError(err).into_response().status(), expected);
    }

    #[test]
    fn test_warning_is_flattened_next_to_data() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }

        let complete = serde_json::to_value(WithWarning::from(Outcome::complete(Item { id: 7 })))
            .unwrap();
        assert_eq!(complete, serde_json::json!({ "id": 7 }));

        let degraded = serde_json::to_value(WithWarning::from(Outcome::degraded(
            Item { id: 7 },
            AppError::Upstream("smtp down".into()),
        )))
        .unwrap();
        assert_eq!(degraded["id"], 7);
        assert_eq!(degraded["warning"]["error"], "UPSTREAM_ERROR");
    }

    #[test]
    fn test_body_carries_code_and_message() {
        let body = ErrorBody::from(&AppError::Conflict("already confirmed".into()));
        assert_eq!(body.error, "CONFLICT");
        assert!(body.message.contains("already confirmed"));
    }
}
