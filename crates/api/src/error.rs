//! Error responses.
//!
//! Every failure is rendered as `{"ErrorMsg": "..."}` with the status code
//! carried by [`AppError`].

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use moneylog_core::ledger::LedgerError;
use moneylog_shared::AppError;

/// Handler error wrapping [`AppError`].
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "request failed");
        }
        (status, Json(json!({ "ErrorMsg": self.0.to_string() }))).into_response()
    }
}

/// Parses a path segment into a typed ID, rejecting malformed ones.
pub fn parse_id<T: std::str::FromStr>(raw: &str, label: &str) -> ApiResult<T> {
    raw.parse()
        .map_err(|_| ApiError(AppError::Validation(format!("Invalid {label} ID: {raw:?}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use moneylog_shared::types::LogbookId;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Forbidden("x".into()), StatusCode::FORBIDDEN)]
    #[case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::PartialCommit("x".into()), StatusCode::BAD_REQUEST)]
    #[tokio::test]
    async fn test_error_response_shape(#[case] err: AppError, #[case] expected: StatusCode) {
        let message = err.to_string();
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), expected);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "ErrorMsg": message }));
    }

    #[test]
    fn test_parse_id() {
        let id = LogbookId::new();
        assert_eq!(parse_id::<LogbookId>(&id.to_string(), "logbook").unwrap(), id);
        assert!(parse_id::<LogbookId>("nope", "logbook").is_err());
    }
}
