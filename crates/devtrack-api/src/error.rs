use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use devtrack_core::Error;

/// HTTP view of a service error.
///
/// Client errors carry the service message, "not found" has an empty body,
/// and server errors answer with a stable `{code, message}` pair.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Notification(_) | Error::Provider { .. } | Error::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Storage(_) | Error::Config(_) | Error::Json(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            Error::Validation(_) => "VALIDATION_FAILED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Notification(_) | Error::Provider { .. } | Error::Http(_) => {
                "NOTIFICATION_FAILED"
            }
            Error::Storage(_) => "STORAGE_ERROR",
            Error::Config(_) | Error::Json(_) | Error::Other(_) => "INTERNAL",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Unreadable request bodies are reported like any other invalid input
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{}", self.0);
            return status.into_response();
        }

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }

        let body = Json(serde_json::json!({
            "code": self.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (Error::validation("x"), StatusCode::BAD_REQUEST),
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::notification("x"), StatusCode::BAD_GATEWAY),
            (Error::provider("sendgrid", "x"), StatusCode::BAD_GATEWAY),
            (Error::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::config("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn server_errors_have_stable_codes() {
        assert_eq!(ApiError(Error::storage("disk full")).code(), "STORAGE_ERROR");
        assert_eq!(ApiError(Error::notification("x")).code(), "NOTIFICATION_FAILED");
        assert_eq!(ApiError(Error::Other("boom".to_string())).code(), "INTERNAL");
    }
}
