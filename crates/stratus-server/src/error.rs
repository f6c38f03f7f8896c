//! Mapping from application errors to HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use stratus_core::{AppError, ValidationError, WeatherError};

/// Plain-text error response; no structured body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(ValidationError::MissingLocation) => StatusCode::BAD_REQUEST,
            AppError::Validation(ValidationError::MethodNotAllowed) => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            AppError::Weather(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match &self.0 {
            AppError::Validation(e) => e.to_string(),
            AppError::Weather(e) => format!("Error fetching weather data: {}", e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            return (
                status,
                [
                    (header::ALLOW, "GET"),
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                ],
                body,
            )
                .into_response();
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
