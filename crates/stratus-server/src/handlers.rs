use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use stratus_core::ValidationError;
use tracing::instrument;

use crate::error::ApiError;
use crate::AppState;

/// Header reporting whether the body came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// `GET /weather?location=<name>`
///
/// The method is checked before the query, so a POST is 405 even without a location.
#[instrument(skip_all, fields(method = %method))]
pub async fn weather(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Err(ValidationError::MethodNotAllowed.into());
    }

    let location =
        location_param(query.as_deref()).ok_or(ValidationError::MissingLocation)?;

    let resolved = state.resolver.lookup(&location).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                header::HeaderName::from_static(CACHE_STATUS_HEADER),
                HeaderValue::from_static(resolved.status.as_str()),
            ),
        ],
        resolved.body,
    )
        .into_response())
}

/// `GET /health`. Does not touch the cache store or upstream.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// First non-empty `location`, falling back to the legacy `city` parameter.
///
/// Values are taken verbatim (after percent-decoding); no trimming or case folding.
pub fn location_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    let first = |name: &str| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    first("location").or_else(|| first("city"))
}
