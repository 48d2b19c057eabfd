//! Converts `AppError` and framework-generated failures into `ErrorResponse` JSON.

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Error bodies larger than this are not rewritten.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Maps an error to its status code and response body.
///
/// Server-side failures are logged with their source here and answered with
/// a generic message.
pub fn error_parts(error: &AppError) -> (StatusCode, ErrorResponse) {
    match error {
        AppError::NotFound { entity, field, value } => (
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found_error(entity, field, value),
        ),
        AppError::Duplicate { entity, field, value } => (
            StatusCode::CONFLICT,
            ErrorResponse::duplicate_error(entity, field, value),
        ),
        AppError::Validation { field, reason } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::validation_error(field, reason),
        ),
        AppError::ValidationErrors { errors } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(json!({ "errors": errors })),
        ),
        AppError::BadRequest { message } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("BAD_REQUEST", message),
        ),
        AppError::Conflict { message } => (
            StatusCode::CONFLICT,
            ErrorResponse::new("CONFLICT", message),
        ),
        AppError::Unauthorized { message } => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new("UNAUTHORIZED", message),
        ),
        AppError::Forbidden { message } => (
            StatusCode::FORBIDDEN,
            ErrorResponse::new("FORBIDDEN", message),
        ),
        AppError::Database { operation, source } => {
            tracing::error!(operation = %operation, error = ?source, "Database operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("DATABASE_ERROR", "A database error occurred"),
            )
        }
        AppError::Configuration { key, source } => {
            tracing::error!(key = %key, error = ?source, "Configuration error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("CONFIGURATION_ERROR", "The service is misconfigured"),
            )
        }
        AppError::ConnectionPool { source } => {
            tracing::warn!(error = %source, "Database connection unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable"),
            )
        }
        AppError::Internal { source } => {
            tracing::error!(error = ?source, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = error_parts(&self);
        (status, Json(body)).into_response()
    }
}

/// Outermost error layer.
///
/// JSON error bodies get the request id stamped in. Plain-text failures
/// produced by axum itself (unknown route, wrong method, unparsable path,
/// timeout) are rewritten as `ErrorResponse`.
pub async fn error_response_middleware(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read error response body");
            Default::default()
        }
    };

    let mut error = if is_json {
        match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(error) => error,
            Err(_) => return Response::from_parts(parts, Body::from(bytes)),
        }
    } else {
        fallback_error(status, String::from_utf8_lossy(&bytes).trim())
    };

    if error.request_id.is_none() {
        error.request_id = request_id;
    }

    match serde_json::to_vec(&error) {
        Ok(encoded) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Response::from_parts(parts, Body::from(encoded))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode error response");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

fn fallback_error(status: StatusCode, original: &str) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request - invalid or malformed request"),
        StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Authentication required"),
        StatusCode::FORBIDDEN => ("FORBIDDEN", "Access denied"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => (
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        ),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::UNPROCESSABLE_ENTITY => ("BAD_REQUEST", "Request body could not be processed"),
        StatusCode::SERVICE_UNAVAILABLE => {
            ("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
        }
        s if s.is_server_error() => ("INTERNAL_ERROR", "An internal error occurred"),
        _ => ("UNKNOWN_ERROR", "An unknown error occurred"),
    };

    // Server-side text is never passed through.
    let message = if original.is_empty() || status.is_server_error() {
        default_message
    } else {
        original
    };
    ErrorResponse::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("product", "id", 1), StatusCode::NOT_FOUND),
            (AppError::duplicate("user", "email", "a@b.c"), StatusCode::CONFLICT),
            (AppError::conflict("already processed"), StatusCode::CONFLICT),
            (AppError::validation("price", "too low"), StatusCode::BAD_REQUEST),
            (
                AppError::Unauthorized { message: "no".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::access_denied(), StatusCode::FORBIDDEN),
            (
                AppError::ConnectionPool { source: anyhow::anyhow!("timed out") },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal { source: anyhow::anyhow!("boom") },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error_parts(&error).0, expected, "{:?}", error);
        }
    }

    #[tokio::test]
    async fn test_validation_errors_carry_field_details() {
        let error = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "name".into(),
                message: "Name is required".into(),
            }],
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_database_source_is_not_leaked() {
        let error = AppError::Database {
            operation: "insert product".into(),
            source: anyhow::anyhow!("relation \"products\" does not exist"),
        };
        let body = body_json(error.into_response()).await;
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("relation"));
    }

    #[test]
    fn test_fallback_hides_server_text() {
        let error = fallback_error(StatusCode::INTERNAL_SERVER_ERROR, "stack trace here");
        assert_eq!(error.message, "An internal error occurred");

        let error = fallback_error(StatusCode::BAD_REQUEST, "Invalid URL: id");
        assert_eq!(error.message, "Invalid URL: id");
        assert_eq!(fallback_error(StatusCode::NOT_FOUND, "").code, "NOT_FOUND");
    }
}
