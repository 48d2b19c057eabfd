//! Bearer token authentication.
//!
//! `authenticate` runs on every request. A valid token places an [`AuthUser`]
//! in the request extensions; handlers that require a caller take `AuthUser`
//! as an extractor, which rejects the request with 401 when none is present.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a presented token was not accepted, kept for the 401 message.
#[derive(Debug, Clone)]
pub struct AuthFailure(pub String);

/// Verifies `Authorization: Bearer <token>` when present and never rejects.
///
/// Public routes simply ignore the outcome; protected handlers surface it
/// through the `AuthUser` extractor.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|h| h.to_str().map(str::to_owned));

    match header_value {
        None => {}
        Some(Err(_)) => {
            request
                .extensions_mut()
                .insert(AuthFailure("Invalid authorization header".to_string()));
        }
        Some(Ok(value)) => match value.strip_prefix(BEARER_PREFIX) {
            None => {
                request.extensions_mut().insert(AuthFailure(
                    "Invalid authorization header format. Expected: Bearer <token>".to_string(),
                ));
            }
            Some(token) => match state.tokens.authenticate(token.trim()) {
                Ok(user) => {
                    tracing::debug!(
                        user_id = user.user_id,
                        role = %user.role,
                        "Caller authenticated"
                    );
                    request.extensions_mut().insert(user);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Bearer token rejected");
                    request.extensions_mut().insert(AuthFailure(e.to_string()));
                }
            },
        },
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let message = parts
            .extensions
            .get::<AuthFailure>()
            .map(|failure| failure.0.clone())
            .unwrap_or_else(|| "Missing authorization header".to_string());
        Err(AppError::Unauthorized { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use axum::http::Request as HttpRequest;

    fn parts_with(extension: Option<AuthUser>, failure: Option<&str>) -> Parts {
        let mut request = HttpRequest::builder().uri("/").body(()).unwrap();
        if let Some(user) = extension {
            request.extensions_mut().insert(user);
        }
        if let Some(reason) = failure {
            request.extensions_mut().insert(AuthFailure(reason.to_string()));
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_extractor_returns_authenticated_user() {
        let user = AuthUser {
            user_id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
        };
        let mut parts = parts_with(Some(user.clone()), None);
        let extracted = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_extractor_reports_missing_header() {
        let mut parts = parts_with(None, None);
        match AuthUser::from_request_parts(&mut parts, &()).await {
            Err(AppError::Unauthorized { message }) => {
                assert_eq!(message, "Missing authorization header")
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extractor_reports_token_failure() {
        let mut parts = parts_with(None, Some("Token has expired"));
        match AuthUser::from_request_parts(&mut parts, &()).await {
            Err(AppError::Unauthorized { message }) => assert_eq!(message, "Token has expired"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }
}
