//! Extractors that deserialize then run `validator` rules, rejecting with `AppError`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body that passed its `Validate` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that passed its `Validate` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::from(e))?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
        username: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Paging {
        #[validate(range(min = 1, message = "Page must be at least 1"))]
        page: Option<u32>,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json() {
        let request = json_request(r#"{"username":"alice","email":"alice@example.com"}"#);
        let ValidatedJson(body) = ValidatedJson::<Signup>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.username, "alice");
    }

    #[tokio::test]
    async fn test_invalid_fields_are_collected() {
        let request = json_request(r#"{"username":"al","email":"nope"}"#);
        match ValidatedJson::<Signup>::from_request(request, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["email", "username"]);
                assert!(errors[1].message.contains("between 3 and 50"));
            }
            other => panic!("Expected ValidationErrors, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request("{not json");
        assert!(matches!(
            ValidatedJson::<Signup>::from_request(request, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_validation() {
        let request = Request::builder().uri("/test?page=0").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(matches!(
            ValidatedQuery::<Paging>::from_request_parts(&mut parts, &()).await,
            Err(AppError::ValidationErrors { .. })
        ));

        let request = Request::builder().uri("/test?page=2").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();
        let ValidatedQuery(paging) = ValidatedQuery::<Paging>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(paging.page, Some(2));
    }
}
