use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// Header carrying the login token.
pub const TOKEN_HEADER: &str = "jwt-token";

/// JSON body that has been deserialized and validated.
///
/// Any failure, including a missing field or a wrong content type, becomes an
/// [`ApiError::Validation`].
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        let value: T = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::Validation(format!("invalid request body: {}", err)))?;
        value
            .validate()
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        Ok(Self(value))
    }
}

/// The numeric `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct AccountIdPath(pub i64);

impl<S> FromRequestParts<S> for AccountIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(id))
    }
}

/// The raw value of the [`TOKEN_HEADER`] header, if present and valid UTF-8.
#[derive(Debug, Clone, Default)]
pub struct TokenHeader(pub Option<String>);

impl TokenHeader {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for TokenHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(Self(token))
    }
}
