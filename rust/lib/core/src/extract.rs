//! Request extractors with uniform error bodies.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::ServiceError;

/// JSON body extractor.
///
/// Same as `axum::Json`, except a missing, malformed or mistyped body is
/// reported as a `VALIDATION_FAILED` (400) `ServiceError` so every client
/// error shares one response shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServiceError::Validation(e.body_text()))?;
        Ok(ApiJson(value))
    }
}
