//! Custom extractors for request validation

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use validator::Validate;

use crate::types::error::AppError;

/// Custom JSON extractor that validates the payload
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => {
                    AppError::malformed("Missing Content-Type: application/json header")
                }
                _ => AppError::malformed("Invalid JSON payload"),
            })?;

        payload.validate().map_err(|errors| {
            // The first field error's message is what the client sees
            errors
                .field_errors()
                .values()
                .find_map(|field_errors| field_errors.first()?.message.clone())
                .map_or_else(
                    || AppError::malformed("Request validation failed"),
                    |message| AppError::malformed(message.into_owned()),
                )
        })?;

        Ok(Self(payload))
    }
}
