use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::Instrument;

use crate::{
    admission::{AdmissionPipeline, Caller},
    types::AppError,
};

/// Axum extractor for the resolved caller
///
/// Requires [`caller_middleware`] to run first:
/// ```ignore
/// async fn handler(caller: Caller) -> Result<impl IntoResponse, AppError> {
///     // caller.identity, caller.authenticated
/// }
/// ```
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::configuration("Caller context missing, caller middleware is not installed")
        })
    }
}

/// Caller resolution middleware
///
/// This middleware:
/// 1. Derives the client identity from `X-Forwarded-For`
/// 2. Checks the bearer credential against the configured secret
/// 3. Adds the resulting `Caller` to request extensions
/// 4. Runs the rest of the request inside a span tagged with both
///
/// It never rejects; each endpoint decides what an unauthenticated caller may do.
pub async fn caller_middleware(
    Extension(pipeline): Extension<Arc<AdmissionPipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = pipeline.caller(request.headers());
    let span = tracing::info_span!(
        "caller",
        client = %caller.identity,
        authenticated = caller.authenticated
    );

    request.extensions_mut().insert(caller);
    next.run(request).instrument(span).await
}
