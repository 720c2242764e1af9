mod health;
pub mod images;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::caller_middleware;

/// Creates the router with all handler routes
///
/// Expects `Arc<AdmissionPipeline>`, `Arc<MediaStorage>` and `RoutePolicies`
/// to be provided as `Extension` layers by the caller.
///
/// Upload bodies have no framework size limit: the upload handlers stream
/// each part and bound what they buffer, so count and size violations are
/// answered by admission.
pub fn handler() -> Router {
    let image_routes = Router::new()
        .route(
            "/images",
            post(images::upload_image.layer(DefaultBodyLimit::disable()))
                .delete(images::delete_image),
        )
        .route(
            "/images/multi",
            post(images::upload_images.layer(DefaultBodyLimit::disable())),
        )
        .route("/images/quota", get(images::get_quota))
        .layer(middleware::from_fn(caller_middleware));

    Router::new()
        .route("/health", get(health::handler))
        .merge(image_routes)
}
