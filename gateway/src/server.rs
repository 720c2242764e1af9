use std::sync::Arc;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    admission::{AdmissionPipeline, CredentialValidator, QuotaTracker},
    media_storage::MediaStorage,
    routes,
    types::GatewayConfig,
};

/// Wires the routes to their shared components
///
/// A fresh quota ledger is created here, so every router built by this
/// function counts spend independently.
pub fn router(config: &GatewayConfig, media_storage: Arc<MediaStorage>) -> Router {
    let pipeline = Arc::new(AdmissionPipeline::new(
        CredentialValidator::new(config.api_secret.clone()),
        Arc::new(QuotaTracker::default()),
        config.authenticated_quota,
    ));

    routes::handler()
        .layer(Extension(pipeline))
        .layer(Extension(media_storage))
        .layer(Extension(config.policies))
}

/// Starts the server with the given configuration and storage
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(config: GatewayConfig, media_storage: Arc<MediaStorage>) -> anyhow::Result<()> {
    let router = router(&config, media_storage)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        single_upload = %config.policies.single_upload,
        multi_upload = %config.policies.multi_upload,
        authenticated_quota = %config.authenticated_quota,
        "Image gateway started on http://{addr}"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
