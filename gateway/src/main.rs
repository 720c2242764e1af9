use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use image_gateway::{
    media_storage::{MediaStorage, S3BlobStore},
    server,
    types::{Environment, GatewayConfig},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production, human-readable logs for development
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    let config = GatewayConfig::from_env()?;

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let bucket_name = environment.s3_bucket();
    let public_base = environment.public_url_base(&bucket_name);
    let store = Arc::new(S3BlobStore::new(s3_client, bucket_name, public_base)?);
    let media_storage = Arc::new(MediaStorage::new(store));

    server::start(config, media_storage).await
}
