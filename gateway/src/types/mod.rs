mod config;
mod environment;
mod error;
mod extractors;

pub use config::{ConfigError, GatewayConfig};
pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ValidatedJson;
