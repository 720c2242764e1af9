pub mod auth;

pub use auth::caller_middleware;
