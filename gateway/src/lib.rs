//! Image upload gateway
//!
//! Accepts image uploads over HTTP, stores them in an object-storage bucket
//! and returns their public URLs. Uploads and deletes are gated by a shared
//! secret bearer credential and a per-client quota.

#![warn(missing_docs)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

/// Authentication, quota and batch validation
pub mod admission;

/// Blob store contract and upload orchestration
pub mod media_storage;

/// Request middleware
pub mod middleware;

/// HTTP routes
#[allow(missing_docs)]
pub mod routes;

/// Server bootstrap
pub mod server;

/// Configuration, errors and extractors
pub mod types;
