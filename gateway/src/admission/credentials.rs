//! Shared-secret bearer authentication

use std::fmt;

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Server-side secret that bearer tokens are compared against
#[derive(Clone, PartialEq, Eq)]
pub enum ApiSecret {
    /// A non-empty secret was configured
    Configured(String),
    /// No secret is available; every request is unauthenticated
    NotConfigured,
}

impl ApiSecret {
    /// Builds the secret from a raw configuration value, treating blank values as absent
    #[must_use]
    pub fn from_value(value: Option<String>) -> Self {
        match value {
            Some(secret) if !secret.trim().is_empty() => Self::Configured(secret),
            _ => Self::NotConfigured,
        }
    }

    /// Whether a secret is available
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured(_) => f.write_str("Configured(***)"),
            Self::NotConfigured => f.write_str("NotConfigured"),
        }
    }
}

/// Decides whether a request carries the configured bearer credential
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    secret: ApiSecret,
}

impl CredentialValidator {
    /// Creates a validator for the given secret
    #[must_use]
    pub const fn new(secret: ApiSecret) -> Self {
        Self { secret }
    }

    /// Returns true iff a secret is configured and the bearer token matches it exactly
    #[must_use]
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        let ApiSecret::Configured(secret) = &self.secret else {
            tracing::error!("API_SECRET_KEY is not configured, rejecting credential");
            return false;
        };

        bearer_token(headers)
            .is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes()))
    }
}

/// Extracts the token following the literal `Bearer ` prefix of the `Authorization` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Byte comparison whose duration does not depend on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
