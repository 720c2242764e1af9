use std::fmt;

use axum::http::HeaderMap;

/// Header the client identity is read from
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Identity used when the request carries no usable forwarding header
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit bucket key derived from the request origin
///
/// This is not an authenticated identity. Every request that reaches the
/// gateway without an `X-Forwarded-For` header shares the `unknown` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Wraps a raw identity value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives the identity from the raw `X-Forwarded-For` value
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map_or_else(|| Self::new(UNKNOWN_CLIENT), Self::new)
    }

    /// Identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_uses_raw_forwarded_for_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR_HEADER,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            ClientIdentity::from_headers(&headers).as_str(),
            "203.0.113.7, 10.0.0.1"
        );
    }

    #[test]
    fn test_missing_or_empty_header_is_unknown() {
        assert_eq!(
            ClientIdentity::from_headers(&HeaderMap::new()).as_str(),
            UNKNOWN_CLIENT
        );

        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static(""));
        assert_eq!(ClientIdentity::from_headers(&headers).as_str(), UNKNOWN_CLIENT);
    }
}
