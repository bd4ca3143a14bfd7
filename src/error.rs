// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for easyclient
//!
//! Every failure is returned to the caller. Configuration and request-build
//! errors happen before any network I/O; transport and body-read errors
//! carry the URL (and, for body reads, the response that was obtained).
//! A deadline that expires during the body read is still a timeout.

use thiserror::Error;

use crate::http::Response;

/// Result type alias for easyclient operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by custom transports
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for easyclient
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed proxy or cookie URL, or a client that could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed method, URL, header or body for the outgoing request
    #[error("Invalid request: {0}")]
    RequestBuild(String),

    /// Connection, TLS or protocol failure while sending
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The executor deadline expired
    #[error("Request to {url} timed out after {duration_ms}ms")]
    Timeout { url: String, duration_ms: u64 },

    /// Response body was not the expected JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response arrived but its body could not be read
    #[error("Failed to read response body from {}: {source}", .response.url)]
    BodyRead {
        response: Box<Response>,
        #[source]
        source: reqwest::Error,
    },

    /// The deadline expired while the body was being read
    #[error("Reading response body from {} timed out after {duration_ms}ms", .response.url)]
    BodyTimeout {
        response: Box<Response>,
        duration_ms: u64,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a request-build error
    pub fn request_build<S: Into<String>>(msg: S) -> Self {
        Error::RequestBuild(msg.into())
    }

    /// Create a transport error from any error source
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(url: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            url: url.into(),
            duration_ms,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is a request-build error
    pub fn is_request_build(&self) -> bool {
        matches!(self, Error::RequestBuild(_))
    }

    /// Check if this is a network-layer failure (timeouts included)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::Timeout { .. } | Error::BodyTimeout { .. }
        )
    }

    /// Check if the deadline expired, before or after the response head
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::BodyTimeout { .. })
    }

    /// Check if this is a body-read failure
    pub fn is_body_read(&self) -> bool {
        matches!(self, Error::BodyRead { .. })
    }

    /// Get the request URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::Transport { url, .. } | Error::Timeout { url, .. } => Some(url),
            Error::BodyRead { response, .. } | Error::BodyTimeout { response, .. } => {
                Some(response.url.as_str())
            }
            _ => None,
        }
    }

    /// Response obtained before a body-read failure or body timeout
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::BodyRead { response, .. } | Error::BodyTimeout { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }

    /// Take the response out of a body-read failure or body timeout
    pub fn into_response(self) -> Option<Response> {
        match self {
            Error::BodyRead { response, .. } | Error::BodyTimeout { response, .. } => {
                Some(*response)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = Error::config("Invalid proxy URL");

        assert!(err.is_config());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Configuration error: Invalid proxy URL");
        assert!(err.url().is_none());
    }

    #[test]
    fn test_timeout_is_transport() {
        let err = Error::timeout("https://example.com", 5000);

        assert!(err.is_timeout());
        assert!(err.is_transport());
        assert_eq!(err.url(), Some("https://example.com"));
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::transport("http://127.0.0.1:1", io);

        assert!(err.is_transport());
        assert!(!err.is_timeout());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_request_build_has_no_response() {
        let err = Error::request_build("bad method");

        assert!(err.is_request_build());
        assert!(err.response().is_none());
        assert!(err.into_response().is_none());
    }
}
