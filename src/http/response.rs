// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// HTTP response representation
///
/// Head fields are always populated. The body stays an open stream until it
/// is read with [`Response::bytes`] and friends, or dropped with the response.
#[derive(Debug)]
pub struct Response {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// HTTP version
    pub version: Version,
    /// Final URL (after redirects)
    pub url: Url,
    /// Whether a redirect was followed
    pub redirected: bool,
    /// Time until the response head arrived
    pub response_time_ms: u64,
    body: Option<reqwest::Response>,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response, requested: &Url, elapsed: Duration) -> Self {
        Self {
            status: inner.status(),
            headers: inner.headers().clone(),
            version: inner.version(),
            url: inner.url().clone(),
            redirected: inner.url() != requested,
            response_time_ms: elapsed.as_millis() as u64,
            body: Some(inner),
        }
    }

    /// Drain the body stream into memory. Later calls yield an empty body.
    pub(crate) async fn read_body(&mut self) -> std::result::Result<Bytes, reqwest::Error> {
        match self.body.take() {
            Some(inner) => inner.bytes().await,
            None => Ok(Bytes::new()),
        }
    }

    /// Read the whole body
    pub async fn bytes(mut self) -> Result<Bytes> {
        let result = self.read_body().await;
        match result {
            Ok(body) => Ok(body),
            Err(source) => Err(Error::BodyRead {
                response: Box::new(self),
                source,
            }),
        }
    }

    /// Read the body as UTF-8 text (lossy)
    pub async fn text(self) -> Result<String> {
        let body = self.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Read the body and parse it as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(Error::from)
    }

    /// Read the next chunk of the body, `None` once it is exhausted
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        let Some(inner) = self.body.as_mut() else {
            return Ok(None);
        };
        let next = inner.chunk().await;
        match next {
            Ok(Some(chunk)) => Ok(Some(chunk)),
            Ok(None) => {
                self.body = None;
                Ok(None)
            }
            Err(e) => Err(Error::transport(self.url.as_str(), e)),
        }
    }

    /// Take the unread body stream for incremental reading
    pub fn into_inner(self) -> Option<reqwest::Response> {
        self.body
    }

    /// Whether the body stream is still unread
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if status is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get all values for a header
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Redirect target, resolved against the response URL
    pub fn location(&self) -> Option<Url> {
        let location = self.headers.get(LOCATION)?.to_str().ok()?;
        self.url.join(location).ok()
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get Set-Cookie headers
    pub fn set_cookies(&self) -> Vec<&str> {
        self.header_all("set-cookie")
    }
}
