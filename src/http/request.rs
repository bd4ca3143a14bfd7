// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-request options and request preparation

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Body, Method};
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Options for a single request
///
/// Everything here applies to one call only. Headers overlay the client's
/// default headers; cookies are sent with this request but never stored.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// HTTP method; empty means GET
    pub method: String,
    /// Target URL
    pub url: String,
    /// Request body
    pub body: Option<Body>,
    /// Headers for this request, winning over client defaults
    pub headers: HashMap<String, String>,
    /// Request-scoped cookies
    pub cookies: HashMap<String, String>,
    /// Proxy for this request only
    pub proxy: Option<String>,
    /// Read the whole response body before returning
    pub read_response_body: bool,
}

impl RequestOptions {
    /// Create options for an arbitrary method
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create options for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Create options for a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set JSON body and content type
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let json = serde_json::to_vec(data)
            .map_err(|e| Error::request_build(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(Body::from(json));
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set multiple headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Add a request-scoped cookie
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Route this request through a proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Read the response body into memory
    pub fn read_response_body(mut self, read: bool) -> Self {
        self.read_response_body = read;
        self
    }

    /// Build the outgoing request: method/URL/body, request cookies, then
    /// `default_headers` overlaid with this request's headers.
    pub(crate) fn prepare(
        self,
        default_headers: &HashMap<String, String>,
    ) -> Result<PreparedRequest> {
        let method = parse_method(&self.method)?;
        let url = Url::parse(&self.url)
            .map_err(|e| Error::request_build(format!("Invalid URL '{}': {}", self.url, e)))?;

        let mut request = reqwest::Request::new(method, url);
        *request.body_mut() = self.body;

        let headers = request.headers_mut();
        if let Some(cookie_header) = cookie_header(&self.cookies)? {
            headers.insert(COOKIE, cookie_header);
        }
        apply_headers(headers, default_headers)?;
        apply_headers(headers, &self.headers)?;

        let proxy = self.proxy.filter(|p| !p.is_empty());

        Ok(PreparedRequest {
            request,
            proxy,
            read_response_body: self.read_response_body,
        })
    }
}

/// A built request plus the per-call settings that travel with it
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub request: reqwest::Request,
    pub proxy: Option<String>,
    pub read_response_body: bool,
}

fn parse_method(method: &str) -> Result<Method> {
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.as_bytes())
        .map_err(|_| Error::request_build(format!("Invalid HTTP method '{}'", method)))
}

/// Overwrite by key: a name set here replaces every earlier value for it
fn apply_headers(target: &mut HeaderMap, headers: &HashMap<String, String>) -> Result<()> {
    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|_| Error::request_build(format!("Invalid header name '{}'", name)))?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|_| {
            Error::request_build(format!("Invalid value for header '{}'", name))
        })?;
        target.insert(name, value);
    }
    Ok(())
}

fn cookie_header(cookies: &HashMap<String, String>) -> Result<Option<HeaderValue>> {
    if cookies.is_empty() {
        return Ok(None);
    }
    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort();
    let header = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&header)
        .map(Some)
        .map_err(|_| Error::request_build("Invalid characters in request cookies"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("api-key".to_string(), "123".to_string());
        headers.insert("user-agent".to_string(), "client-default".to_string());
        headers
    }

    #[test]
    fn test_request_creation() {
        let prepared = RequestOptions::get("https://example.com/path")
            .prepare(&HashMap::new())
            .unwrap();

        assert_eq!(prepared.request.method(), Method::GET);
        assert_eq!(prepared.request.url().host_str(), Some("example.com"));
        assert!(prepared.request.body().is_none());
        assert!(prepared.proxy.is_none());
        assert!(!prepared.read_response_body);
    }

    #[test]
    fn test_request_headers_override_defaults() {
        let prepared = RequestOptions::get("https://example.com")
            .header("User-Agent", "easyclient")
            .header("x-custom", "value")
            .prepare(&defaults())
            .unwrap();

        let headers = prepared.request.headers();
        assert_eq!(headers.get("api-key").unwrap(), "123");
        assert_eq!(headers.get("user-agent").unwrap(), "easyclient");
        assert_eq!(headers.get_all("user-agent").iter().count(), 1);
        assert_eq!(headers.get("x-custom").unwrap(), "value");
    }

    #[test]
    fn test_request_cookies_become_header() {
        let prepared = RequestOptions::get("https://example.com")
            .cookie("foo", "bar")
            .cookie("alpha", "1")
            .prepare(&HashMap::new())
            .unwrap();

        assert_eq!(
            prepared.request.headers().get(COOKIE).unwrap(),
            "alpha=1; foo=bar"
        );
    }

    #[test]
    fn test_empty_method_is_get() {
        let prepared = RequestOptions::new("", "https://example.com")
            .prepare(&HashMap::new())
            .unwrap();
        assert_eq!(prepared.request.method(), Method::GET);
    }

    #[test]
    fn test_invalid_inputs_are_request_build_errors() {
        let err = RequestOptions::new("BAD METHOD", "https://example.com")
            .prepare(&HashMap::new())
            .unwrap_err();
        assert!(err.is_request_build());

        let err = RequestOptions::get("not a url")
            .prepare(&HashMap::new())
            .unwrap_err();
        assert!(err.is_request_build());

        let err = RequestOptions::get("https://example.com")
            .header("bad header", "x")
            .prepare(&HashMap::new())
            .unwrap_err();
        assert!(err.is_request_build());

        let err = RequestOptions::get("https://example.com")
            .header("x-ok", "line\nbreak")
            .prepare(&HashMap::new())
            .unwrap_err();
        assert!(err.is_request_build());
    }

    #[test]
    fn test_empty_proxy_is_ignored() {
        let prepared = RequestOptions::get("https://example.com")
            .proxy("")
            .prepare(&HashMap::new())
            .unwrap();
        assert!(prepared.proxy.is_none());
    }

    #[test]
    fn test_json_body() {
        #[derive(Serialize)]
        struct Payload {
            foo: &'static str,
        }

        let prepared = RequestOptions::post("https://httpbin.org/post")
            .json(&Payload { foo: "bar" })
            .unwrap()
            .prepare(&HashMap::new())
            .unwrap();

        assert_eq!(prepared.request.method(), Method::POST);
        assert_eq!(
            prepared.request.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = prepared.request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"foo":"bar"}"#);
    }
}
