// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pluggable request routing
//!
//! A [`Transport`] decides how a prepared request reaches its destination:
//! through reqwest with the platform proxy settings, directly, through an
//! explicit proxy, or through a caller-supplied [`RoundTripper`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{BoxError, Error, Result};

/// Caller-supplied transport
///
/// Receives a fully prepared request (headers and cookies attached) and
/// returns the response for that single request. Implementations must not
/// follow redirects themselves: the client applies its redirect policy on
/// top, sending each hop through `round_trip` with the stored cookies for
/// that hop. The client also applies its timeout and stores any `Set-Cookie`
/// headers.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use easyclient::{BoxError, RoundTripper};
///
/// struct Logged(reqwest::Client);
///
/// #[async_trait]
/// impl RoundTripper for Logged {
///     async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response, BoxError> {
///         println!("{} {}", request.method(), request.url());
///         Ok(self.0.execute(request).await?)
///     }
/// }
///
/// let inner = reqwest::Client::builder()
///     .redirect(reqwest::redirect::Policy::none())
///     .build()
///     .unwrap();
/// let transport = easyclient::Transport::custom(Logged(inner));
/// ```
#[async_trait]
pub trait RoundTripper: Send + Sync {
    /// Send one request and return its response
    async fn round_trip(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, BoxError>;
}

/// A preconfigured reqwest client can serve as a transport. Build it with
/// `redirect(Policy::none())` so the client's redirect setting decides.
#[async_trait]
impl RoundTripper for reqwest::Client {
    async fn round_trip(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, BoxError> {
        Ok(self.execute(request).await?)
    }
}

/// How requests are routed
#[derive(Clone, Default)]
pub enum Transport {
    /// reqwest defaults, honoring proxy environment variables
    #[default]
    Platform,
    /// Bare transport: direct connections, environment proxies ignored
    Direct,
    /// All traffic through the given proxy
    Proxy(Url),
    /// Caller-supplied transport
    Custom(Arc<dyn RoundTripper>),
}

impl Transport {
    /// Route all traffic through `proxy`
    pub fn proxy(proxy: &str) -> Result<Self> {
        Ok(Transport::Proxy(parse_proxy(proxy)?))
    }

    /// Wrap a caller-supplied transport
    pub fn custom(round_tripper: impl RoundTripper + 'static) -> Self {
        Transport::Custom(Arc::new(round_tripper))
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Platform => "platform",
            Transport::Direct => "direct",
            Transport::Proxy(_) => "proxy",
            Transport::Custom(_) => "custom",
        }
    }

    /// Proxy URL if this transport routes through one
    pub fn proxy_url(&self) -> Option<&Url> {
        match self {
            Transport::Proxy(url) => Some(url),
            _ => None,
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Platform => write!(f, "Platform"),
            Transport::Direct => write!(f, "Direct"),
            Transport::Proxy(url) => f.debug_tuple("Proxy").field(&url.as_str()).finish(),
            Transport::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl PartialEq for Transport {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Transport::Platform, Transport::Platform) => true,
            (Transport::Direct, Transport::Direct) => true,
            (Transport::Proxy(a), Transport::Proxy(b)) => a == b,
            (Transport::Custom(a), Transport::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Parse and validate a proxy URL
pub(crate) fn parse_proxy(proxy: &str) -> Result<Url> {
    let url = Url::parse(proxy)
        .map_err(|e| Error::config(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
    reqwest::Proxy::all(url.clone())
        .map_err(|e| Error::config(format!("Unsupported proxy URL '{}': {}", proxy, e)))?;
    Ok(url)
}
