// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use url::Url;

use super::cookie::{is_valid_pair, Cookie, CookieJar};
use super::executor::Executor;
use super::request::RequestOptions;
use super::response::Response;
use super::transport::{parse_proxy, Transport};
use super::DEFAULT_TIMEOUT;
use crate::error::{Error, Result};

/// Cookies seeded into the store when the client is built
#[derive(Debug, Clone, Default)]
pub struct CookieSeed {
    /// URL the cookies are scoped to
    pub base_url: String,
    /// Cookie names and values
    pub cookies: HashMap<String, String>,
}

/// Client construction options
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Follow redirects automatically (default: return the redirect response)
    pub follow_redirects: bool,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
    /// Proxy for every request
    pub proxy: Option<String>,
    /// Request deadline; None or zero means 30 seconds
    pub timeout: Option<Duration>,
    /// Transport override (default: platform transport)
    pub transport: Option<Transport>,
    /// Cookies to seed the store with
    pub cookies: Option<CookieSeed>,
}

impl ClientOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set redirect following
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Set a default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set default headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set transport
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Seed cookies for `base_url`
    pub fn cookies(mut self, base_url: impl Into<String>, cookies: HashMap<String, String>) -> Self {
        self.cookies = Some(CookieSeed {
            base_url: base_url.into(),
            cookies,
        });
        self
    }
}

/// HTTP client with reusable request defaults
///
/// Settings made through the mutators apply to every later request.
/// [`Client::execute`] only reads them: per-request overrides, including a
/// per-request proxy, never change the client.
#[derive(Debug)]
pub struct Client {
    executor: Executor,
    default_headers: HashMap<String, String>,
}

impl Client {
    /// Create a new client
    pub fn new(options: ClientOptions) -> Result<Self> {
        let timeout = match options.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => DEFAULT_TIMEOUT,
        };
        let transport = options.transport.unwrap_or_default();

        let mut client = Self {
            executor: Executor::new(transport, Some(timeout), options.follow_redirects),
            default_headers: options.headers,
        };

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.is_empty()) {
            client.set_proxy(proxy)?;
        }

        if let Some(seed) = options.cookies.as_ref().filter(|s| !s.base_url.is_empty()) {
            client.set_cookies(&seed.base_url, &seed.cookies)?;
        }

        Ok(client)
    }

    /// Execute a request
    ///
    /// Returns the response and, when `read_response_body` is set, the whole
    /// body. Otherwise the body stays unread on the returned [`Response`].
    /// The client timeout covers sending, redirects and the body read.
    pub async fn execute(&self, options: RequestOptions) -> Result<(Response, Option<Bytes>)> {
        let prepared = options.prepare(&self.default_headers)?;
        let requested = prepared.request.url().clone();

        let route = match prepared.proxy.as_deref() {
            Some(proxy) => Some(Transport::Proxy(parse_proxy(proxy)?)),
            None => None,
        };

        let start = Instant::now();
        let inner = self.executor.send(prepared.request, route.as_ref()).await?;
        let mut response = Response::new(inner, &requested, start.elapsed());

        if !prepared.read_response_body {
            return Ok((response, None));
        }

        // The deadline spans the whole call, so the body read gets what is left
        let timeout = self.executor.timeout();
        let result = match timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(start.elapsed());
                tokio::time::timeout(remaining, response.read_body())
                    .await
                    .ok()
            }
            None => Some(response.read_body().await),
        };

        match result {
            Some(Ok(body)) => Ok((response, Some(body))),
            Some(Err(source)) if !source.is_timeout() => Err(Error::BodyRead {
                response: Box::new(response),
                source,
            }),
            _ => Err(Error::BodyTimeout {
                response: Box::new(response),
                duration_ms: timeout.map_or(0, |t| t.as_millis() as u64),
            }),
        }
    }

    /// Default headers sent with every request
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Replace the default headers
    pub fn set_headers(&mut self, headers: HashMap<String, String>) {
        self.default_headers = headers;
    }

    /// Remove all default headers
    pub fn clear_headers(&mut self) {
        self.default_headers.clear();
    }

    /// Store cookies scoped to `url` for every later request
    ///
    /// Nothing is stored if any name or value cannot be sent in a `Cookie`
    /// header.
    pub fn set_cookies(&mut self, url: &str, cookies: &HashMap<String, String>) -> Result<()> {
        let url = parse_cookie_url(url)?;
        if let Some((name, _)) = cookies.iter().find(|(n, v)| !is_valid_pair(n, v)) {
            return Err(Error::config(format!("Invalid cookie '{}' for {}", name, url)));
        }
        self.executor.cookie_jar().seed(&url, cookies);
        Ok(())
    }

    /// Replace the cookie store with an empty one
    pub fn clear_cookies(&mut self) {
        self.executor.replace_cookie_jar(CookieJar::new());
    }

    /// Cookies the store would send to `url`
    pub fn get_cookies(&self, url: &str) -> Result<Vec<Cookie>> {
        let url = parse_cookie_url(url)?;
        Ok(self.executor.cookie_jar().get_cookies(&url))
    }

    /// The client's cookie store
    pub fn cookie_jar(&self) -> &CookieJar {
        self.executor.cookie_jar()
    }

    /// Route all traffic through `proxy`, replacing the current transport
    pub fn set_proxy(&mut self, proxy: &str) -> Result<()> {
        let proxy_url = parse_proxy(proxy)?;
        self.executor.set_transport(Transport::Proxy(proxy_url));
        Ok(())
    }

    /// Reset to a bare direct transport
    pub fn clear_proxy(&mut self) {
        self.executor.set_transport(Transport::Direct);
    }

    /// Follow redirects automatically, or stop at the first redirect response
    pub fn set_redirects(&mut self, follow: bool) {
        self.executor.set_follow_redirects(follow);
    }

    /// Whether redirects are followed
    pub fn follows_redirects(&self) -> bool {
        self.executor.follow_redirects()
    }

    /// Set the request deadline. Zero disables it.
    pub fn set_timeout(&mut self, timeout: Duration) {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        self.executor.set_timeout(timeout);
    }

    /// Current request deadline
    pub fn timeout(&self) -> Option<Duration> {
        self.executor.timeout()
    }

    /// Install a transport
    pub fn set_transport(&mut self, transport: Transport) {
        self.executor.set_transport(transport);
    }

    /// Current transport
    pub fn transport(&self) -> &Transport {
        self.executor.transport()
    }
}

fn parse_cookie_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::config(format!("Invalid cookie URL '{}': {}", url, e)))?;
    if parsed.host_str().is_none() {
        return Err(Error::config(format!("Cookie URL '{}' has no host", url)));
    }
    Ok(parsed)
}
