// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request executor
//!
//! Holds the settings every request is sent with (transport, timeout,
//! redirect policy, cookie store) and turns them into a reqwest client.
//! The client for the configured transport is built once and cached until a
//! setting changes. A per-request proxy gets its own client, so sending never
//! touches the stored transport.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::cookie::CookieStore;
use reqwest::header::{
    HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION,
    SET_COOKIE,
};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use tracing::{debug, trace};
use url::Url;

use super::cookie::CookieJar;
use super::transport::{RoundTripper, Transport};
use crate::error::{Error, Result};

/// Hop limit for redirects the executor follows on behalf of custom transports
const MAX_REDIRECTS: usize = 10;

#[derive(Debug)]
pub(crate) struct Executor {
    transport: Transport,
    timeout: Option<Duration>,
    follow_redirects: bool,
    cookie_jar: CookieJar,
    cached: Mutex<Option<reqwest::Client>>,
}

impl Executor {
    pub fn new(transport: Transport, timeout: Option<Duration>, follow_redirects: bool) -> Self {
        Self {
            transport,
            timeout,
            follow_redirects,
            cookie_jar: CookieJar::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn set_transport(&mut self, transport: Transport) {
        self.transport = transport;
        self.invalidate();
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
        self.invalidate();
    }

    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn set_follow_redirects(&mut self, follow: bool) {
        self.follow_redirects = follow;
        self.invalidate();
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    pub fn replace_cookie_jar(&mut self, jar: CookieJar) {
        self.cookie_jar = jar;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        *self.cached.get_mut() = None;
    }

    /// Send one request. `route` overrides the configured transport for this
    /// call only.
    pub async fn send(
        &self,
        mut request: reqwest::Request,
        route: Option<&Transport>,
    ) -> Result<reqwest::Response> {
        let url = request.url().clone();
        let request_cookies = request.headers().get(COOKIE).cloned();
        self.attach_stored_cookies(&mut request)?;

        let transport = route.unwrap_or(&self.transport);
        debug!(
            method = %request.method(),
            url = %url,
            transport = transport.kind(),
            "Sending request"
        );

        match transport {
            Transport::Custom(round_tripper) => {
                self.round_trip(round_tripper.as_ref(), request, request_cookies, &url)
                    .await
            }
            _ => {
                let client = match route {
                    Some(route) => self.build_client(route)?,
                    None => self.shared_client()?,
                };
                client
                    .execute(request)
                    .await
                    .map_err(|e| self.classify(&url, e))
            }
        }
    }

    /// Store cookies are appended after any request-scoped cookies. reqwest
    /// skips its own store lookup when a Cookie header is already present.
    fn attach_stored_cookies(&self, request: &mut reqwest::Request) -> Result<()> {
        let Some(stored) = self.cookie_jar.get_cookie_header(request.url()) else {
            return Ok(());
        };
        let merged = match request.headers().get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, stored),
            _ => stored,
        };
        let value = HeaderValue::from_str(&merged)
            .map_err(|_| Error::request_build("Invalid characters in stored cookies"))?;
        request.headers_mut().insert(COOKIE, value);
        Ok(())
    }

    async fn round_trip(
        &self,
        round_tripper: &dyn RoundTripper,
        request: reqwest::Request,
        request_cookies: Option<HeaderValue>,
        url: &Url,
    ) -> Result<reqwest::Response> {
        let pending = self.round_trip_hops(round_tripper, request, request_cookies);
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending)
                .await
                .map_err(|_| Error::timeout(url.as_str(), timeout.as_millis() as u64))?,
            None => pending.await,
        }
    }

    /// Custom transports route single requests; the redirect policy is
    /// applied here. Every hop gets the stored cookies for its URL and
    /// stores the `Set-Cookie` headers of its response.
    async fn round_trip_hops(
        &self,
        round_tripper: &dyn RoundTripper,
        mut request: reqwest::Request,
        request_cookies: Option<HeaderValue>,
    ) -> Result<reqwest::Response> {
        let origin = request.url().clone();
        let mut headers = request.headers().clone();
        headers.remove(COOKIE);
        let mut hops = 0;

        loop {
            let url = request.url().clone();
            let method = request.method().clone();
            let replay = if self.follow_redirects {
                request.try_clone()
            } else {
                None
            };

            let response = round_tripper
                .round_trip(request)
                .await
                .map_err(|source| Error::Transport {
                    url: url.to_string(),
                    source,
                })?;
            let answered = response.url().clone();
            {
                let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
                CookieStore::set_cookies(&self.cookie_jar, &mut set_cookies, &answered);
            }
            trace!(url = %answered, "Custom transport returned {}", response.status());

            if !self.follow_redirects {
                return Ok(response);
            }
            let Some(target) = redirect_target(&response, &url) else {
                return Ok(response);
            };
            let Some(mut next) = next_hop(response.status(), method, replay, target) else {
                return Ok(response);
            };
            if hops == MAX_REDIRECTS {
                return Err(Error::transport(
                    origin.as_str(),
                    format!("stopped after {} redirects", MAX_REDIRECTS),
                ));
            }
            hops += 1;

            let mut hop_headers = headers.clone();
            if next.body().is_none() {
                hop_headers.remove(CONTENT_TYPE);
                hop_headers.remove(CONTENT_LENGTH);
                hop_headers.remove(CONTENT_ENCODING);
            }
            if next.url().host_str() != origin.host_str() {
                hop_headers.remove(AUTHORIZATION);
            } else if let Some(cookies) = &request_cookies {
                hop_headers.insert(COOKIE, cookies.clone());
            }
            *next.headers_mut() = hop_headers;
            self.attach_stored_cookies(&mut next)?;

            debug!(
                method = %next.method(),
                url = %next.url(),
                hop = hops,
                "Following redirect"
            );
            request = next;
        }
    }

    fn shared_client(&self) -> Result<reqwest::Client> {
        let mut cached = self.cached.lock();
        if let Some(client) = cached.as_ref() {
            return Ok(client.clone());
        }
        let client = self.build_client(&self.transport)?;
        *cached = Some(client.clone());
        Ok(client)
    }

    fn build_client(&self, transport: &Transport) -> Result<reqwest::Client> {
        let policy = if self.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .redirect(policy)
            .cookie_provider(Arc::new(self.cookie_jar.clone()));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match transport {
            Transport::Direct => builder.no_proxy(),
            Transport::Proxy(proxy_url) => builder.proxy(
                reqwest::Proxy::all(proxy_url.clone())
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            ),
            Transport::Platform | Transport::Custom(_) => builder,
        };

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            let duration_ms = self.timeout.map_or(0, |t| t.as_millis() as u64);
            return Error::timeout(url.as_str(), duration_ms);
        }
        if error.is_builder() {
            return Error::request_build(error.to_string());
        }
        Error::transport(url.as_str(), error)
    }
}

/// Absolute target of a redirect response
fn redirect_target(response: &reqwest::Response, base: &Url) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    base.join(location).ok()
}

/// Request for the next hop. 303, and 301/302 after a POST, switch to a
/// bodiless GET; other redirects replay the request, which needs a body
/// that can be cloned.
fn next_hop(
    status: StatusCode,
    method: Method,
    replay: Option<reqwest::Request>,
    target: Url,
) -> Option<reqwest::Request> {
    let drop_body = match status {
        StatusCode::SEE_OTHER => method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => method == Method::POST,
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => false,
        _ => return None,
    };
    if drop_body {
        return Some(reqwest::Request::new(Method::GET, target));
    }
    let mut next = replay?;
    *next.url_mut() = target;
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> Executor {
        Executor::new(Transport::Direct, Some(Duration::from_secs(30)), false)
    }

    #[test]
    fn test_shared_client_is_cached_until_settings_change() {
        let mut executor = executor();

        executor.shared_client().unwrap();
        assert!(executor.cached.lock().is_some());

        executor.set_follow_redirects(true);
        assert!(executor.cached.lock().is_none());

        executor.shared_client().unwrap();
        executor.set_transport(Transport::Platform);
        assert!(executor.cached.lock().is_none());
    }

    #[test]
    fn test_stored_cookies_follow_request_cookies() {
        let executor = executor();
        let url = Url::parse("https://example.com/").unwrap();
        executor
            .cookie_jar()
            .add_from_header("stored=1", &url);

        let mut request = reqwest::Request::new(reqwest::Method::GET, url.clone());
        request
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_static("req=2"));
        executor.attach_stored_cookies(&mut request).unwrap();
        assert_eq!(request.headers().get(COOKIE).unwrap(), "req=2; stored=1");

        let mut bare = reqwest::Request::new(reqwest::Method::GET, url);
        executor.attach_stored_cookies(&mut bare).unwrap();
        assert_eq!(bare.headers().get(COOKIE).unwrap(), "stored=1");
    }

    #[test]
    fn test_replacing_jar_detaches_old_cookies() {
        let mut executor = executor();
        let url = Url::parse("https://example.com/").unwrap();
        let old = executor.cookie_jar().clone();
        old.add_from_header("a=1", &url);

        executor.replace_cookie_jar(CookieJar::new());

        assert!(executor.cookie_jar().is_empty());
        assert_eq!(old.len(), 1);
    }

    #[test]
    fn test_next_hop_method_rules() {
        let target = Url::parse("https://example.com/next").unwrap();
        let post = || {
            let mut request =
                reqwest::Request::new(Method::POST, Url::parse("https://example.com/form").unwrap());
            *request.body_mut() = Some(reqwest::Body::from("a=1"));
            request
        };

        let next = next_hop(StatusCode::SEE_OTHER, Method::POST, Some(post()), target.clone())
            .unwrap();
        assert_eq!(next.method(), Method::GET);
        assert!(next.body().is_none());
        assert_eq!(next.url(), &target);

        let next = next_hop(
            StatusCode::TEMPORARY_REDIRECT,
            Method::POST,
            Some(post()),
            target.clone(),
        )
        .unwrap();
        assert_eq!(next.method(), Method::POST);
        assert_eq!(next.body().and_then(|b| b.as_bytes()), Some(&b"a=1"[..]));

        assert!(next_hop(StatusCode::PERMANENT_REDIRECT, Method::PUT, None, target.clone()).is_none());
        assert!(next_hop(StatusCode::NOT_MODIFIED, Method::GET, Some(post()), target).is_none());
    }
}
