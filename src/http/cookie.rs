// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar implementation for persistent cookie storage
//!
//! The jar doubles as reqwest's cookie provider, so `Set-Cookie` headers on
//! every hop (redirects included) land here and outgoing requests read from
//! it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

/// Upper bound for Max-Age so expiry arithmetic cannot overflow
const MAX_AGE_LIMIT_SECS: i64 = i32::MAX as i64;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: SameSite,
    /// Only sent to the exact host, not its subdomains
    pub host_only: bool,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// Cookie sent with all requests
    #[default]
    None,
    /// Cookie sent with same-site and top-level navigations
    Lax,
    /// Cookie only sent with same-site requests
    Strict,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
            host_only: false,
        }
    }

    /// Create a host-only cookie scoped to `url` with the URL's default path
    pub fn for_url(name: impl Into<String>, value: impl Into<String>, url: &Url) -> Self {
        let mut cookie = Cookie::new(name, value);
        cookie.domain = url.host_str().unwrap_or("").to_ascii_lowercase();
        cookie.path = default_path(url);
        cookie.host_only = true;
        cookie
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into().trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set http_only flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set same_site attribute
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp <= Utc::now())
    }

    /// Check if the cookie would be sent to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        if !self.domain_matches(&host) {
            return false;
        }

        if !path_matches(&self.path, url.path()) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }
        if self.host_only {
            return host == self.domain;
        }
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }

    /// Parse a Set-Cookie header value received from `url`
    ///
    /// Returns `None` for malformed headers and for a `Domain` attribute the
    /// host is not allowed to set.
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::for_url(name, value.trim().trim_matches('"'), url);
        let mut max_age = None;

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" if !val.is_empty() => {
                        let domain = val.trim_start_matches('.').to_ascii_lowercase();
                        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
                        if host != domain && !host.ends_with(&format!(".{}", domain)) {
                            return None;
                        }
                        cookie.domain = domain;
                        cookie.host_only = false;
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => max_age = val.parse::<i64>().ok(),
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            _ => SameSite::None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        // Max-Age wins over Expires; zero or negative expires immediately
        if let Some(secs) = max_age {
            let secs = secs.clamp(0, MAX_AGE_LIMIT_SECS);
            cookie.expires = Utc::now().checked_add_signed(chrono::Duration::seconds(secs));
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Default cookie path for a URL: the directory of its path
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Whether a name/value pair can be sent in a `Cookie` header: the name is
/// an HTTP token and the value is made of cookie octets, optionally quoted.
pub(crate) fn is_valid_pair(name: &str, value: &str) -> bool {
    let is_tchar = |b: u8| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b);
    let is_octet = |b: u8| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E);

    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    !name.is_empty() && name.bytes().all(is_tchar) && value.bytes().all(is_octet)
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Thread-safe cookie storage
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Add a cookie, replacing any with the same name, domain and path
    ///
    /// An already-expired cookie only deletes its counterpart.
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            trace!(name = %cookie.name, domain = %cookie.domain, "Storing cookie");
            self.add(cookie);
        }
    }

    /// Store name/value pairs as host-only cookies scoped to `url`
    pub fn seed(&self, url: &Url, cookies: &HashMap<String, String>) {
        for (name, value) in cookies {
            self.add(Cookie::for_url(name.as_str(), value.as_str(), url));
        }
    }

    /// Get all cookies for a URL, longest path first
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        let mut result = Vec::new();

        for entry in self.cookies.iter() {
            for cookie in entry.value().iter() {
                if cookie.matches(url) {
                    result.push(cookie.clone());
                }
            }
        }

        self.remove_expired();

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.name.cmp(&b.name))
        });
        result
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) {
        if let Some(mut cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name || c.path != path);
        }
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Clear cookies for a specific domain
    pub fn clear_domain(&self, domain: &str) {
        self.cookies.remove(domain);
    }

    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export all cookies as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        let all_cookies: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|e| e.value().clone())
            .collect();
        serde_json::to_string(&all_cookies)
    }

    /// Import cookies from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let cookies: Vec<Cookie> = serde_json::from_str(json)?;
        let jar = CookieJar::new();
        for cookie in cookies {
            jar.add(cookie);
        }
        Ok(jar)
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(value) = header.to_str() {
                self.add_from_header(value, url);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.get_cookie_header(url)
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_cookie_parsing() {
        let url = url("https://example.com/path");
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert!(!cookie.host_only);
    }

    #[test]
    fn test_cookie_parsing_rejects_foreign_domain() {
        let url = url("https://example.com/");
        assert!(Cookie::parse("a=b; Domain=evil.com", &url).is_none());
        assert!(Cookie::parse("=b", &url).is_none());
        assert!(Cookie::parse("novalue", &url).is_none());
    }

    #[test]
    fn test_max_age_zero_deletes() {
        let jar = CookieJar::new();
        let url = url("https://example.com/");

        jar.add_from_header("token=1", &url);
        assert_eq!(jar.len(), 1);

        jar.add_from_header("token=1; Max-Age=0", &url);
        assert!(jar.get_cookies(&url).is_empty());
    }

    #[test]
    fn test_cookie_jar() {
        let jar = CookieJar::new();
        let url = url("https://example.com/path");

        jar.add(Cookie::new("test", "value").domain("example.com"));
        assert_eq!(jar.len(), 1);

        let cookies = jar.get_cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "test");
    }

    #[test]
    fn test_seed_is_host_only() {
        let jar = CookieJar::new();
        let mut map = HashMap::new();
        map.insert("foo".to_string(), "bar".to_string());
        jar.seed(&url("https://example.com"), &map);

        let cookies = jar.get_cookies(&url("https://example.com/any/path"));
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].to_header_value(), "foo=bar");

        assert!(jar.get_cookies(&url("https://sub.example.com/")).is_empty());
        assert!(jar.get_cookies(&url("https://other.com/")).is_empty());
    }

    #[test]
    fn test_seed_replaces_same_name() {
        let jar = CookieJar::new();
        let target = url("https://example.com");
        let mut map = HashMap::new();
        map.insert("foo".to_string(), "bar".to_string());
        jar.seed(&target, &map);
        map.insert("foo".to_string(), "baz".to_string());
        jar.seed(&target, &map);

        let cookies = jar.get_cookies(&target);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "baz");
    }

    #[test]
    fn test_default_path() {
        assert_eq!(default_path(&url("https://example.com")), "/");
        assert_eq!(default_path(&url("https://example.com/a")), "/");
        assert_eq!(default_path(&url("https://example.com/a/b")), "/a");
        assert_eq!(default_path(&url("https://example.com/a/b/")), "/a/b");
    }

    #[test]
    fn test_path_matching() {
        assert!(path_matches("/", "/anything"));
        assert!(path_matches("/docs", "/docs"));
        assert!(path_matches("/docs", "/docs/page"));
        assert!(!path_matches("/docs", "/docsearch"));
        assert!(!path_matches("/docs", "/"));
    }

    #[test]
    fn test_secure_cookie_needs_https() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("s", "1").domain("example.com").secure(true));

        assert!(jar.get_cookies(&url("http://example.com/")).is_empty());
        assert_eq!(jar.get_cookies(&url("https://example.com/")).len(), 1);
    }

    #[test]
    fn test_cookie_header_orders_longest_path_first() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("b", "root").domain("example.com"));
        jar.add(Cookie::new("a", "deep").domain("example.com").path("/api"));

        let header = jar.get_cookie_header(&url("https://example.com/api/v1"));
        assert_eq!(header.as_deref(), Some("a=deep; b=root"));
    }

    #[test]
    fn test_cookie_store_roundtrip_through_headers() {
        let jar = CookieJar::new();
        let target = url("https://example.com/");
        let headers = [
            HeaderValue::from_static("one=1; Path=/"),
            HeaderValue::from_static("two=2"),
        ];

        CookieStore::set_cookies(&jar, &mut headers.iter(), &target);

        let value = CookieStore::cookies(&jar, &target).unwrap();
        assert_eq!(value.to_str().unwrap(), "one=1; two=2");
    }

    #[test]
    fn test_json_export_import() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("k", "v").domain("example.com"));

        let json = jar.to_json().unwrap();
        let restored = CookieJar::from_json(&json).unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.get_cookie_header(&url("https://example.com/")).as_deref(),
            Some("k=v")
        );
    }

    #[test]
    fn test_clear() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("a", "1").domain("example.com"));
        jar.add(Cookie::new("b", "2").domain("other.com"));

        jar.clear_domain("other.com");
        assert_eq!(jar.len(), 1);

        jar.clear();
        assert!(jar.is_empty());
    }

    #[test]
    fn test_cookie_pair_validation() {
        assert!(is_valid_pair("session", "abc123"));
        assert!(is_valid_pair("token", "\"quoted\""));
        assert!(is_valid_pair("empty", ""));

        assert!(!is_valid_pair("", "x"));
        assert!(!is_valid_pair("bad name", "x"));
        assert!(!is_valid_pair("name", "caf\u{e9}"));
        assert!(!is_valid_pair("name", "line\nbreak"));
        assert!(!is_valid_pair("name", "a;b"));
    }
}
