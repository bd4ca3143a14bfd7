// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! A long-lived [`Client`] carries default headers, cookies, proxy, redirect
//! policy, timeout and transport. Each [`RequestOptions`] can override them
//! for one call.

mod client;
mod cookie;
mod executor;
mod request;
mod response;
mod transport;

use std::time::Duration;

pub use client::{Client, ClientOptions, CookieSeed};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use request::RequestOptions;
pub use response::Response;
pub use transport::{RoundTripper, Transport};

/// Request deadline used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
