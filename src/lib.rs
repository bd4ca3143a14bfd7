// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # easyclient - HTTP client with reusable defaults
//!
//! Configure headers, cookies, proxy, redirect policy, timeout and transport
//! once on a [`Client`], then send requests that override any of them for a
//! single call. Connection handling, TLS and redirect following are done by
//! reqwest.
//!
//! ## Example
//!
//! ```rust,no_run
//! use easyclient::{Client, ClientOptions, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Options given here persist for every request made with this client.
//!     let client = Client::new(ClientOptions::new().header("api-key", "123"))?;
//!
//!     // Options given here only apply to this request.
//!     let (response, body) = client
//!         .execute(
//!             RequestOptions::get("https://httpbin.org/headers")
//!                 .header("user-agent", "easyclient")
//!                 .cookie("foo", "bar")
//!                 .read_response_body(true),
//!         )
//!         .await?;
//!
//!     println!("{} {}", response.status, String::from_utf8_lossy(&body.unwrap_or_default()));
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Mutators take `&mut self`; [`Client::execute`] takes `&self` and never
//! changes client state, so a shared client can serve concurrent requests,
//! each with its own per-request proxy.

pub mod error;
pub mod http;

pub use error::{BoxError, Error, Result};
pub use http::{
    Client, ClientOptions, Cookie, CookieJar, CookieSeed, RequestOptions, Response, RoundTripper,
    SameSite, Transport, DEFAULT_TIMEOUT,
};

/// easyclient version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
