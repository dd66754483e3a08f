//! Cloudflare API interaction module
//!
//! This module provides the pieces needed to talk to the Cloudflare v4 REST
//! API: credentials, the HTTP wrapper that unpacks response envelopes, and the
//! client that ties both to a base URL.
//!
//! # Module Structure
//!
//! - [`auth`] - API token or global key credentials
//! - [`client`] - Main Cloudflare client for making API requests
//! - [`error`] - Typed API errors (not found vs. everything else)
//! - [`http`] - HTTP utilities and the response envelope
//!
//! # Example
//!
//! ```ignore
//! use cf2tf::cloudflare::{auth::Credentials, client::CloudflareClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = CloudflareClient::new(Credentials::token("abc"), None)?;
//!     let page = client.get("/zones/023e105f4ecef8ad9ca31a8372d0c353/dns_records", &[]).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
