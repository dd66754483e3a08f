//! Resource abstraction layer
//!
//! This module provides a data-driven approach to exporting Cloudflare
//! resources. Resource definitions are loaded from JSON files at compile time,
//! so a new resource type is usually a JSON entry rather than code.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`fetcher`] - Fetches records from the API with pagination support
//! - [`enrich`] - Merges per-record detail fetches into listed records
//! - [`scope`] - Zone or account an export runs against
//! - [`template`] - `{placeholder}` expansion for endpoints and import ids
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `zone.json` - DNS, page rules, firewall, load balancers, zone settings
//! - `account.json` - members, lists, pools, monitors, tunnels
//! - `zero_trust.json` - Access, Gateway, device and DLP resources
//! - `storage.json` - R2, Workers KV and Workers resources

pub mod enrich;
pub mod fetcher;
mod registry;
pub mod scope;
pub mod template;

pub use fetcher::{discover_params, fetch_all, ParamBatch};
pub use registry::*;
pub use scope::{ScopeKind, ScopeRef};
