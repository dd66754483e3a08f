//! cf2tf: export live Cloudflare configuration as Terraform.
//!
//! Records flow [`resource`] (fetch) → [`transform`] (reshape) →
//! [`output`] (HCL or import ids), driven by [`export::ExportContext`].

pub mod cloudflare;
pub mod config;
pub mod export;
pub mod output;
pub mod resource;
pub mod transform;
