//! Shape transformer
//!
//! Bridges the Cloudflare API's wire format and the Terraform provider's
//! schema. Every resource definition carries an ordered list of [`Step`]s;
//! [`transform`] looks the definition up and runs its steps over the fetched
//! records. The whole module is pure: no I/O, no shared state.
//!
//! # Module Structure
//!
//! - [`value`] - typed accessors over `serde_json::Value` and [`TransformError`]
//! - [`steps`] - declarative steps (delete, rename, denest, pairs, ...)
//! - [`custom`] - named strategies for shapes that need code

pub mod custom;
pub mod steps;
pub mod value;

pub use steps::Step;
pub use value::TransformError;

use crate::resource::get_resource;
use serde_json::Value;

/// Reshape `records` of `resource_type` into the provider's schema.
///
/// `path_param` is the parent the records were fetched under (bucket name,
/// script name), if any. Unknown resource types pass through unchanged.
pub fn transform(
    resource_type: &str,
    records: Vec<Value>,
    path_param: Option<&str>,
) -> value::Result<Vec<Value>> {
    let Some(def) = get_resource(resource_type) else {
        tracing::debug!("No transforms registered for {}", resource_type);
        return Ok(records);
    };
    apply_steps(&def.transforms, records, path_param)
}

/// Run `steps` in order over `records`
pub fn apply_steps(
    steps: &[Step],
    records: Vec<Value>,
    path_param: Option<&str>,
) -> value::Result<Vec<Value>> {
    steps
        .iter()
        .try_fold(records, |records, step| step.apply(records, path_param))
}
