//! Per-record fetch-and-merge
//!
//! Some list endpoints omit a field that only the detail endpoint returns
//! (ruleset rules, list items). For those types each record gets one extra
//! request and the fetched value is merged back in. Records that cannot be
//! enriched are kept as they are, with a warning.

use super::fetcher::{expand_path, fetch_pages};
use super::registry::EnrichDef;
use super::scope::ScopeRef;
use crate::cloudflare::client::CloudflareClient;
use crate::transform::value;
use anyhow::{Context, Result};
use serde_json::Value;

/// Fill `enrich.target` of every record from its detail endpoint
pub async fn enrich_records(
    client: &CloudflareClient,
    enrich: &EnrichDef,
    scope: &ScopeRef,
    param: Option<&str>,
    mut records: Vec<Value>,
) -> Result<Vec<Value>> {
    for record in records.iter_mut() {
        let Some(id) = value::opt_scalar_string(record, &enrich.id_field)? else {
            tracing::warn!(
                "Record without `{}` not enriched with `{}`",
                enrich.id_field,
                enrich.target
            );
            continue;
        };

        let path = expand_path(&enrich.endpoint, scope, param, Some(&id))?;
        let fetched = match fetch_pages(client, &path, &[], true).await {
            Ok(fetched) => fetched,
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} not found; `{}` left as listed", path, enrich.target);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to enrich from {}", path)),
        };

        let Some(merged) = merged_value(enrich, fetched)? else {
            tracing::warn!("{} returned nothing for `{}`", path, enrich.target);
            continue;
        };
        value::insert(record, &enrich.target, merged)?;
    }

    Ok(records)
}

/// The value to merge from a detail fetch, if it returned anything usable
fn merged_value(enrich: &EnrichDef, fetched: Vec<Value>) -> Result<Option<Value>> {
    match &enrich.source {
        Some(source) => {
            let Some(detail) = fetched.into_iter().next() else {
                return Ok(None);
            };
            Ok(value::lookup(&detail, source).filter(|v| !v.is_null()).cloned())
        }
        None if fetched.is_empty() => Ok(None),
        None => Ok(Some(Value::Array(fetched))),
    }
}
