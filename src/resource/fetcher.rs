//! Resource Fetcher
//!
//! Handles fetching resources from the Cloudflare API based on resource
//! definitions. Pages are requested strictly in sequence: page 1 without a
//! `page` parameter, then `page=2..=total_pages` where the total comes from
//! page 1's `result_info`. Cursor-paginated endpoints (R2 buckets, list
//! items) are followed through `cursor=<next>` until no cursor is returned.

use super::registry::{ParentDef, ResourceDef};
use super::scope::ScopeRef;
use super::template::{self, TemplateError};
use crate::cloudflare::client::CloudflareClient;
use crate::cloudflare::error::ApiError;
use crate::transform::value;
use anyhow::{Context, Result};
use serde_json::Value;

/// Records fetched under one path parameter
#[derive(Debug)]
pub struct ParamBatch {
    pub param: Option<String>,
    /// `Err` holds the not-found response that cut this parameter short
    pub records: std::result::Result<Vec<Value>, ApiError>,
}

/// Expand an endpoint template into a request path.
///
/// Every substituted value is percent-encoded; `{scope_path}` keeps its
/// separator.
pub fn expand_path(
    endpoint: &str,
    scope: &ScopeRef,
    param: Option<&str>,
    id: Option<&str>,
) -> std::result::Result<String, TemplateError> {
    template::expand(endpoint, |name| match name {
        "scope_path" => Some(format!(
            "{}s/{}",
            scope.kind_str(),
            urlencoding::encode(&scope.id)
        )),
        "param" => param.map(|p| urlencoding::encode(p).into_owned()),
        "id" => id.map(|i| urlencoding::encode(i).into_owned()),
        other => scope
            .placeholder(other)
            .map(|v| urlencoding::encode(&v).into_owned()),
    })
}

/// Fetch every page of `path` and flatten the results.
///
/// Array results are concatenated, a single object counts as one record and
/// a null result as none. `paginated` controls page numbering only; a
/// returned cursor is always followed.
pub async fn fetch_pages(
    client: &CloudflareClient,
    path: &str,
    base_query: &[(&str, String)],
    paginated: bool,
) -> std::result::Result<Vec<Value>, ApiError> {
    let mut records = Vec::new();
    let mut page: u32 = 1;
    let mut total_pages: u32 = 1;
    let mut cursor: Option<String> = None;

    loop {
        let mut query = base_query.to_vec();
        if let Some(cursor) = &cursor {
            query.push(("cursor", cursor.clone()));
        } else if page > 1 {
            query.push(("page", page.to_string()));
        }

        let envelope = client.get(path, &query).await?;
        if page == 1 && paginated {
            total_pages = envelope.total_pages();
            tracing::debug!("{} reports {} page(s)", path, total_pages);
        }
        let next_cursor = envelope.next_cursor().map(str::to_string);

        match envelope.result {
            Value::Array(items) => records.extend(items),
            Value::Null => {}
            other => records.push(other),
        }

        match next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                tracing::warn!("{} returned the same cursor twice; stopping", path);
                break;
            }
            Some(next) => {
                tracing::debug!("{} continues at cursor {}", path, next);
                cursor = Some(next);
                page += 1;
                continue;
            }
            None if cursor.is_some() => break,
            None => {}
        }

        if page >= total_pages {
            break;
        }
        page += 1;
    }

    Ok(records)
}

fn fixed_query(def: &ResourceDef) -> Vec<(&str, String)> {
    def.query
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect()
}

/// Fetch `def` once per path parameter (or once when `params` is empty).
///
/// A not-found response ends that parameter's fetch and is returned in its
/// batch; every other error aborts the whole call.
pub async fn fetch_all(
    client: &CloudflareClient,
    def: &ResourceDef,
    scope: &ScopeRef,
    params: &[String],
) -> Result<Vec<ParamBatch>> {
    let params: Vec<Option<&str>> = if params.is_empty() {
        vec![None]
    } else {
        params.iter().map(|p| Some(p.as_str())).collect()
    };

    let query = fixed_query(def);
    let mut batches = Vec::with_capacity(params.len());

    for param in params {
        let path = expand_path(&def.endpoint, scope, param, None)?;
        let records = match fetch_pages(client, &path, &query, def.paginated).await {
            Ok(records) => Ok(records),
            Err(e) if e.is_not_found() => Err(e),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to fetch {}", path));
            }
        };
        batches.push(ParamBatch {
            param: param.map(str::to_string),
            records,
        });
    }

    Ok(batches)
}

/// List the parents of a parameterized resource and pull out their ids
pub async fn discover_params(
    client: &CloudflareClient,
    parent: &ParentDef,
    scope: &ScopeRef,
) -> Result<Vec<String>> {
    let path = expand_path(&parent.endpoint, scope, None, None)?;
    let listed = match fetch_pages(client, &path, &[], true).await {
        Ok(listed) => listed,
        Err(e) if e.is_not_found() => {
            tracing::warn!("Parent endpoint {} not found; nothing to export", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to list parents at {}", path)),
    };

    let mut parents = Vec::new();
    for record in listed {
        match &parent.collection {
            Some(collection) => {
                if let Some(children) = value::opt_array(&record, collection)? {
                    parents.extend(children.iter().cloned());
                }
            }
            None => parents.push(record),
        }
    }

    let mut params = Vec::with_capacity(parents.len());
    for item in &parents {
        match value::opt_scalar_string(item, &parent.field)? {
            Some(param) => params.push(param),
            None => tracing::warn!("Parent record without `{}` skipped", parent.field),
        }
    }
    Ok(params)
}
