//! Fetch-and-transform pipeline
//!
//! [`ExportContext`] carries everything one run needs (client, scope ids,
//! path parameters) so runs are independent of each other.

use crate::cloudflare::client::CloudflareClient;
use crate::resource::{self, enrich, ResourceDef, ScopeRef};
use crate::transform;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

/// Explicit state of an export run
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub client: CloudflareClient,
    pub zone_id: Option<String>,
    pub account_id: Option<String>,
    /// Parents to export parameterized types under; discovered when empty
    pub path_params: Vec<String>,
}

/// One transformed record and the path parameter it was fetched under
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedRecord {
    pub path_param: Option<String>,
    pub value: Value,
}

/// Every transformed record of one resource type
#[derive(Debug, Clone)]
pub struct ResourceExport {
    pub resource_type: String,
    pub def: &'static ResourceDef,
    pub scope: ScopeRef,
    pub records: Vec<ExportedRecord>,
}

impl ExportContext {
    pub fn new(client: CloudflareClient) -> Self {
        Self {
            client,
            zone_id: None,
            account_id: None,
            path_params: Vec::new(),
        }
    }

    /// Export every type in `resource_types`, in order
    pub async fn export_all(&self, resource_types: &[String]) -> Result<Vec<ResourceExport>> {
        let mut exports = Vec::with_capacity(resource_types.len());
        for resource_type in resource_types {
            exports.push(self.export(resource_type).await?);
        }
        Ok(exports)
    }

    /// Fetch, enrich and transform all records of `resource_type`
    pub async fn export(&self, resource_type: &str) -> Result<ResourceExport> {
        let def = resource::get_resource(resource_type).ok_or_else(|| {
            anyhow!(
                "Unsupported resource type: {} (run `cf2tf list` to see supported types)",
                resource_type
            )
        })?;
        let scope = ScopeRef::resolve(
            resource_type,
            def.scope,
            self.zone_id.as_deref(),
            self.account_id.as_deref(),
        )?;

        let params = self.params_for(resource_type, def, &scope).await?;
        if def.is_parameterized() && params.is_empty() {
            tracing::info!("No parents found for {}; nothing to export", resource_type);
        }

        let mut records = Vec::new();
        if !def.is_parameterized() || !params.is_empty() {
            let batches = resource::fetch_all(&self.client, def, &scope, &params).await?;
            for batch in batches {
                let raw = match batch.records {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!("{}: {}; treating as empty", resource_type, e);
                        continue;
                    }
                };
                let param = batch.param.as_deref();

                let raw = match &def.enrich {
                    Some(spec) => {
                        enrich::enrich_records(&self.client, spec, &scope, param, raw).await?
                    }
                    None => raw,
                };

                let transformed = transform::transform(resource_type, raw, param)
                    .with_context(|| format!("Failed to reshape {} records", resource_type))?;
                records.extend(transformed.into_iter().map(|value| ExportedRecord {
                    path_param: batch.param.clone(),
                    value,
                }));
            }
        }

        tracing::info!("Exported {} {} record(s)", records.len(), resource_type);
        Ok(ResourceExport {
            resource_type: resource_type.to_string(),
            def,
            scope,
            records,
        })
    }

    async fn params_for(
        &self,
        resource_type: &str,
        def: &ResourceDef,
        scope: &ScopeRef,
    ) -> Result<Vec<String>> {
        if !def.is_parameterized() {
            if !self.path_params.is_empty() {
                tracing::debug!("{} takes no path parameter; ignoring", resource_type);
            }
            return Ok(Vec::new());
        }
        if !self.path_params.is_empty() {
            return Ok(self.path_params.clone());
        }
        match &def.parent {
            Some(parent) => resource::discover_params(&self.client, parent, scope).await,
            None => bail!("{} needs --path-param", resource_type),
        }
    }
}
