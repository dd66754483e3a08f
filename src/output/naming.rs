//! Terraform resource names

use crate::export::{ExportedRecord, ResourceExport};
use crate::transform::value;
use std::collections::{HashMap, HashSet};

pub const NAME_PREFIX: &str = "terraform_managed_resource_";

/// Hands out unique resource names per resource type
#[derive(Debug, Default)]
pub struct ResourceNamer {
    used: HashMap<String, HashSet<String>>,
}

impl ResourceNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `record`: its `name_field`, else the path parameter, else the
    /// scope id, made unique within the resource type
    pub fn name_for(&mut self, export: &ResourceExport, record: &ExportedRecord) -> String {
        let raw = value::opt_scalar_string(&record.value, &export.def.name_field)
            .ok()
            .flatten()
            .filter(|s| !s.is_empty())
            .or_else(|| record.path_param.clone())
            .unwrap_or_else(|| export.scope.id.clone());

        let base = format!("{}{}", NAME_PREFIX, sanitize(&raw));
        let used = self.used.entry(export.resource_type.clone()).or_default();

        let mut name = base.clone();
        let mut n = 2;
        while used.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        used.insert(name.clone());
        name
    }
}

/// Replace everything Terraform does not allow in a name with `_`
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{get_resource, ScopeRef};
    use serde_json::json;

    fn export(resource_type: &str) -> ResourceExport {
        ResourceExport {
            resource_type: resource_type.to_string(),
            def: get_resource(resource_type).unwrap(),
            scope: ScopeRef::account("acc1"),
            records: Vec::new(),
        }
    }

    fn record(value: serde_json::Value, param: Option<&str>) -> ExportedRecord {
        ExportedRecord {
            path_param: param.map(str::to_string),
            value,
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("cdn.example.com"), "cdn_example_com");
        assert_eq!(sanitize("abc-123_x"), "abc-123_x");
        assert_eq!(sanitize("a b/c"), "a_b_c");
    }

    #[test]
    fn test_name_field_then_fallbacks() {
        let mut namer = ResourceNamer::new();
        let buckets = export("cloudflare_r2_bucket");
        assert_eq!(
            namer.name_for(&buckets, &record(json!({"name": "assets"}), None)),
            "terraform_managed_resource_assets"
        );

        let crons = export("cloudflare_worker_cron_trigger");
        assert_eq!(
            namer.name_for(&crons, &record(json!({"schedules": []}), Some("billing"))),
            "terraform_managed_resource_billing"
        );

        let fallback = export("cloudflare_fallback_domain");
        assert_eq!(
            namer.name_for(&fallback, &record(json!({"domains": []}), None)),
            "terraform_managed_resource_acc1"
        );
    }

    #[test]
    fn test_duplicates_get_suffix_per_type() {
        let mut namer = ResourceNamer::new();
        let members = export("cloudflare_account_member");
        let lists = export("cloudflare_list");
        let same = record(json!({"id": "x.y"}), None);

        assert_eq!(namer.name_for(&members, &same), "terraform_managed_resource_x_y");
        assert_eq!(namer.name_for(&members, &same), "terraform_managed_resource_x_y_2");
        assert_eq!(namer.name_for(&members, &same), "terraform_managed_resource_x_y_3");
        assert_eq!(namer.name_for(&lists, &same), "terraform_managed_resource_x_y");
    }
}
