//! Import identifiers and commands

use crate::export::{ExportedRecord, ResourceExport};
use crate::resource::template::{self, TemplateError};
use crate::transform::value;

/// Expand the import id template of `export` for `record`.
///
/// Scope placeholders resolve first, then `{param}`, then record fields.
pub fn import_id(export: &ResourceExport, record: &ExportedRecord) -> Result<String, TemplateError> {
    template::expand(&export.def.import_id, |name| {
        if let Some(v) = export.scope.placeholder(name) {
            return Some(v);
        }
        if name == "param" {
            return record.path_param.clone();
        }
        value::opt_scalar_string(&record.value, name).ok().flatten()
    })
}

/// `terraform import <address> <id>`
pub fn import_command(resource_type: &str, name: &str, id: &str) -> String {
    format!("terraform import {}.{} {}\n", resource_type, name, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{get_resource, ScopeRef};
    use serde_json::json;

    fn export(resource_type: &str, scope: ScopeRef) -> ResourceExport {
        ResourceExport {
            resource_type: resource_type.to_string(),
            def: get_resource(resource_type).unwrap(),
            scope,
            records: Vec::new(),
        }
    }

    fn record(value: serde_json::Value) -> ExportedRecord {
        ExportedRecord {
            path_param: None,
            value,
        }
    }

    #[test]
    fn test_zone_resource_id() {
        let dns = export("cloudflare_record", ScopeRef::zone("z1"));
        assert_eq!(import_id(&dns, &record(json!({"id": "rec1"}))).unwrap(), "z1/rec1");
    }

    #[test]
    fn test_ruleset_id_uses_scope_kind() {
        let zone = export("cloudflare_ruleset", ScopeRef::zone("z1"));
        assert_eq!(import_id(&zone, &record(json!({"id": "rs"}))).unwrap(), "zone/z1/rs");

        let account = export("cloudflare_ruleset", ScopeRef::account("a1"));
        assert_eq!(
            import_id(&account, &record(json!({"id": "rs"}))).unwrap(),
            "account/a1/rs"
        );
    }

    #[test]
    fn test_record_fields_fill_template() {
        let domains = export("cloudflare_r2_custom_domain", ScopeRef::account("a1"));
        let id = import_id(
            &domains,
            &record(json!({"bucket_name": "assets", "domain_name": "cdn.example.com", "zone_id": "z9"})),
        )
        .unwrap();
        assert_eq!(id, "a1/assets/cdn.example.com");
    }

    #[test]
    fn test_missing_field_is_error() {
        let dns = export("cloudflare_record", ScopeRef::zone("z1"));
        assert!(import_id(&dns, &record(json!({"name": "www"}))).is_err());
    }

    #[test]
    fn test_import_command() {
        assert_eq!(
            import_command("cloudflare_record", "terraform_managed_resource_a", "z/a"),
            "terraform import cloudflare_record.terraform_managed_resource_a z/a\n"
        );
    }
}
