//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads every supported Terraform resource type from embedded
//! JSON files and provides lookup functions for the rest of the application.

use crate::transform::Step;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/zone.json"),
    include_str!("../resources/account.json"),
    include_str!("../resources/zero_trust.json"),
    include_str!("../resources/storage.json"),
];

/// Where a resource type lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Zone,
    Account,
    /// Available under either; the zone wins when both ids are known
    Any,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Zone => "zone",
            Scope::Account => "account",
            Scope::Any => "zone|account",
        }
    }
}

/// How to discover path parameters before fetching a parameterized endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ParentDef {
    /// List endpoint of the parent resource
    pub endpoint: String,
    /// Key holding the parents when the result is an object, e.g. `buckets`
    #[serde(default)]
    pub collection: Option<String>,
    /// Field of each parent used as the parameter
    pub field: String,
}

/// Per-record fetch-and-merge for a field the list endpoint omits
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichDef {
    /// Endpoint template; `{id}` is the record's `id_field`
    pub endpoint: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Path inside the fetched object to merge; the whole result when absent
    #[serde(default)]
    pub source: Option<String>,
    /// Field of the record receiving the fetched value
    pub target: String,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub scope: Scope,
    /// List endpoint template (`{zone_id}`, `{account_id}`, `{scope_path}`, `{param}`)
    pub endpoint: String,
    /// Fixed query parameters sent with every page
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub paginated: bool,
    #[serde(default)]
    pub parent: Option<ParentDef>,
    #[serde(default)]
    pub enrich: Option<EnrichDef>,
    #[serde(default)]
    pub transforms: Vec<Step>,
    /// Import id template, expanded against the record and the scope
    pub import_id: String,
    /// Record field used to name the Terraform resource
    #[serde(default = "default_id_field")]
    pub name_field: String,
    /// Whether the rendered block starts with `zone_id`/`account_id`
    #[serde(default = "default_true")]
    pub scope_attribute: bool,
    /// Object fields rendered as HCL maps instead of nested blocks
    #[serde(default)]
    pub map_attributes: Vec<String>,
}

impl ResourceDef {
    /// Whether the endpoint needs a path parameter
    pub fn is_parameterized(&self) -> bool {
        self.endpoint.contains("{param}")
    }
}

fn default_true() -> bool {
    true
}

fn default_id_field() -> String {
    "id".to_string()
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: BTreeMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::template;
    use crate::transform::custom;

    const SCOPE_PLACEHOLDERS: &[&str] = &["zone_id", "account_id", "scope_id", "scope_kind", "scope_path"];

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
    }

    #[test]
    fn test_dns_record_resource_exists() {
        let resource = get_resource("cloudflare_record");
        assert!(resource.is_some(), "DNS record resource should exist");

        let resource = resource.unwrap();
        assert_eq!(resource.display_name, "DNS Records");
        assert_eq!(resource.scope, Scope::Zone);
        assert_eq!(resource.endpoint, "/zones/{zone_id}/dns_records");
    }

    #[test]
    fn test_get_all_resource_keys() {
        let keys = get_all_resource_keys();
        assert!(keys.contains(&"cloudflare_ruleset"));
        assert!(keys.contains(&"cloudflare_r2_bucket"));

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "Keys should be sorted");
    }

    #[test]
    fn test_every_custom_step_resolves() {
        for (key, def) in &get_registry().resources {
            for step in &def.transforms {
                if let Step::Custom { name } = step {
                    assert!(
                        custom::find(name).is_some(),
                        "{} names unknown custom transform {}",
                        key,
                        name
                    );
                }
            }
        }
    }

    #[test]
    fn test_endpoints_only_use_known_placeholders() {
        for (key, def) in &get_registry().resources {
            let mut templates = vec![def.endpoint.as_str()];
            if let Some(parent) = &def.parent {
                templates.push(parent.endpoint.as_str());
            }
            if let Some(enrich) = &def.enrich {
                templates.push(enrich.endpoint.as_str());
            }

            for template in templates {
                for placeholder in template::placeholders(template).unwrap() {
                    assert!(
                        SCOPE_PLACEHOLDERS.contains(&placeholder)
                            || placeholder == "param"
                            || placeholder == "id",
                        "{}: unknown placeholder {{{}}} in {}",
                        key,
                        placeholder,
                        template
                    );
                }
            }
        }
    }

    #[test]
    fn test_scope_placeholders_match_scope() {
        for (key, def) in &get_registry().resources {
            let placeholders = template::placeholders(&def.endpoint).unwrap();
            match def.scope {
                Scope::Zone => assert!(!placeholders.contains(&"account_id"), "{}", key),
                Scope::Account => assert!(!placeholders.contains(&"zone_id"), "{}", key),
                Scope::Any => {
                    assert!(!placeholders.contains(&"zone_id"), "{}", key);
                    assert!(!placeholders.contains(&"account_id"), "{}", key);
                }
            }
        }
    }

    #[test]
    fn test_parameterized_resources_have_a_parent() {
        for (key, def) in &get_registry().resources {
            if def.is_parameterized() {
                assert!(def.parent.is_some(), "{} needs a parent definition", key);
            }
        }
    }

    #[test]
    fn test_import_templates_parse() {
        for (key, def) in &get_registry().resources {
            assert!(
                template::placeholders(&def.import_id).is_ok(),
                "{} has a malformed import id template",
                key
            );
        }
    }
}
