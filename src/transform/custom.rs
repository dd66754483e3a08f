//! Named transform strategies
//!
//! Shapes that need real code rather than a declarative step. A resource
//! definition selects one with `{"op": "custom", "name": "<name>"}`.

use super::steps::each;
use super::value::{self, Result, TransformError};
use serde_json::{Map, Value};

/// Signature shared by every strategy
pub type CustomFn = fn(Vec<Value>, Option<&str>) -> Result<Vec<Value>>;

const STRATEGIES: &[(&str, CustomFn)] = &[
    ("account_member", account_member),
    ("dns_record", dns_record),
    ("list_items", list_items),
    ("page_rule", page_rule),
    ("ruleset", ruleset),
    ("zone_settings", zone_settings),
];

/// Ruleset phase whose skip rules keep the API's list form for `rules`
const SKIP_RULES_UNCHANGED_PHASE: &str = "http_request_firewall_managed";

/// Look up a strategy by name
pub fn find(name: &str) -> Option<CustomFn> {
    STRATEGIES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, f)| *f)
}

/// Names of every registered strategy
pub fn names() -> impl Iterator<Item = &'static str> {
    STRATEGIES.iter().map(|(name, _)| *name)
}

// =============================================================================
// Page rules
// =============================================================================

/// `targets[0].constraint.value` becomes `target`, and the
/// `[{id, value}, ...]` action list becomes an `{id: value}` map. Actions
/// without a value (`disable_apps`, `disable_security`, ...) map to `true`.
fn page_rule(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    each(records, |record| {
        if let Some(targets) = value::opt_array(record, "targets")? {
            let target = targets
                .first()
                .and_then(|t| value::present(t, "constraint.value"))
                .cloned();
            value::take(record, "targets");
            if let Some(target) = target {
                value::insert(record, "target", target)?;
            }
        }

        let actions = match value::present(record, "actions") {
            Some(Value::Array(actions)) => actions,
            // Already flattened
            None | Some(Value::Object(_)) => return Ok(()),
            Some(other) => return Err(TransformError::shape("actions", "array", other)),
        };

        let mut flattened = Map::new();
        for action in actions {
            let id = match value::present(action, "id") {
                Some(Value::String(id)) => id.clone(),
                other => {
                    return Err(TransformError::shape(
                        "actions[].id",
                        "string",
                        other.unwrap_or(&Value::Null),
                    ))
                }
            };
            let setting = value::present(action, "value")
                .cloned()
                .unwrap_or(Value::Bool(true));
            flattened.insert(id, setting);
        }

        value::insert(record, "actions", Value::Object(flattened))
    })
}

// =============================================================================
// Rulesets
// =============================================================================

/// Per-rule fixes for `cloudflare_ruleset`:
///
/// - `ref` equal to `id` is the API default and is nulled out
/// - cache rule query strings `{"all": true}` / `{"list": [...]}` become the
///   provider's plain lists (`["*"]` / the list)
/// - skip rules outside the managed phase get their `rules` map of
///   `ruleset id -> [rule ids]` joined into comma separated strings
///
/// The fixes apply to each entry of a ruleset's `rules`, and to a record that
/// is itself a rule (it carries `action`).
fn ruleset(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    each(records, |record| {
        let phase = value::opt_scalar_string(record, "phase")?;
        if value::present(record, "action").is_some() {
            fix_rule(record, phase.as_deref())?;
        }

        let Some(rules) = value::opt_array_mut(record, "rules")? else {
            return Ok(());
        };
        for rule in rules.iter_mut() {
            if !rule.is_object() {
                return Err(TransformError::shape("rules", "array of objects", rule));
            }
            fix_rule(rule, phase.as_deref())?;
        }
        Ok(())
    })
}

fn fix_rule(rule: &mut Value, phase: Option<&str>) -> Result<()> {
    let id = value::present(rule, "id");
    if id.is_some() && id == value::present(rule, "ref") {
        value::insert(rule, "ref", Value::Null)?;
    }

    for list in ["include", "exclude"] {
        let path = format!("action_parameters.cache_key.custom_key.query_string.{}", list);
        if let Some(flat) = flatten_query_string_list(rule, &path)? {
            value::insert(rule, &path, flat)?;
        }
    }

    let is_skip = matches!(value::present(rule, "action"), Some(Value::String(a)) if a == "skip");
    if is_skip && phase != Some(SKIP_RULES_UNCHANGED_PHASE) {
        if let Some(joined) = join_skip_rules(rule)? {
            value::insert(rule, "action_parameters.rules", joined)?;
        }
    }
    Ok(())
}

fn flatten_query_string_list(rule: &Value, path: &str) -> Result<Option<Value>> {
    let Some(list) = value::present(rule, path) else {
        return Ok(None);
    };
    let Value::Object(_) = list else {
        // Already a plain list
        return Ok(None);
    };

    if matches!(value::present(list, "all"), Some(Value::Bool(true))) {
        return Ok(Some(Value::Array(vec![Value::String("*".to_string())])));
    }
    match value::opt_array(list, "list")? {
        Some(items) => Ok(Some(Value::Array(items.clone()))),
        None => Ok(None),
    }
}

fn join_skip_rules(rule: &Value) -> Result<Option<Value>> {
    let Some(skips) = value::opt_object(rule, "action_parameters.rules")? else {
        return Ok(None);
    };

    let mut joined = Map::new();
    for (ruleset_id, rule_ids) in skips {
        let flat = match rule_ids {
            Value::String(_) => rule_ids.clone(),
            Value::Array(ids) => {
                let ids = ids
                    .iter()
                    .map(|id| match id {
                        Value::String(s) => Ok(s.as_str()),
                        other => Err(TransformError::shape(
                            "action_parameters.rules[]",
                            "string",
                            other,
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Value::String(ids.join(","))
            }
            other => {
                return Err(TransformError::shape(
                    "action_parameters.rules",
                    "array of rule ids",
                    other,
                ))
            }
        };
        joined.insert(ruleset_id.clone(), flat);
    }
    Ok(Some(Value::Object(joined)))
}

// =============================================================================
// Zone settings
// =============================================================================

/// The settings endpoint returns one `{id, value, editable}` entry per
/// setting; the provider wants a single resource with a `settings` map.
/// Read-only settings and unset values are left out.
fn zone_settings(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    if records.is_empty() {
        return Ok(records);
    }
    if records.len() == 1 && value::opt_object(&records[0], "settings")?.is_some() {
        return Ok(records);
    }

    let mut settings = Map::new();
    for record in &records {
        let Some(id) = value::opt_scalar_string(record, "id")? else {
            return Err(TransformError::shape("id", "string", &Value::Null));
        };
        if matches!(value::present(record, "editable"), Some(Value::Bool(false))) {
            continue;
        }
        if let Some(setting) = value::present(record, "value") {
            settings.insert(id, setting.clone());
        }
    }

    let mut folded = Map::new();
    folded.insert("settings".to_string(), Value::Object(settings));
    Ok(vec![Value::Object(folded)])
}

// =============================================================================
// Account members
// =============================================================================

fn account_member(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    each(records, |record| {
        if let Some(email) = value::opt_scalar_string(record, "user.email")? {
            value::insert(record, "email_address", Value::String(email))?;
        }
        value::take(record, "user");

        if let Some(roles) = value::opt_array(record, "roles")? {
            let role_ids = roles
                .iter()
                .map(|role| match value::present(role, "id") {
                    Some(id @ Value::String(_)) => Ok(id.clone()),
                    other => Err(TransformError::shape(
                        "roles[].id",
                        "string",
                        other.unwrap_or(&Value::Null),
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            value::insert(record, "role_ids", Value::Array(role_ids))?;
        }
        value::take(record, "roles");
        value::take(record, "policies");
        Ok(())
    })
}

// =============================================================================
// IP / hostname / ASN / redirect lists
// =============================================================================

const LIST_ITEM_KINDS: [&str; 4] = ["ip", "asn", "hostname", "redirect"];

/// Items fetched for a list arrive as `{id, ip, comment, created_on}`; the
/// provider wants `{value: {ip}, comment}`.
fn list_items(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    each(records, |record| {
        let Some(items) = value::opt_array_mut(record, "item")? else {
            return Ok(());
        };

        for item in items.iter_mut() {
            if value::present(item, "value").is_some() {
                continue;
            }

            let mut entry = Map::new();
            for kind in LIST_ITEM_KINDS {
                if let Some(found) = value::present(item, kind) {
                    entry.insert(kind.to_string(), found.clone());
                }
            }
            if entry.is_empty() {
                return Err(TransformError::shape("item[]", "list item", item));
            }

            let mut reshaped = Map::new();
            reshaped.insert("value".to_string(), Value::Object(entry));
            if let Some(comment) = value::present(item, "comment") {
                reshaped.insert("comment".to_string(), comment.clone());
            }
            *item = Value::Object(reshaped);
        }
        Ok(())
    })
}

// =============================================================================
// DNS records
// =============================================================================

/// Structured records (SRV, CAA, LOC, ...) carry both `data` and a rendered
/// `content`; the provider accepts only one of them.
fn dns_record(records: Vec<Value>, _param: Option<&str>) -> Result<Vec<Value>> {
    each(records, |record| {
        if value::opt_object(record, "data")?.is_some() {
            value::take(record, "content");
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, records: Value) -> Value {
        let strategy = find(name).expect("strategy should exist");
        Value::Array(strategy(records.as_array().cloned().unwrap(), None).unwrap())
    }

    #[test]
    fn test_all_strategies_resolve() {
        for name in names() {
            assert!(find(name).is_some(), "{} should resolve", name);
        }
        assert!(find("missing").is_none());
    }

    #[test]
    fn test_page_rule_flattens_targets_and_actions() {
        let out = run(
            "page_rule",
            json!([{
                "id": "pr1",
                "targets": [{"target": "url", "constraint": {"operator": "matches", "value": "example.com/*"}}],
                "actions": [
                    {"id": "cache_level", "value": "bypass"},
                    {"id": "disable_apps"},
                    {"id": "forwarding_url", "value": {"url": "https://x.example.com", "status_code": 301}}
                ],
                "priority": 1
            }]),
        );
        assert_eq!(
            out,
            json!([{
                "id": "pr1",
                "target": "example.com/*",
                "actions": {
                    "cache_level": "bypass",
                    "disable_apps": true,
                    "forwarding_url": {"url": "https://x.example.com", "status_code": 301}
                },
                "priority": 1
            }])
        );
    }

    #[test]
    fn test_page_rule_is_idempotent() {
        let once = run(
            "page_rule",
            json!([{"targets": [{"constraint": {"value": "a/*"}}], "actions": [{"id": "ssl", "value": "flexible"}]}]),
        );
        assert_eq!(run("page_rule", once.clone()), once);
    }

    #[test]
    fn test_page_rule_action_without_id_is_shape_error() {
        let err = find("page_rule").unwrap()(vec![json!({"actions": [{"value": 1}]})], None)
            .unwrap_err();
        assert!(matches!(err, TransformError::Shape { .. }));
    }

    #[test]
    fn test_ruleset_nulls_default_ref() {
        let out = run(
            "ruleset",
            json!([{"rules": [
                {"id": "r1", "ref": "r1", "action": "block"},
                {"id": "r2", "ref": "custom-ref", "action": "log"}
            ]}]),
        );
        assert_eq!(out[0]["rules"][0], json!({"id": "r1", "ref": null, "action": "block"}));
        assert_eq!(out[0]["rules"][1]["ref"], "custom-ref");
    }

    #[test]
    fn test_ruleset_cache_rule_query_strings() {
        let out = run(
            "ruleset",
            json!([{"phase": "http_request_cache_settings", "rules": [
                {"id": "c1", "action": "set_cache_settings", "action_parameters": {"cache_key": {"custom_key": {"query_string": {"include": {"all": true}}}}}},
                {"id": "c2", "action": "set_cache_settings", "action_parameters": {"cache_key": {"custom_key": {"query_string": {"exclude": {"list": ["utm_source", "fbclid"]}}}}}}
            ]}]),
        );
        assert_eq!(
            out[0]["rules"][0]["action_parameters"]["cache_key"]["custom_key"]["query_string"],
            json!({"include": ["*"]})
        );
        assert_eq!(
            out[0]["rules"][1]["action_parameters"]["cache_key"]["custom_key"]["query_string"],
            json!({"exclude": ["utm_source", "fbclid"]})
        );
    }

    #[test]
    fn test_ruleset_skip_rules_joined_outside_managed_phase() {
        let rule = json!({"id": "s1", "action": "skip", "action_parameters": {"rules": {"efb7b8c949ac4650a09736fc376e9aee": ["5de7edfa648c4d6891dc3e7f84534ffa", "e3a567afc347477d9702d9047e97d760"]}}});

        let out = run(
            "ruleset",
            json!([{"phase": "http_request_firewall_custom", "rules": [rule.clone()]}]),
        );
        assert_eq!(
            out[0]["rules"][0]["action_parameters"]["rules"]["efb7b8c949ac4650a09736fc376e9aee"],
            "5de7edfa648c4d6891dc3e7f84534ffa,e3a567afc347477d9702d9047e97d760"
        );

        let out = run(
            "ruleset",
            json!([{"phase": "http_request_firewall_managed", "rules": [rule.clone()]}]),
        );
        assert_eq!(out[0]["rules"][0], rule);
    }

    #[test]
    fn test_ruleset_non_skip_rules_keep_rules_map() {
        let rule = json!({"id": "x", "action": "execute", "action_parameters": {"rules": {"a": ["b"]}}});
        let out = run("ruleset", json!([{"phase": "http_request_firewall_custom", "rules": [rule.clone()]}]));
        assert_eq!(out[0]["rules"][0], rule);
    }

    #[test]
    fn test_zone_settings_collapse_to_one_record() {
        let out = run(
            "zone_settings",
            json!([
                {"id": "always_use_https", "value": "on", "editable": true},
                {"id": "minify", "value": {"css": "on", "html": "off", "js": "on"}, "editable": true},
                {"id": "advanced_ddos", "value": "on", "editable": false},
                {"id": "mirage", "value": null, "editable": true}
            ]),
        );
        assert_eq!(
            out,
            json!([{"settings": {
                "always_use_https": "on",
                "minify": {"css": "on", "html": "off", "js": "on"}
            }}])
        );
        assert_eq!(run("zone_settings", out.clone()), out);
    }

    #[test]
    fn test_account_member_flattens_user_and_roles() {
        let out = run(
            "account_member",
            json!([{
                "id": "m1",
                "status": "accepted",
                "user": {"id": "u1", "email": "ops@example.com"},
                "roles": [{"id": "role-a", "name": "Admin"}, {"id": "role-b"}],
                "policies": []
            }]),
        );
        assert_eq!(
            out,
            json!([{
                "id": "m1",
                "status": "accepted",
                "email_address": "ops@example.com",
                "role_ids": ["role-a", "role-b"]
            }])
        );
    }

    #[test]
    fn test_list_items_reshape() {
        let out = run(
            "list_items",
            json!([{"kind": "ip", "item": [
                {"id": "i1", "ip": "192.0.2.1", "comment": "office", "created_on": "x"},
                {"id": "i2", "asn": 13335}
            ]}]),
        );
        assert_eq!(
            out[0]["item"],
            json!([
                {"value": {"ip": "192.0.2.1"}, "comment": "office"},
                {"value": {"asn": 13335}}
            ])
        );
        assert_eq!(run("list_items", out.clone()), out);
    }

    #[test]
    fn test_dns_record_prefers_data() {
        let out = run(
            "dns_record",
            json!([
                {"type": "SRV", "content": "10 5060 sip.example.com", "data": {"priority": 10, "port": 5060}},
                {"type": "A", "content": "192.0.2.1"}
            ]),
        );
        assert!(out[0].get("content").is_none());
        assert_eq!(out[1]["content"], "192.0.2.1");
    }
}
