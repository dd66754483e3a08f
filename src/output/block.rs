//! HCL `resource` blocks built with `hcl-rs`.
//!
//! A record is classified field by field: an object whose keys are all
//! identifiers becomes a nested block, a list of such objects becomes
//! repeated blocks, and anything else (or anything listed in
//! `map_attributes`) becomes an attribute. The scope attribute leads, then
//! the remaining attributes and blocks in key order. Layout and string
//! escaping (`${` and `%{` included) are left to the `hcl` formatter.

use anyhow::{Context, Result};
use hcl::expr::{Expression, ObjectKey, Traversal, Variable};
use hcl::{Attribute, Block, Body, Identifier, Number};
use serde_json::{Map, Value};

/// Inputs for one `resource` block
pub struct ResourceBlock<'a> {
    pub resource_type: &'a str,
    pub name: &'a str,
    /// `(attribute, value)` written first, e.g. `("zone_id", "...")`
    pub scope: Option<(&'a str, &'a str)>,
    pub record: &'a Value,
    pub map_attributes: &'a [String],
}

impl ResourceBlock<'_> {
    pub fn to_block(&self) -> Block {
        let mut builder = Block::builder("resource")
            .add_label(self.resource_type)
            .add_label(self.name);
        if let Some((key, id)) = self.scope {
            builder = builder.add_attribute((key, id));
        }

        let empty = Map::new();
        let fields = self.record.as_object().unwrap_or(&empty);
        let skip = |key: &str| key == "id" || self.scope.is_some_and(|(attr, _)| attr == key);

        let body = Fields {
            map_attributes: self.map_attributes,
        }
        .body(fields, "", &skip);

        builder.add_structures(body).build()
    }

    pub fn render(&self) -> Result<String> {
        let body = Body::builder().add_block(self.to_block()).build();
        hcl::to_string(&body)
            .with_context(|| format!("Failed to format {}.{}", self.resource_type, self.name))
    }
}

/// Terraform 1.5+ `import` block for `<resource_type>.<name>`
pub fn import_block(resource_type: &str, name: &str, id: &str) -> Result<String> {
    let to = Traversal::builder(Variable::new(resource_type)?)
        .attr(name)
        .build();
    let body = Body::builder()
        .add_block(
            Block::builder("import")
                .add_attribute(("to", to))
                .add_attribute(("id", id))
                .build(),
        )
        .build();
    hcl::to_string(&body).with_context(|| format!("Failed to format import of {}.{}", resource_type, name))
}

struct Fields<'a> {
    map_attributes: &'a [String],
}

enum Entry<'v> {
    Attribute,
    Blocks(Vec<&'v Map<String, Value>>),
}

impl Fields<'_> {
    fn body(&self, fields: &Map<String, Value>, path: &str, skip: &dyn Fn(&str) -> bool) -> Body {
        let mut keys: Vec<&String> = fields.keys().collect();
        keys.sort();

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();

        for key in keys {
            let value = &fields[key];
            if value.is_null() || skip(key) {
                continue;
            }
            let Some(ident) = identifier(key) else {
                tracing::warn!("Field `{}` is not a valid HCL identifier; left out", key);
                continue;
            };

            let child_path = join(path, key);
            match self.classify(value, &child_path) {
                Entry::Attribute => attributes.push(Attribute::new(ident, expression(value))),
                Entry::Blocks(maps) => {
                    for map in maps {
                        let body = self.body(map, &child_path, &|_: &str| false);
                        blocks.push(Block::builder(ident.clone()).add_structures(body).build());
                    }
                }
            }
        }

        Body::builder()
            .add_attributes(attributes)
            .add_blocks(blocks)
            .build()
    }

    fn classify<'v>(&self, value: &'v Value, path: &str) -> Entry<'v> {
        if self.map_attributes.iter().any(|m| m == path) {
            return Entry::Attribute;
        }
        match value {
            Value::Object(map) if is_block_body(map) => Entry::Blocks(vec![map]),
            Value::Array(items) if !items.is_empty() => {
                let maps: Option<Vec<&Map<String, Value>>> =
                    items.iter().map(Value::as_object).collect();
                match maps {
                    Some(maps) if maps.iter().all(|m| is_block_body(m)) => Entry::Blocks(maps),
                    _ => Entry::Attribute,
                }
            }
            _ => Entry::Attribute,
        }
    }
}

fn is_block_body(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| is_identifier(k))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn identifier(key: &str) -> Option<Identifier> {
    if is_identifier(key) {
        Identifier::new(key).ok()
    } else {
        None
    }
}

/// Whether `key` can be written bare as an HCL attribute or block name
pub fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Convert a JSON value into an HCL expression
pub fn expression(value: &Value) -> Expression {
    match value {
        Value::Null => Expression::Null,
        Value::Bool(b) => Expression::Bool(*b),
        Value::Number(n) => number(n),
        Value::String(s) => Expression::String(s.clone()),
        Value::Array(items) => Expression::Array(items.iter().map(expression).collect()),
        Value::Object(map) => Expression::Object(
            map.iter()
                .map(|(k, v)| (object_key(k), expression(v)))
                .collect(),
        ),
    }
}

fn number(n: &serde_json::Number) -> Expression {
    if let Some(i) = n.as_i64() {
        Expression::Number(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Expression::Number(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Expression::Null, Expression::Number)
    }
}

fn object_key(key: &str) -> ObjectKey {
    match identifier(key) {
        Some(ident) => ObjectKey::Identifier(ident),
        None => ObjectKey::Expression(Expression::String(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(record: Value, scope: Option<(&str, &str)>, maps: &[&str]) -> String {
        let maps: Vec<String> = maps.iter().map(|s| s.to_string()).collect();
        ResourceBlock {
            resource_type: "cloudflare_test",
            name: "terraform_managed_resource_x",
            scope,
            record: &record,
            map_attributes: &maps,
        }
        .render()
        .unwrap()
    }

    /// Parse rendered output back and return the body of its only block
    fn parsed(out: &str) -> Body {
        let body: Body = hcl::from_str(out).expect("rendered HCL should parse");
        let block = body.blocks().next().expect("one resource block").clone();
        assert_eq!(block.identifier(), "resource");
        block.body().clone()
    }

    fn attribute_keys(body: &Body) -> Vec<String> {
        body.attributes().map(|a| a.key().to_string()).collect()
    }

    #[test]
    fn test_scope_attribute_first_then_sorted() {
        let out = render(
            json!({"id": "abc", "type": "A", "name": "www", "proxied": true, "ttl": 1, "zone_id": "z1"}),
            Some(("zone_id", "z1")),
            &[],
        );
        assert!(out.starts_with(
            "resource \"cloudflare_test\" \"terraform_managed_resource_x\" {\n  zone_id = \"z1\"\n"
        ));
        assert_eq!(
            attribute_keys(&parsed(&out)),
            vec!["zone_id", "name", "proxied", "ttl", "type"]
        );
        assert_eq!(out.matches("zone_id").count(), 1);
    }

    #[test]
    fn test_template_sequences_escaped() {
        let out = render(
            json!({"content": "${origin}.example.net", "expression": "%{if}", "price": "$5 and 10%"}),
            None,
            &[],
        );
        assert!(out.contains("\"$${origin}.example.net\""));
        assert!(out.contains("\"%%{if}\""));
        assert!(out.contains("\"$5 and 10%\""));
    }

    #[test]
    fn test_quotes_and_newlines_escaped() {
        let out = render(json!({"comment": "say \"hi\"\nbye"}), None, &[]);
        assert!(out.contains(r#"comment = "say \"hi\"\nbye""#));
    }

    #[test]
    fn test_nulls_and_top_level_id_are_omitted() {
        let out = render(json!({"id": "x", "ref": null, "rules": [{"id": "r1"}]}), None, &[]);
        let body = parsed(&out);
        assert!(attribute_keys(&body).is_empty());

        let rule = body.blocks().next().unwrap();
        assert_eq!(rule.identifier(), "rules");
        // nested ids stay
        assert_eq!(attribute_keys(rule.body()), vec!["id"]);
    }

    #[test]
    fn test_objects_become_blocks_and_lists_repeat() {
        let out = render(
            json!({
                "name": "lb",
                "session_affinity_attributes": {"samesite": "Auto"},
                "origins": [{"address": "1.1.1.1"}, {"address": "2.2.2.2"}]
            }),
            None,
            &[],
        );
        let body = parsed(&out);
        assert_eq!(attribute_keys(&body), vec!["name"]);

        let blocks: Vec<&str> = body.blocks().map(|b| b.identifier()).collect();
        assert_eq!(blocks, vec!["origins", "origins", "session_affinity_attributes"]);
        assert!(out.contains("    address = \"2.2.2.2\"\n"));
    }

    #[test]
    fn test_non_identifier_keys_render_as_map() {
        let out = render(json!({"headers": {"X-Custom": "1"}}), None, &[]);
        let body = parsed(&out);
        assert_eq!(body.blocks().count(), 0);

        let headers = body.attributes().next().unwrap();
        assert_eq!(headers.key(), "headers");
        assert!(matches!(headers.expr(), Expression::Object(_)));
        assert!(out.contains("\"X-Custom\""));
    }

    #[test]
    fn test_forced_map_attribute() {
        let out = render(
            json!({"rules": [{"action_parameters": {"rules": {"efb7b8c9": "5de7edfa,e3a567af"}}}]}),
            None,
            &["rules.action_parameters.rules"],
        );
        let body = parsed(&out);
        let rule = body.blocks().next().unwrap();
        let params = rule.body().blocks().next().unwrap();
        assert_eq!(params.identifier(), "action_parameters");

        let skips = params.body().attributes().next().unwrap();
        assert_eq!(skips.key(), "rules");
        assert!(matches!(skips.expr(), Expression::Object(_)));
        assert_eq!(params.body().blocks().count(), 0);
    }

    #[test]
    fn test_scalar_lists_and_empty_values_are_attributes() {
        let out = render(json!({"tags": ["a", "b"], "empty": [], "settings": {}}), None, &[]);
        let body = parsed(&out);
        assert_eq!(attribute_keys(&body), vec!["empty", "settings", "tags"]);
        assert_eq!(body.blocks().count(), 0);
    }

    #[test]
    fn test_expression_numbers() {
        assert_eq!(expression(&json!(300)), Expression::Number(Number::from(300i64)));
        assert_eq!(expression(&json!(-1)), Expression::Number(Number::from(-1i64)));
        assert!(matches!(expression(&json!(0.5)), Expression::Number(_)));
    }

    #[test]
    fn test_import_block() {
        let out = import_block("cloudflare_record", "terraform_managed_resource_a", "z/a").unwrap();
        assert!(out.starts_with("import {\n"));
        assert!(out.contains("  to = cloudflare_record.terraform_managed_resource_a\n"));
        assert!(out.contains("  id = \"z/a\"\n"));
        assert!(hcl::from_str::<Body>(&out).is_ok());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("zone_id"));
        assert!(is_identifier("cache-key"));
        assert!(!is_identifier("200-299"));
        assert!(!is_identifier("X Header"));
        assert!(!is_identifier(""));
    }
}
