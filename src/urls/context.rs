//! External variable definitions injected into the symbol table.
//!
//! Context arrives as a JSON object, a JSON file path, or `KEY=VALUE`
//! pairs, and is merged with file-derived bindings under a policy.

use anyhow::{Context as _, Result, bail};
use clap::ValueEnum;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::symbols::{ObjectShape, ShapeValue};

/// How context variables combine with values found in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ContextPolicy {
    /// Context values and file values are both kept.
    #[default]
    Merge,
    /// Context values replace file values for the names they define.
    Override,
    /// Only context values resolve; the symbol pass is skipped.
    Only,
}

#[derive(Debug, Default)]
pub struct ContextMap {
    pub scalars: HashMap<String, Vec<String>>,
    pub shapes: HashMap<String, ObjectShape>,
    pub arrays: HashMap<String, Vec<String>>,
    /// Overrides for the `window.location` resolver, keyed by property.
    pub location: HashMap<String, String>,
}

impl ContextMap {
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
            && self.shapes.is_empty()
            && self.arrays.is_empty()
            && self.location.is_empty()
    }

    pub fn defines(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
            || self.shapes.contains_key(name)
            || self.arrays.contains_key(name)
    }

    fn insert_value(&mut self, key: &str, value: Value) -> Result<()> {
        if let Some(prop) = location_property(key) {
            let Value::String(text) = value else {
                bail!("location override '{key}' must be a string");
            };
            self.location.insert(prop.to_string(), text);
            return Ok(());
        }
        if let Some((root, rest)) = key.split_once('.') {
            let shape = self.shapes.entry(root.to_string()).or_default();
            install_shape_path(shape, rest, value)?;
            return Ok(());
        }
        match value {
            Value::Object(map) => {
                let mut shape = ObjectShape::default();
                for (prop, nested) in map {
                    install_shape_path(&mut shape, &prop, nested)?;
                }
                self.shapes.insert(key.to_string(), shape);
            }
            Value::Array(items) => {
                let elements = items.into_iter().map(scalar_text).collect();
                self.arrays.insert(key.to_string(), elements);
            }
            other => {
                self.scalars
                    .entry(key.to_string())
                    .or_default()
                    .push(scalar_text(other));
            }
        }
        Ok(())
    }
}

fn location_property(key: &str) -> Option<&str> {
    key.strip_prefix("window.location.")
        .or_else(|| key.strip_prefix("location."))
}

fn install_shape_path(shape: &mut ObjectShape, path: &str, value: Value) -> Result<()> {
    match path.split_once('.') {
        Some((head, rest)) => {
            let nested = shape.entry_shape(head);
            install_shape_path(nested, rest, value)
        }
        None => {
            match value {
                Value::Object(map) => {
                    let nested = shape.entry_shape(path);
                    for (prop, inner) in map {
                        install_shape_path(nested, &prop, inner)?;
                    }
                }
                other => shape.insert(path, ShapeValue::Strings(vec![scalar_text(other)])),
            }
            Ok(())
        }
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Parses every `--context` argument into one combined map. Each argument
/// is auto-detected in order: existing file path, JSON object, then
/// `KEY=VALUE` pairs separated by commas or whitespace.
pub fn parse_context_args(inputs: &[String]) -> Result<Option<ContextMap>> {
    if inputs.is_empty() {
        return Ok(None);
    }
    let mut map = ContextMap::default();
    for input in inputs {
        parse_one(input, &mut map)?;
    }
    if map.is_empty() {
        bail!("no context variables parsed from input");
    }
    Ok(Some(map))
}

fn parse_one(input: &str, map: &mut ContextMap) -> Result<()> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("context input cannot be empty");
    }

    if Path::new(trimmed).is_file() {
        let content = std::fs::read_to_string(trimmed)
            .with_context(|| format!("read context file {trimmed}"))?;
        let parsed: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in context file {trimmed}"))?;
        return install_object(parsed, map)
            .with_context(|| format!("context file {trimmed}"));
    }

    if trimmed.starts_with('{') {
        let parsed: Value =
            serde_json::from_str(trimmed).context("invalid JSON context object")?;
        return install_object(parsed, map);
    }

    for item in trimmed
        .split([',', ' ', '\t', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
    {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid context format '{item}': expected KEY=VALUE or JSON");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("empty key in context pair '{item}'");
        }
        map.insert_value(key, Value::String(value.trim().to_string()))?;
    }
    Ok(())
}

fn install_object(parsed: Value, map: &mut ContextMap) -> Result<()> {
    let Value::Object(entries) = parsed else {
        bail!("context JSON must be an object");
    };
    for (key, value) in entries {
        map.insert_value(&key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ContextPolicy, parse_context_args};

    #[test]
    fn parses_key_value_pairs() {
        let map = parse_context_args(&["BASE=https://api.example.com,CDN=https://cdn.com".into()])
            .unwrap()
            .unwrap();
        assert_eq!(
            map.scalars.get("BASE").unwrap(),
            &vec!["https://api.example.com".to_string()]
        );
        assert_eq!(
            map.scalars.get("CDN").unwrap(),
            &vec!["https://cdn.com".to_string()]
        );
    }

    #[test]
    fn parses_json_objects() {
        let map = parse_context_args(&[r#"{"BASE":"https://api.example.com","n":3}"#.into()])
            .unwrap()
            .unwrap();
        assert_eq!(
            map.scalars.get("BASE").unwrap(),
            &vec!["https://api.example.com".to_string()]
        );
        assert_eq!(map.scalars.get("n").unwrap(), &vec!["3".to_string()]);
    }

    #[test]
    fn nested_json_objects_become_shapes() {
        let map = parse_context_args(&[r#"{"config":{"api":{"base":"/v2"}}}"#.into()])
            .unwrap()
            .unwrap();
        assert!(map.shapes.contains_key("config"));
    }

    #[test]
    fn dotted_location_keys_become_overrides() {
        let map = parse_context_args(&["window.location.host=example.com".into()])
            .unwrap()
            .unwrap();
        assert_eq!(map.location.get("host").unwrap(), "example.com");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_context_args(&["notapair".into()]).is_err());
        assert!(parse_context_args(&["{broken".into()]).is_err());
    }

    #[test]
    fn default_policy_is_merge() {
        assert_eq!(ContextPolicy::default(), ContextPolicy::Merge);
    }
}
