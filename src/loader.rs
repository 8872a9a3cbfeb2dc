//! Loading schemas from JSON
//!
//! Object keys starting with `$` are directives:
//!
//! | key          | value                                   |
//! |--------------|-----------------------------------------|
//! | `$rule`      | CSS selector string                     |
//! | `$topLevel`  | boolean                                 |
//! | `$sanitizer` | sanitizer name (`$fn` is an alias)      |
//! | `$post`      | post-processor name                     |
//! | `$ignore`    | ignore filter name                      |
//! | `$constant`  | any JSON value, returned verbatim       |
//!
//! Every other non-empty key is a field. Hook names are resolved against a
//! [`HookRegistry`]. Everything is validated while loading, so a loaded
//! schema cannot fail on shape errors during extraction.

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::Rule;
use crate::error::{describe, ExtractError, Result};
use crate::hooks::HookRegistry;
use crate::schema::{RecordSchema, Schema};

const RULE: &str = "$rule";
const TOP_LEVEL: &str = "$topLevel";
const SANITIZER: &str = "$sanitizer";
const SANITIZER_ALIAS: &str = "$fn";
const POST: &str = "$post";
const IGNORE: &str = "$ignore";
const CONSTANT: &str = "$constant";

const RESERVED: [&str; 7] = [RULE, TOP_LEVEL, SANITIZER, SANITIZER_ALIAS, POST, IGNORE, CONSTANT];

impl Schema {
    /// Build a schema from a JSON value, resolving hook names in `hooks`.
    pub fn from_value(value: &Value, hooks: &HookRegistry) -> Result<Self> {
        match value {
            Value::String(_) | Value::Array(_) | Value::Object(_) => {
                let schema = load(value, hooks, "$")?;
                debug!("schema loaded");
                Ok(schema)
            }
            other => Err(ExtractError::InvalidSchemaRoot {
                found: describe(other),
            }),
        }
    }

    /// Parse JSON text and build a schema from it.
    pub fn from_json_str(json: &str, hooks: &HookRegistry) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Schema::from_value(&value, hooks)
    }
}

fn load(value: &Value, hooks: &HookRegistry, path: &str) -> Result<Schema> {
    match value {
        Value::String(selector) => Ok(Schema::Rule(Rule::parse(selector)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| load(item, hooks, &format!("{path}[{index}]")))
            .collect::<Result<Vec<_>>>()
            .map(Schema::List),
        Value::Object(map) => load_record(map, hooks, path).map(Schema::Record),
        other => Err(ExtractError::InvalidSchemaShape {
            path: path.to_string(),
            found: describe(other),
        }),
    }
}

fn load_record(map: &Map<String, Value>, hooks: &HookRegistry, path: &str) -> Result<RecordSchema> {
    let mut record = RecordSchema::new();

    // `null`, `false` and "" mean no rule
    if let Some(rule) = map.get(RULE).filter(|v| is_set(v)) {
        let selector = rule.as_str().ok_or_else(|| ExtractError::InvalidRuleType {
            path: path.to_string(),
            found: describe(rule),
        })?;
        record.rule = Some(Rule::parse(selector)?);
    }

    if let Some(flag) = map.get(TOP_LEVEL) {
        record.top_level = flag.as_bool().ok_or_else(|| ExtractError::InvalidFlagType {
            path: path.to_string(),
            found: describe(flag),
        })?;
    }

    let sanitizer = map
        .get(SANITIZER)
        .map(|v| (SANITIZER, v))
        .or_else(|| map.get(SANITIZER_ALIAS).map(|v| (SANITIZER_ALIAS, v)));
    if let Some((directive, value)) = sanitizer {
        let name = hook_name(directive, value, path)?;
        let hook = hooks.sanitizer(name).ok_or_else(|| unknown("sanitizer", name, path))?;
        record.sanitizer = Some(hook);
    }

    if let Some(value) = map.get(POST) {
        let name = hook_name(POST, value, path)?;
        let hook = hooks.post(name).ok_or_else(|| unknown("post-processor", name, path))?;
        record.post = Some(hook);
    }

    if let Some(value) = map.get(IGNORE) {
        let name = hook_name(IGNORE, value, path)?;
        let hook = hooks.ignore(name).ok_or_else(|| unknown("ignore filter", name, path))?;
        record.ignore = Some(hook);
    }

    // falsy constants fall through to normal evaluation
    record.constant = map.get(CONSTANT).filter(|v| is_set(v)).cloned();

    for (key, value) in map {
        if key.is_empty() || RESERVED.contains(&key.as_str()) {
            continue;
        }
        let field = load(value, hooks, &format!("{path}.{key}"))?;
        record.fields.push((key.clone(), field));
    }

    Ok(record)
}

/// `null`, `false`, `0` and "" leave a directive unset.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

fn hook_name<'v>(directive: &'static str, value: &'v Value, path: &str) -> Result<&'v str> {
    value.as_str().ok_or_else(|| ExtractError::InvalidHookType {
        path: path.to_string(),
        directive,
        found: describe(value),
    })
}

fn unknown(kind: &'static str, name: &str, path: &str) -> ExtractError {
    ExtractError::UnknownHook {
        path: path.to_string(),
        kind,
        name: name.to_string(),
    }
}
