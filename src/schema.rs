//! Schema model
//!
//! A schema is one of three shapes:
//! - a rule (selector string): every match becomes one value
//! - a list: each item is evaluated against the same context
//! - a record: directives plus ordered named fields
//!
//! Schemas are immutable once built and can be reused by any number of
//! parse calls.

use serde_json::Value;

use crate::document::Rule;
use crate::error::Result;
use crate::hooks::{IgnoreFilter, PostProcessor, Sanitizer};

#[derive(Debug, Clone)]
pub enum Schema {
    Rule(Rule),
    List(Vec<Schema>),
    Record(RecordSchema),
}

impl Schema {
    /// Compile a selector into a rule schema.
    pub fn rule(selector: &str) -> Result<Self> {
        Ok(Schema::Rule(Rule::parse(selector)?))
    }

    pub fn list(items: impl IntoIterator<Item = Schema>) -> Self {
        Schema::List(items.into_iter().collect())
    }

    /// Shorthand for a record holding only a constant.
    pub fn constant(value: Value) -> Self {
        Schema::Record(RecordSchema::new().with_constant(value))
    }
}

impl From<Rule> for Schema {
    fn from(rule: Rule) -> Self {
        Schema::Rule(rule)
    }
}

impl From<RecordSchema> for Schema {
    fn from(record: RecordSchema) -> Self {
        Schema::Record(record)
    }
}

/// A record node. `fields` never holds directive keys.
#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    pub rule: Option<Rule>,
    /// Evaluate against the whole document instead of the parent context.
    pub top_level: bool,
    pub sanitizer: Option<Sanitizer>,
    pub post: Option<PostProcessor>,
    pub ignore: Option<IgnoreFilter>,
    /// When set, the node yields this value and nothing else is consulted.
    pub constant: Option<Value>,
    pub fields: Vec<(String, Schema)>,
}

impl RecordSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, selector: &str) -> Result<Self> {
        self.rule = Some(Rule::parse(selector)?);
        Ok(self)
    }

    pub fn with_top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    pub fn with_post(mut self, post: PostProcessor) -> Self {
        self.post = Some(post);
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn with_constant(mut self, value: Value) -> Self {
        self.constant = Some(value);
        self
    }

    /// Append a field; fields are emitted in the order they are added.
    /// Re-adding a name replaces the earlier schema in place.
    pub fn with_field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let name = name.into();
        let schema = schema.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = schema,
            None => self.fields.push((name, schema)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_order_is_declaration_order() {
        let record = RecordSchema::new()
            .with_field("name", Schema::rule("td:nth-child(1)").unwrap())
            .with_field("code", Schema::rule("td:nth-child(2)").unwrap())
            .with_field("price", Schema::rule("td:nth-child(3)").unwrap());

        let names: Vec<&str> = record.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "code", "price"]);
    }

    #[test]
    fn test_duplicate_field_replaces_in_place() {
        let record = RecordSchema::new()
            .with_field("a", Schema::constant(json!(1)))
            .with_field("b", Schema::constant(json!(2)))
            .with_field("a", Schema::constant(json!(3)));

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].0, "a");
        match &record.fields[0].1 {
            Schema::Record(inner) => assert_eq!(inner.constant, Some(json!(3))),
            other => panic!("unexpected schema: {:?}", other),
        }
    }

    #[test]
    fn test_rule_must_compile() {
        assert!(Schema::rule("tr > td").is_ok());
        assert!(RecordSchema::new().with_rule("").is_err());
    }
}
