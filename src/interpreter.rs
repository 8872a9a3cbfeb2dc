//! Schema interpreter
//!
//! Walks a schema depth-first against a document and produces the raw
//! result tree. The ambient sanitizer is passed down explicitly: a record's
//! sanitizer reaches the record's own leaf value and its direct fields, and
//! lists hand it through unchanged. It never crosses a second record
//! boundary unless that record declares it again.

use serde_json::Value;
use tracing::trace;

use crate::canonical::RawValue;
use crate::document::{Context, Document, Rule};
use crate::error::{ExtractError, Result};
use crate::hooks::Sanitizer;
use crate::schema::{RecordSchema, Schema};

/// Per-call evaluation state. Nothing here outlives a parse call.
pub struct Interpreter<'d> {
    document: &'d Document,
    params: &'d Value,
}

impl<'d> Interpreter<'d> {
    pub fn new(document: &'d Document, params: &'d Value) -> Self {
        Self { document, params }
    }

    /// Evaluate `schema` under `context`.
    pub fn evaluate(
        &self,
        context: Context<'d>,
        schema: &Schema,
        sanitizer: Option<&Sanitizer>,
    ) -> Result<RawValue> {
        match schema {
            Schema::Rule(rule) => self.evaluate_rule(context, rule, sanitizer),
            Schema::List(items) => self.evaluate_list(context, items, sanitizer),
            Schema::Record(record) => self.evaluate_record(context, record, sanitizer),
        }
    }

    fn evaluate_rule(
        &self,
        context: Context<'d>,
        rule: &Rule,
        sanitizer: Option<&Sanitizer>,
    ) -> Result<RawValue> {
        let matched = self.document.select(context, rule);
        trace!(rule = rule.as_str(), matches = matched.len(), "rule selected");

        let items = matched
            .into_iter()
            .map(|element| self.leaf(Context::Node(element), sanitizer))
            .collect::<Result<Vec<_>>>()?;

        Ok(RawValue::matches(items))
    }

    fn evaluate_list(
        &self,
        context: Context<'d>,
        items: &[Schema],
        sanitizer: Option<&Sanitizer>,
    ) -> Result<RawValue> {
        let items = items
            .iter()
            .map(|item| self.evaluate(context, item, sanitizer))
            .collect::<Result<Vec<_>>>()?;

        Ok(RawValue::declared(items))
    }

    fn evaluate_record(
        &self,
        context: Context<'d>,
        record: &RecordSchema,
        sanitizer: Option<&Sanitizer>,
    ) -> Result<RawValue> {
        if let Some(constant) = &record.constant {
            return Ok(RawValue::Scalar(constant.clone()));
        }

        let scope = if record.top_level {
            Context::Document
        } else {
            context
        };

        let mut results = Vec::new();
        match &record.rule {
            Some(rule) => {
                let matched = self.document.select(scope, rule);
                trace!(
                    rule = rule.as_str(),
                    matches = matched.len(),
                    top_level = record.top_level,
                    "record rule selected"
                );

                for element in matched {
                    if let Some(ignore) = &record.ignore {
                        if ignore.apply(element, self.params).map_err(ExtractError::Hook)? {
                            continue;
                        }
                    }
                    results.push(self.build(Context::Node(element), record, sanitizer)?);
                }
            }
            None => results.push(self.build(scope, record, sanitizer)?),
        }

        if let Some(post) = &record.post {
            results = results
                .into_iter()
                .map(|result| {
                    let value = result.canonicalize().into_value();
                    post.apply(value, self.params)
                        .map(RawValue::Scalar)
                        .map_err(ExtractError::Hook)
                })
                .collect::<Result<Vec<_>>>()?;
        }

        Ok(RawValue::matches(results))
    }

    /// One record instance: a leaf value when the record has no fields,
    /// otherwise a record of its evaluated fields.
    fn build(
        &self,
        context: Context<'d>,
        record: &RecordSchema,
        inherited: Option<&Sanitizer>,
    ) -> Result<RawValue> {
        if record.fields.is_empty() {
            let sanitizer = record.sanitizer.as_ref().or(inherited);
            return self.leaf(context, sanitizer);
        }

        // fields only see this record's own sanitizer
        let own = record.sanitizer.as_ref();
        let entries = record
            .fields
            .iter()
            .map(|(name, schema)| -> Result<(String, RawValue)> {
                Ok((name.clone(), self.evaluate(context, schema, own)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawValue::Record(entries))
    }

    fn leaf(&self, context: Context<'d>, sanitizer: Option<&Sanitizer>) -> Result<RawValue> {
        let value = match sanitizer {
            Some(sanitizer) => sanitizer
                .apply(self.document.element(context), self.params)
                .map_err(ExtractError::Hook)?,
            None => Value::String(self.document.text(context)),
        };
        Ok(RawValue::Scalar(value))
    }
}
