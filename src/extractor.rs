//! Schema-driven extraction entry point

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::canonical::canonicalize_top_level;
use crate::document::{Context, Document, DocumentOptions};
use crate::error::Result;
use crate::hooks::HookRegistry;
use crate::interpreter::Interpreter;
use crate::schema::Schema;

/// Extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    /// Forwarded to the HTML parser
    pub document: DocumentOptions,
    /// External variables handed to every hook
    pub params: Value,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            document: DocumentOptions::default(),
            params: Value::Object(Default::default()),
        }
    }
}

impl ExtractorOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Runs one schema against any number of documents.
///
/// Holds no per-call state, so a single extractor can serve concurrent
/// parse calls.
#[derive(Debug, Clone)]
pub struct Extractor {
    schema: Schema,
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(schema: Schema) -> Self {
        Self::with_options(schema, ExtractorOptions::default())
    }

    pub fn with_options(schema: Schema, options: ExtractorOptions) -> Self {
        Self { schema, options }
    }

    /// Load the schema from JSON, resolving hook names in `hooks`.
    pub fn from_value(schema: &Value, hooks: &HookRegistry) -> Result<Self> {
        Self::from_value_with_options(schema, hooks, ExtractorOptions::default())
    }

    pub fn from_value_with_options(
        schema: &Value,
        hooks: &HookRegistry,
        options: ExtractorOptions,
    ) -> Result<Self> {
        Ok(Self::with_options(Schema::from_value(schema, hooks)?, options))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Extract from HTML using the configured external variables.
    ///
    /// Always returns one entry per top-level match, even when there is
    /// exactly one.
    pub fn parse(&self, html: &str) -> Result<Vec<Value>> {
        self.parse_with(html, &self.options.params)
    }

    /// Extract from HTML with `params` replacing the configured external
    /// variables for this call only.
    pub fn parse_with(&self, html: &str, params: &Value) -> Result<Vec<Value>> {
        let document = Document::parse(html, &self.options.document);
        self.extract(&document, params)
    }

    /// Extract from an already parsed document.
    pub fn extract(&self, document: &Document, params: &Value) -> Result<Vec<Value>> {
        let interpreter = Interpreter::new(document, params);
        let raw = interpreter.evaluate(Context::Document, &self.schema, None)?;
        let values = canonicalize_top_level(raw);
        debug!(results = values.len(), "extraction finished");
        Ok(values)
    }
}
