//! Declarative HTML extraction
//!
//! Describe the shape of the data once as a schema and run it against any
//! number of documents:
//! - a string is a CSS selector; each match yields its text
//! - an array is a list of sub-schemas evaluated against the same context
//! - an object selects with `$rule` and builds one record per match from its
//!   other keys, with `$sanitizer`, `$post`, `$ignore`, `$topLevel` and
//!   `$constant` as directives
//!
//! Selector results that match a single element collapse to that element;
//! one-item arrays written in the schema stay arrays.

pub mod canonical;
pub mod document;
pub mod error;
pub mod extractor;
pub mod ffi;
pub mod hooks;
pub mod interpreter;
pub mod loader;
pub mod schema;

pub use canonical::{canonicalize, RawValue};
pub use document::{element_text, Context, Document, DocumentOptions, ParseMode, Rule};
pub use error::{ExtractError, HookError, HookResult, Result};
pub use extractor::{Extractor, ExtractorOptions};
pub use ffi::*;
pub use hooks::{HookRegistry, IgnoreFilter, PostProcessor, Sanitizer};
pub use schema::{RecordSchema, Schema};
