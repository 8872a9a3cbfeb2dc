//! Error types for schema loading and extraction

use thiserror::Error;

/// Error returned by a caller-supplied hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by hooks.
pub type HookResult<T> = std::result::Result<T, HookError>;

/// Everything that can go wrong while building a schema or running it.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The schema root is not a string, array or object.
    #[error("schema root must be a string, array or object, got {found}")]
    InvalidSchemaRoot { found: String },

    /// A nested schema value is not a string, array or object.
    #[error("schema values must be a string, array or object, got {found} at {path}")]
    InvalidSchemaShape { path: String, found: String },

    /// `$rule` is present but is not a string.
    #[error("rule at {path} must be a string, got {found}")]
    InvalidRuleType { path: String, found: String },

    /// A hook directive is present but does not reference a hook.
    #[error("{directive} at {path} must name a hook, got {found}")]
    InvalidHookType {
        path: String,
        directive: &'static str,
        found: String,
    },

    /// `$topLevel` is present but is not a boolean.
    #[error("$topLevel at {path} must be a boolean, got {found}")]
    InvalidFlagType { path: String, found: String },

    /// A hook name that the registry cannot resolve.
    #[error("no {kind} named {name:?} is registered (at {path})")]
    UnknownHook {
        path: String,
        kind: &'static str,
        name: String,
    },

    /// The CSS selector engine rejected a rule.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Malformed schema or options JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A hook failed; the hook's own error is passed through.
    #[error(transparent)]
    Hook(HookError),
}

/// Convenience alias for results with [`ExtractError`].
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Short description of a JSON value for error messages.
pub(crate) fn describe(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
