//! Caller-supplied hooks and the registry that names them
//!
//! Hooks receive the external variables of the current parse call as their
//! second argument. They run synchronously and their errors are returned to
//! the caller untouched.
//!
//! Sanitizer names that are not registered fall back to built-in accessors:
//! - `text` - trimmed text content
//! - `html` / `inner_html` - outer or inner HTML
//! - `attr:NAME` - attribute value, `null` when absent
//! - `parent.<accessor>` - accessor applied to the parent element
//! - `children.N.<accessor>` - accessor applied to the N-th element child

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scraper::ElementRef;
use serde_json::Value;

use crate::document::element_text;
use crate::error::HookResult;

type SanitizeFn = dyn Fn(ElementRef<'_>, &Value) -> HookResult<Value> + Send + Sync;
type PostFn = dyn Fn(Value, &Value) -> HookResult<Value> + Send + Sync;
type IgnoreFn = dyn Fn(ElementRef<'_>, &Value) -> HookResult<bool> + Send + Sync;

/// Turns a matched element into a value, replacing plain text extraction.
#[derive(Clone)]
pub struct Sanitizer(Arc<SanitizeFn>);

impl Sanitizer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ElementRef<'_>, &Value) -> HookResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, element: ElementRef<'_>, params: &Value) -> HookResult<Value> {
        (self.0)(element, params)
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sanitizer(..)")
    }
}

/// Rewrites an already canonicalized per-match value.
#[derive(Clone)]
pub struct PostProcessor(Arc<PostFn>);

impl PostProcessor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &Value) -> HookResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value, params: &Value) -> HookResult<Value> {
        (self.0)(value, params)
    }
}

impl fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostProcessor(..)")
    }
}

/// Decides whether a matched element is dropped from the results.
#[derive(Clone)]
pub struct IgnoreFilter(Arc<IgnoreFn>);

impl IgnoreFilter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ElementRef<'_>, &Value) -> HookResult<bool> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, element: ElementRef<'_>, params: &Value) -> HookResult<bool> {
        (self.0)(element, params)
    }
}

impl fmt::Debug for IgnoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IgnoreFilter(..)")
    }
}

/// Named hooks, used when a schema is loaded from JSON.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    sanitizers: HashMap<String, Sanitizer>,
    posts: HashMap<String, PostProcessor>,
    ignores: HashMap<String, IgnoreFilter>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitizer(mut self, name: impl Into<String>, hook: Sanitizer) -> Self {
        self.register_sanitizer(name, hook);
        self
    }

    pub fn with_post(mut self, name: impl Into<String>, hook: PostProcessor) -> Self {
        self.register_post(name, hook);
        self
    }

    pub fn with_ignore(mut self, name: impl Into<String>, hook: IgnoreFilter) -> Self {
        self.register_ignore(name, hook);
        self
    }

    pub fn register_sanitizer(&mut self, name: impl Into<String>, hook: Sanitizer) {
        self.sanitizers.insert(name.into(), hook);
    }

    pub fn register_post(&mut self, name: impl Into<String>, hook: PostProcessor) {
        self.posts.insert(name.into(), hook);
    }

    pub fn register_ignore(&mut self, name: impl Into<String>, hook: IgnoreFilter) {
        self.ignores.insert(name.into(), hook);
    }

    /// Registered sanitizer, else a built-in accessor of that name.
    pub fn sanitizer(&self, name: &str) -> Option<Sanitizer> {
        if let Some(hook) = self.sanitizers.get(name) {
            return Some(hook.clone());
        }
        let accessor = Accessor::parse(name)?;
        Some(Sanitizer::new(move |element, _| Ok(accessor.apply(element))))
    }

    /// Registered post-processor, else a built-in string transform:
    /// `trim`, `lowercase`, `uppercase` or `parse_price`.
    /// Non-string values pass through the built-ins unchanged.
    pub fn post(&self, name: &str) -> Option<PostProcessor> {
        if let Some(hook) = self.posts.get(name) {
            return Some(hook.clone());
        }
        let transform: fn(&str) -> Value = match name {
            "trim" => |s| Value::String(s.trim().to_string()),
            "lowercase" => |s| Value::String(s.to_lowercase()),
            "uppercase" => |s| Value::String(s.to_uppercase()),
            "parse_price" => parse_price,
            _ => return None,
        };
        Some(PostProcessor::new(move |value, _| {
            Ok(match value {
                Value::String(s) => transform(&s),
                other => other,
            })
        }))
    }

    /// Registered ignore filter, else the built-in `blank`.
    pub fn ignore(&self, name: &str) -> Option<IgnoreFilter> {
        if let Some(hook) = self.ignores.get(name) {
            return Some(hook.clone());
        }
        match name {
            "blank" => Some(IgnoreFilter::new(|element, _| {
                Ok(element_text(element).trim().is_empty())
            })),
            _ => None,
        }
    }
}

/// Numeric part of a price like "€12.99" or "12,99 €"; `null` when there is none.
///
/// The first `.` or `,` after a digit is the decimal point and later ones are
/// dropped, so thousands separators are misread: "1,234.56" gives 1.23456.
fn parse_price(s: &str) -> Value {
    let mut digits = String::new();
    let mut has_decimal = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if (c == '.' || c == ',') && !has_decimal && !digits.is_empty() {
            digits.push('.');
            has_decimal = true;
        }
    }
    digits
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Built-in element accessor, e.g. `attr:href` or `children.0.text`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor {
    Text,
    Html,
    InnerHtml,
    Attr(String),
    Parent(Box<Accessor>),
    Child(usize, Box<Accessor>),
}

impl Accessor {
    fn parse(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("parent.") {
            return Some(Accessor::Parent(Box::new(Accessor::parse(rest)?)));
        }

        // children.N.<accessor>
        if let Some(rest) = name.strip_prefix("children.") {
            let (index, child) = rest.split_once('.')?;
            let index: usize = index.parse().ok()?;
            return Some(Accessor::Child(index, Box::new(Accessor::parse(child)?)));
        }

        match name {
            "text" => Some(Accessor::Text),
            "html" => Some(Accessor::Html),
            "inner_html" => Some(Accessor::InnerHtml),
            attr => {
                let attr_name = attr.strip_prefix("attr:")?;
                if attr_name.is_empty() {
                    None
                } else {
                    Some(Accessor::Attr(attr_name.to_string()))
                }
            }
        }
    }

    fn apply(&self, element: ElementRef<'_>) -> Value {
        match self {
            Accessor::Text => Value::String(element_text(element).trim().to_string()),
            Accessor::Html => Value::String(element.html()),
            Accessor::InnerHtml => Value::String(element.inner_html()),
            Accessor::Attr(name) => element
                .value()
                .attr(name)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null),
            Accessor::Parent(inner) => element
                .parent()
                .and_then(ElementRef::wrap)
                .map(|parent| inner.apply(parent))
                .unwrap_or(Value::Null),
            Accessor::Child(index, inner) => element
                .children()
                .filter_map(ElementRef::wrap)
                .nth(*index)
                .map(|child| inner.apply(child))
                .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Context, Document, DocumentOptions, Rule};
    use serde_json::json;

    const HTML: &str = r#"
    <html>
    <body>
        <div class="product-card" data-id="123">
            <span class="price"> $29.99 </span>
        </div>
        <ul class="menu">
            <li class="item"><a href="/home">Home</a></li>
            <li class="item"><a href="/about">About</a></li>
        </ul>
        <p class="empty">   </p>
    </body>
    </html>
    "#;

    fn first<'a>(document: &'a Document, selector: &str) -> ElementRef<'a> {
        document.select(Context::Document, &Rule::parse(selector).unwrap())[0]
    }

    #[test]
    fn test_accessor_parsing() {
        assert_eq!(Accessor::parse("text"), Some(Accessor::Text));
        assert_eq!(
            Accessor::parse("attr:href"),
            Some(Accessor::Attr("href".to_string()))
        );
        assert_eq!(
            Accessor::parse("children.1.attr:id"),
            Some(Accessor::Child(1, Box::new(Accessor::Attr("id".to_string()))))
        );
        assert_eq!(Accessor::parse("attr:"), None);
        assert_eq!(Accessor::parse("children.x.text"), None);
        assert_eq!(Accessor::parse("uppercase"), None);
    }

    #[test]
    fn test_builtin_sanitizers() {
        let document = Document::parse(HTML, &DocumentOptions::default());
        let registry = HookRegistry::new();
        let params = json!({});

        let price = first(&document, "span.price");
        let text = registry.sanitizer("text").unwrap();
        assert_eq!(text.apply(price, &params).unwrap(), json!("$29.99"));

        let parent_id = registry.sanitizer("parent.attr:data-id").unwrap();
        assert_eq!(parent_id.apply(price, &params).unwrap(), json!("123"));

        let missing = registry.sanitizer("attr:title").unwrap();
        assert_eq!(missing.apply(price, &params).unwrap(), Value::Null);

        let menu = first(&document, "ul.menu");
        let second = registry.sanitizer("children.1.text").unwrap();
        assert_eq!(second.apply(menu, &params).unwrap(), json!("About"));

        let link = first(&document, "li.item");
        let inner = registry.sanitizer("inner_html").unwrap();
        assert_eq!(
            inner.apply(link, &params).unwrap(),
            json!("<a href=\"/home\">Home</a>")
        );
    }

    #[test]
    fn test_registered_hooks_take_precedence() {
        let registry = HookRegistry::new()
            .with_sanitizer("text", Sanitizer::new(|_, _| Ok(json!("custom"))))
            .with_post("trim", PostProcessor::new(|_, params| Ok(params["tag"].clone())));

        let document = Document::parse(HTML, &DocumentOptions::default());
        let params = json!({"tag": "x"});
        let price = first(&document, "span.price");

        assert_eq!(
            registry.sanitizer("text").unwrap().apply(price, &params).unwrap(),
            json!("custom")
        );
        assert_eq!(
            registry.post("trim").unwrap().apply(json!(" a "), &params).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_builtin_post_and_ignore() {
        let registry = HookRegistry::new();
        let params = json!({});

        let trim = registry.post("trim").unwrap();
        assert_eq!(trim.apply(json!("  a "), &params).unwrap(), json!("a"));
        assert_eq!(trim.apply(json!({"k": 1}), &params).unwrap(), json!({"k": 1}));

        let document = Document::parse(HTML, &DocumentOptions::default());
        let blank = registry.ignore("blank").unwrap();
        assert!(blank.apply(first(&document, "p.empty"), &params).unwrap());
        assert!(!blank.apply(first(&document, "span.price"), &params).unwrap());

        assert!(registry.ignore("nothing").is_none());
        assert!(registry.post("nothing").is_none());
    }

    #[test]
    fn test_string_transforms() {
        let registry = HookRegistry::new();
        let params = json!({});
        let run = |name: &str, value: Value| {
            registry.post(name).unwrap().apply(value, &params).unwrap()
        };

        assert_eq!(run("lowercase", json!("Apple")), json!("apple"));
        assert_eq!(run("uppercase", json!("Apple")), json!("APPLE"));
        assert_eq!(run("parse_price", json!("€12.99")), json!(12.99));
        assert_eq!(run("parse_price", json!("12,99 €")), json!(12.99));
        assert_eq!(run("parse_price", json!("$0.40")), json!(0.4));
        assert_eq!(run("parse_price", json!("free")), Value::Null);
        // thousands separators are read as the decimal point
        assert_eq!(run("parse_price", json!("1,234.56")), json!(1.23456));
        assert_eq!(run("uppercase", json!(["a"])), json!(["a"]));
    }
}
