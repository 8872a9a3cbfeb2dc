//! Document facade over the scraper crate
//!
//! The interpreter only ever asks two things of a document: the elements a
//! rule matches under some context, and the text of a context. Everything
//! about HTML parsing and CSS matching lives behind this module.

use std::str::FromStr;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// How the source markup is handed to the HTML parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Full document; missing `<html>`/`<head>`/`<body>` are synthesized.
    #[default]
    Document,
    /// Fragment parsing, for snippets that are not whole pages.
    Fragment,
}

/// Options forwarded to the HTML parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    pub mode: ParseMode,
}

/// A compiled CSS selector together with the string it was compiled from.
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    selector: Selector,
}

impl Rule {
    /// Compile a selector string.
    pub fn parse(source: &str) -> Result<Self> {
        let selector = Selector::parse(source).map_err(|e| ExtractError::InvalidSelector {
            selector: source.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    /// The selector string this rule was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl FromStr for Rule {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        Rule::parse(s)
    }
}

/// Where a rule is evaluated.
///
/// `Document` stands for the whole document and is distinct from an empty
/// match set: a rule evaluated against `Document` searches every element.
#[derive(Debug, Clone, Copy)]
pub enum Context<'a> {
    Document,
    Node(ElementRef<'a>),
}

/// A parsed HTML document. Never mutated once parsed.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse markup according to `options`.
    pub fn parse(source: &str, options: &DocumentOptions) -> Self {
        let html = match options.mode {
            ParseMode::Document => Html::parse_document(source),
            ParseMode::Fragment => Html::parse_fragment(source),
        };
        Self { html }
    }

    /// Elements matching `rule` under `context`, in document order.
    ///
    /// A node context only searches its descendants, never the node itself.
    pub fn select<'a>(&'a self, context: Context<'a>, rule: &Rule) -> Vec<ElementRef<'a>> {
        match context {
            Context::Document => self.html.select(rule.selector()).collect(),
            Context::Node(element) => element.select(rule.selector()).collect(),
        }
    }

    /// The element standing for `context`; the root element for `Document`.
    pub fn element<'a>(&'a self, context: Context<'a>) -> ElementRef<'a> {
        match context {
            Context::Document => self.html.root_element(),
            Context::Node(element) => element,
        }
    }

    /// Concatenated text of `context`, untrimmed.
    pub fn text(&self, context: Context<'_>) -> String {
        element_text(self.element(context))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.html.root_element().value().name())
            .finish()
    }
}

/// Concatenated text content of an element, untrimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = concat!(
        "<html><body>",
        "<ul class=\"menu\"><li>Home</li><li>About</li></ul>",
        "<ul class=\"other\"><li>Contact</li></ul>",
        "</body></html>",
    );

    #[test]
    fn test_select_whole_document() {
        let document = Document::parse(HTML, &DocumentOptions::default());
        let rule = Rule::parse("li").unwrap();

        let texts: Vec<String> = document
            .select(Context::Document, &rule)
            .into_iter()
            .map(element_text)
            .collect();
        assert_eq!(texts, vec!["Home", "About", "Contact"]);
    }

    #[test]
    fn test_select_within_node() {
        let document = Document::parse(HTML, &DocumentOptions::default());
        let menu = document.select(Context::Document, &Rule::parse("ul.menu").unwrap())[0];

        let items = document.select(Context::Node(menu), &Rule::parse("li").unwrap());
        assert_eq!(items.len(), 2);

        // the context node itself is not a candidate
        let lists = document.select(Context::Node(menu), &Rule::parse("ul").unwrap());
        assert!(lists.is_empty());
    }

    #[test]
    fn test_document_text() {
        let document = Document::parse(HTML, &DocumentOptions::default());
        assert_eq!(document.text(Context::Document), "HomeAboutContact");
    }

    #[test]
    fn test_fragment_mode() {
        let options = DocumentOptions {
            mode: ParseMode::Fragment,
        };
        let document = Document::parse("<span>a</span><span>b</span>", &options);
        let spans = document.select(Context::Document, &Rule::parse("span").unwrap());
        assert_eq!(spans.len(), 2);
        assert_eq!(document.text(Context::Document), "ab");
    }

    #[test]
    fn test_invalid_selector() {
        let err = Rule::parse("td[").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSelector { .. }));

        let rule: Rule = "div.product .price".parse().unwrap();
        assert_eq!(rule.as_str(), "div.product .price");
    }

    #[test]
    fn test_options_from_json() {
        let options: DocumentOptions = serde_json::from_str(r#"{"mode": "fragment"}"#).unwrap();
        assert_eq!(options.mode, ParseMode::Fragment);

        let options: DocumentOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.mode, ParseMode::Document);
    }
}
