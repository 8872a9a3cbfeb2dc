//! Raw result tree and canonicalization
//!
//! The interpreter produces a [`RawValue`] tree in which every selector
//! evaluation yields a list, even when it matched a single element.
//! Canonicalization collapses those incidental one-element lists while
//! keeping lists the schema author declared explicitly.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `structural` marks a one-item list declared in the schema; such a list
    /// is never collapsed into its element.
    List { items: Vec<RawValue>, structural: bool },
    /// Entries in field declaration order.
    Record(Vec<(String, RawValue)>),
    Scalar(Value),
}

impl RawValue {
    /// A list produced by selector matching.
    pub fn matches(items: Vec<RawValue>) -> Self {
        RawValue::List {
            items,
            structural: false,
        }
    }

    /// A list produced by a list schema; structural when it holds one item.
    pub fn declared(items: Vec<RawValue>) -> Self {
        let structural = items.len() == 1;
        RawValue::List { items, structural }
    }

    /// Collapse non-structural single-element lists, children first.
    ///
    /// The output keeps structural flags, so canonicalizing twice gives the
    /// same tree as canonicalizing once.
    pub fn canonicalize(self) -> RawValue {
        match self {
            RawValue::List {
                items,
                structural: false,
            } if items.len() == 1 => match items.into_iter().next() {
                Some(only) => only.canonicalize(),
                None => RawValue::matches(Vec::new()),
            },
            RawValue::List { items, structural } => RawValue::List {
                items: items.into_iter().map(RawValue::canonicalize).collect(),
                structural,
            },
            RawValue::Record(entries) => RawValue::Record(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.canonicalize()))
                    .collect(),
            ),
            scalar @ RawValue::Scalar(_) => scalar,
        }
    }

    /// Convert to JSON without collapsing anything.
    pub fn into_value(self) -> Value {
        match self {
            RawValue::List { items, .. } => {
                Value::Array(items.into_iter().map(RawValue::into_value).collect())
            }
            RawValue::Record(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key, value.into_value());
                }
                Value::Object(map)
            }
            RawValue::Scalar(value) => value,
        }
    }
}

/// Canonicalize a raw tree and convert it to JSON.
pub fn canonicalize(raw: RawValue) -> Value {
    raw.canonicalize().into_value()
}

/// Canonicalize each top-level element; the top-level list never collapses.
///
/// A root constant that is itself an array is the top-level list.
pub fn canonicalize_top_level(raw: RawValue) -> Vec<Value> {
    match raw {
        RawValue::List { items, .. } => items.into_iter().map(canonicalize).collect(),
        RawValue::Scalar(Value::Array(items)) => items,
        other => vec![canonicalize(other)],
    }
}
