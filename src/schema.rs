//! Structure checks for regenerated résumés.
//!
//! The rewrite step may change values but never the shape: keys, nesting and
//! the kind of every value must survive. [`compare_structure`] reports drift
//! by JSON path and [`conform`] forces a candidate back into the original
//! shape when retries did not fix it.

use serde_json::{Map, Value};
use std::fmt;

/// The kind of a JSON value, for shape comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        };
        f.write_str(name)
    }
}

/// One way in which a candidate departs from the original shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureDiff {
    MissingKey { path: String },
    ExtraKey { path: String },
    KindChanged { path: String, expected: Kind, found: Kind },
}

impl fmt::Display for StructureDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureDiff::MissingKey { path } => write!(f, "missing key {}", path),
            StructureDiff::ExtraKey { path } => write!(f, "unexpected key {}", path),
            StructureDiff::KindChanged {
                path,
                expected,
                found,
            } => write!(f, "{}: expected {}, found {}", path, expected, found),
        }
    }
}

/// Compare the shape of `candidate` against `original`.
///
/// Arrays may change length; each candidate element is compared against the
/// original's first element. An empty original array accepts any elements,
/// and an empty original object accepts any keys (category maps such as
/// `skills` start out empty when nothing was extracted). An empty result
/// means the structure was preserved.
pub fn compare_structure(original: &Value, candidate: &Value) -> Vec<StructureDiff> {
    let mut diffs = Vec::new();
    walk("$", original, candidate, &mut diffs);
    diffs
}

fn walk(path: &str, original: &Value, candidate: &Value, diffs: &mut Vec<StructureDiff>) {
    let (expected, found) = (Kind::of(original), Kind::of(candidate));
    if expected != found {
        diffs.push(StructureDiff::KindChanged {
            path: path.to_string(),
            expected,
            found,
        });
        return;
    }

    match (original, candidate) {
        (Value::Object(orig), Value::Object(_)) if orig.is_empty() => {}
        (Value::Object(orig), Value::Object(cand)) => {
            for (key, orig_value) in orig {
                let child = format!("{}.{}", path, key);
                match cand.get(key) {
                    Some(cand_value) => walk(&child, orig_value, cand_value, diffs),
                    None => diffs.push(StructureDiff::MissingKey { path: child }),
                }
            }
            for key in cand.keys() {
                if !orig.contains_key(key) {
                    diffs.push(StructureDiff::ExtraKey {
                        path: format!("{}.{}", path, key),
                    });
                }
            }
        }
        (Value::Array(orig), Value::Array(cand)) => {
            if let Some(template) = orig.first() {
                for (i, item) in cand.iter().enumerate() {
                    walk(&format!("{}[{}]", path, i), template, item, diffs);
                }
            }
        }
        _ => {}
    }
}

/// Produce a value with `original`'s shape, preferring `candidate`'s values.
///
/// Wherever the candidate has a value of the same kind it is taken (recursing
/// into objects and arrays); otherwise the original value is kept. Keys the
/// original does not have are dropped.
pub fn conform(original: &Value, candidate: &Value) -> Value {
    if Kind::of(original) != Kind::of(candidate) {
        return original.clone();
    }

    match (original, candidate) {
        (Value::Object(orig), Value::Object(_)) if orig.is_empty() => candidate.clone(),
        (Value::Object(orig), Value::Object(cand)) => {
            let mut out = Map::with_capacity(orig.len());
            for (key, orig_value) in orig {
                let value = match cand.get(key) {
                    Some(cand_value) => conform(orig_value, cand_value),
                    None => orig_value.clone(),
                };
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        (Value::Array(orig), Value::Array(cand)) => match orig.first() {
            Some(template) => Value::Array(
                cand.iter()
                    .filter(|item| Kind::of(item) == Kind::of(template))
                    .map(|item| conform(template, item))
                    .collect(),
            ),
            None => candidate.clone(),
        },
        _ => candidate.clone(),
    }
}
