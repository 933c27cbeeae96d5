//! Selector evaluation for in-memory document matching.
//!
//! Selectors follow the document-store convention: each key is a top-level
//! or dotted field path mapped either to a value (equality) or to an
//! operator document such as `{ "$gt": 3 }`. `$and` and `$or` combine
//! sub-selectors.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docmap_core::error::{DocMapError, DocMapResult};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalised to `f64` so that `1_i32` equals `1.0`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Anything else; compared by exact value.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Returns `true` if `value` is a document of `$`-prefixed operators.
pub(crate) fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(doc) => doc
            .keys()
            .next()
            .is_some_and(|key| key.starts_with('$')),
        _ => false,
    }
}

/// Resolves a top-level or dotted field path.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = document;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_document()?;
    }

    None
}

/// Writes `value` at a top-level or dotted field path, creating intermediate documents.
pub(crate) fn set_path(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}

/// Builds the document an upsert starts from: the selector's plain equality keys.
pub(crate) fn seed_from_selector(selector: &Document) -> Document {
    let mut seed = Document::new();

    for (key, value) in selector {
        if key.starts_with('$') || is_operator_document(value) {
            continue;
        }
        set_path(&mut seed, key, value.clone());
    }

    seed
}

pub(crate) struct SelectorEvaluator<'a> {
    document: &'a Document,
}

impl<'a> SelectorEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if every clause of `selector` holds for the document.
    pub fn matches(&self, selector: &Document) -> DocMapResult<bool> {
        for (key, expected) in selector {
            let matched = match key.as_str() {
                "$and" => self.visit_all(expected)?,
                "$or" => self.visit_any(expected)?,
                op if op.starts_with('$') => {
                    return Err(DocMapError::Backend(format!("unsupported selector operator {op}")));
                }
                path => self.visit_field(path, expected)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn clauses<'s>(value: &'s Bson) -> DocMapResult<impl Iterator<Item = DocMapResult<&'s Document>>> {
        let items = value
            .as_array()
            .ok_or_else(|| DocMapError::Backend("logical operators take an array".to_string()))?;

        Ok(items.iter().map(|item| {
            item.as_document()
                .ok_or_else(|| DocMapError::Backend("logical clauses must be documents".to_string()))
        }))
    }

    fn visit_all(&self, value: &Bson) -> DocMapResult<bool> {
        for clause in Self::clauses(value)? {
            if !self.matches(clause?)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_any(&self, value: &Bson) -> DocMapResult<bool> {
        for clause in Self::clauses(value)? {
            if self.matches(clause?)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_field(&self, path: &str, expected: &Bson) -> DocMapResult<bool> {
        let actual = lookup(self.document, path);

        match expected {
            Bson::Document(ops) if is_operator_document(expected) => {
                for (op, operand) in ops {
                    if !Self::visit_operator(actual, op, operand)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(Self::equals(actual, expected)),
        }
    }

    fn visit_operator(actual: Option<&Bson>, op: &str, operand: &Bson) -> DocMapResult<bool> {
        Ok(match op {
            "$eq" => Self::equals(actual, operand),
            "$ne" => !Self::equals(actual, operand),
            "$exists" => actual.is_some() == operand.as_bool().unwrap_or(true),
            "$in" => Self::any_of(actual, operand)?,
            "$nin" => !Self::any_of(actual, operand)?,
            "$gt" | "$gte" | "$lt" | "$lte" => match actual {
                Some(value) => match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
                    Some(ordering) => match op {
                        "$gt" => ordering == Ordering::Greater,
                        "$gte" => ordering != Ordering::Less,
                        "$lt" => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                },
                None => false,
            },
            other => {
                return Err(DocMapError::Backend(format!("unsupported selector operator {other}")));
            }
        })
    }

    /// Equality with the usual array semantics: an array field matches a
    /// scalar it contains, and a missing field equals `null`.
    fn equals(actual: Option<&Bson>, expected: &Bson) -> bool {
        let expected = Comparable::from(expected);

        match actual {
            None => expected == Comparable::Null,
            Some(value) => {
                let value = Comparable::from(value);
                if value == expected {
                    return true;
                }
                match value {
                    Comparable::Array(items) => items.iter().any(|item| item == &expected),
                    _ => false,
                }
            }
        }
    }

    fn any_of(actual: Option<&Bson>, operand: &Bson) -> DocMapResult<bool> {
        let candidates = operand
            .as_array()
            .ok_or_else(|| DocMapError::Backend("$in and $nin take an array".to_string()))?;

        Ok(candidates
            .iter()
            .any(|candidate| Self::equals(actual, candidate)))
    }
}
