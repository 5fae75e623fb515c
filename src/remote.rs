//! Remote document store boundary.
//!
//! The hosted document database is an external collaborator; this module
//! defines the shape the rest of the crate programs against: dynamic field
//! values, documents, query predicates and the async [`DocumentStore`]
//! trait. Production wires a real client behind the trait; tests use an
//! in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::time::WireTimestamp;

/// Field map of a document.
pub type Fields = BTreeMap<String, WireValue>;

/// A dynamically typed document field value.
///
/// Date-bearing fields are `Timestamp` on the wire and `Integer` (epoch-ms)
/// everywhere inside the cache; the codec in [`crate::time`] translates.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Timestamp(WireTimestamp),
    Array(Vec<WireValue>),
    Map(Fields),
}

impl WireValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            WireValue::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Text(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Text(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Integer(value)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

/// A document as fetched from (or destined for) the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned identifier; authoritative for cached entities.
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn opt_str(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(|v| v.as_str()).map(String::from)
    }

    pub fn require_str(&self, name: &str) -> Result<String> {
        self.opt_str(name)
            .ok_or_else(|| Error::malformed(&self.id, format!("missing string field '{name}'")))
    }

    pub fn require_i64(&self, name: &str) -> Result<i64> {
        self.fields
            .get(name)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| Error::malformed(&self.id, format!("missing integer field '{name}'")))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool> {
        self.fields
            .get(name)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| Error::malformed(&self.id, format!("missing boolean field '{name}'")))
    }
}

/// Query predicate. The store evaluates these server-side.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals value.
    Eq(String, WireValue),
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Server-side ordering of query results.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Path to a document within a collection.
pub fn document_path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

/// Path to a subcollection nested under a parent document.
pub fn subcollection_path(collection: &str, parent_id: &str, sub: &str) -> String {
    format!("{collection}/{parent_id}/{sub}")
}

/// Abstract asynchronous document store.
///
/// All calls are non-blocking; settlement order across concurrent calls is
/// not guaranteed (network reordering is possible). Timeouts and retries,
/// if any, belong to the implementation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, `None` if absent.
    async fn get(&self, path: &str) -> Result<Option<Document>>;

    /// Query a collection.
    async fn query(
        &self,
        collection: &str,
        predicates: &[Predicate],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>>;

    /// Create a document with a store-assigned id; returns the id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Patch an existing document.
    async fn update(&self, path: &str, patch: Fields) -> Result<()>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}
