//! Entity family seam.
//!
//! Each remote document family (tasks, posts, profiles) implements
//! [`Entity`]: the wire-field mapping, the date fields the codec converts at
//! the boundary, and the optional hooks the dispatcher needs for toggles and
//! embedded subcollections.

use crate::error::{Error, Result};
use crate::remote::{Document, Fields};

/// How a subcollection child id maps onto remote documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSelector {
    /// The child id is the remote document id.
    DocId,
    /// The child id is matched against a field of the child documents
    /// (used for likes, where the cache tracks liker user ids).
    Field(&'static str),
}

/// A cached remote document family.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Family name used in logs and error messages.
    const FAMILY: &'static str;

    /// Root collection path in the remote store.
    const COLLECTION: &'static str;

    /// Epoch-ms fields converted by the codec at the wire boundary.
    const DATE_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    /// Wire fields of this record, dates as plain epoch-ms integers.
    /// The record id is the document id, never a field.
    fn to_fields(&self) -> Fields;

    /// Build a record from a fetched document whose date fields have
    /// already been decoded to integers.
    fn from_document(doc: &Document) -> Result<Self>;

    /// Read a boolean field reachable by the toggle intent.
    fn flag(&self, field: &str) -> Option<bool> {
        let _ = field;
        None
    }

    /// Write a boolean field reachable by the toggle intent.
    fn set_flag(&mut self, field: &str, value: bool) {
        let _ = (field, value);
    }

    /// Date fields of a subcollection family, for boundary conversion.
    fn child_date_fields(sub: &str) -> &'static [&'static str] {
        let _ = sub;
        &[]
    }

    /// How child ids of a subcollection resolve to remote documents.
    fn child_selector(sub: &str) -> Result<ChildSelector> {
        Err(Error::UnknownSubcollection {
            family: Self::FAMILY,
            sub: sub.to_string(),
        })
    }

    /// Embed a confirmed subcollection child into this record.
    fn embed_child(&mut self, sub: &str, doc: &Document) -> Result<()> {
        let _ = doc;
        Err(Error::UnknownSubcollection {
            family: Self::FAMILY,
            sub: sub.to_string(),
        })
    }

    /// Remove an embedded subcollection child from this record.
    fn remove_child(&mut self, sub: &str, child_id: &str) -> Result<()> {
        let _ = child_id;
        Err(Error::UnknownSubcollection {
            family: Self::FAMILY,
            sub: sub.to_string(),
        })
    }
}
