//! Mutation dispatcher.
//!
//! One async operation per intent kind. Every intent follows the same
//! lifecycle: the family's loading flag for that kind goes up and the error
//! slot clears before the remote call; on settlement the cache update (if
//! any) and the flag clear land in a single critical section, so readers
//! never observe the new record with the flag still set.
//!
//! Date-bearing payload fields are converted by the codec on a copy; the
//! caller's payload keeps its plain epoch-ms integers.
//!
//! Operations on the same entity id are not serialized here: if two intents
//! race, the cache reflects whichever settlement applies last.

use std::sync::Arc;

use tracing::{debug, warn};
use ulid::Ulid;

use crate::cache::{OpKind, SharedCache};
use crate::config::DispatchConfig;
use crate::entity::{ChildSelector, Entity};
use crate::error::{Error, Result};
use crate::remote::{
    document_path, subcollection_path, Document, DocumentStore, Fields, Predicate, WireValue,
};
use crate::time;

/// Issues mutation intents for one entity family.
pub struct Dispatcher<T: Entity> {
    remote: Arc<dyn DocumentStore>,
    cache: SharedCache<T>,
    config: DispatchConfig,
}

impl<T: Entity> Dispatcher<T> {
    pub fn new(remote: Arc<dyn DocumentStore>, cache: SharedCache<T>, config: DispatchConfig) -> Self {
        Self {
            remote,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &SharedCache<T> {
        &self.cache
    }

    fn begin(&self, kind: OpKind) {
        let mut cache = self.cache.write();
        cache.set_error(None);
        cache.set_loading(kind, true);
        debug!(family = T::FAMILY, op = kind.as_str(), "dispatching");
    }

    fn fail(&self, kind: OpKind, err: &Error) {
        warn!(family = T::FAMILY, op = kind.as_str(), error = %err, "dispatch failed");
        let mut cache = self.cache.write();
        cache.set_error(Some(err.to_string()));
        cache.set_loading(kind, false);
    }

    /// Create a document; the canonical record is the draft plus the
    /// store-assigned id.
    pub async fn create(&self, draft: Fields) -> Result<T> {
        self.begin(OpKind::Create);
        let wire = time::encode_date_fields(&draft, T::DATE_FIELDS);
        let result = self.remote.add(T::COLLECTION, wire).await.and_then(|id| {
            T::from_document(&Document::new(id, draft))
        });
        match result {
            Ok(record) => {
                let mut cache = self.cache.write();
                cache.upsert_one(record.clone());
                cache.set_loading(OpKind::Create, false);
                Ok(record)
            }
            Err(err) => {
                self.fail(OpKind::Create, &err);
                Err(err)
            }
        }
    }

    /// Patch a document; the cache receives the merged record.
    pub async fn update(&self, id: &str, patch: Fields) -> Result<T> {
        self.begin(OpKind::Update);
        match self.update_inner(id, &patch).await {
            Ok(record) => {
                let mut cache = self.cache.write();
                cache.upsert_one(record.clone());
                cache.set_loading(OpKind::Update, false);
                Ok(record)
            }
            Err(err) => {
                self.fail(OpKind::Update, &err);
                Err(err)
            }
        }
    }

    async fn update_inner(&self, id: &str, patch: &Fields) -> Result<T> {
        let path = document_path(T::COLLECTION, id);
        let wire = time::encode_date_fields(patch, T::DATE_FIELDS);
        self.remote.update(&path, wire).await?;

        let cached = self.cache.read().get(id).cloned();
        match cached {
            Some(current) => {
                let mut merged = current.to_fields();
                for (name, value) in patch {
                    merged.insert(name.clone(), value.clone());
                }
                T::from_document(&Document::new(id, merged))
            }
            None => {
                // Not cached locally; fall back to the store's canonical copy.
                debug!(family = T::FAMILY, id, "updated record not cached, refetching");
                let mut doc = self
                    .remote
                    .get(&path)
                    .await?
                    .ok_or_else(|| Error::NotFound(path.clone()))?;
                time::decode_document_dates(&mut doc, T::DATE_FIELDS);
                T::from_document(&doc)
            }
        }
    }

    /// Delete a document and drop it from the cache.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.begin(OpKind::Remove);
        let path = document_path(T::COLLECTION, id);
        match self.remote.delete(&path).await {
            Ok(()) => {
                let mut cache = self.cache.write();
                cache.remove_one(id);
                cache.set_loading(OpKind::Remove, false);
                Ok(())
            }
            Err(err) => {
                self.fail(OpKind::Remove, &err);
                Err(err)
            }
        }
    }

    /// Flip a boolean field, computing the new value from the current
    /// cached record. Last writer wins if the cache is stale relative to
    /// the remote store; no server-side transaction protects the read.
    ///
    /// With `optimistic_toggle` the flip lands in the cache as a pending
    /// entry before dispatch and is confirmed or reverted on settlement.
    /// Returns the new value.
    pub async fn toggle_field(&self, id: &str, field: &str) -> Result<bool> {
        self.begin(OpKind::Toggle);

        let current = self.cache.read().get(id).cloned();
        let Some(current) = current else {
            let err = Error::NotFound(document_path(T::COLLECTION, id));
            self.fail(OpKind::Toggle, &err);
            return Err(err);
        };
        let Some(value) = current.flag(field) else {
            let err = Error::UnknownFlagField {
                family: T::FAMILY,
                field: field.to_string(),
            };
            self.fail(OpKind::Toggle, &err);
            return Err(err);
        };

        let next = !value;
        let mut flipped = current;
        flipped.set_flag(field, next);

        let intent = Ulid::new();
        if self.config.optimistic_toggle {
            self.cache.write().begin_pending(flipped.clone(), intent);
        }

        let mut patch = Fields::new();
        patch.insert(field.to_string(), WireValue::Bool(next));
        let wire = time::encode_date_fields(&patch, T::DATE_FIELDS);
        let path = document_path(T::COLLECTION, id);

        match self.remote.update(&path, wire).await {
            Ok(()) => {
                let mut cache = self.cache.write();
                cache.upsert_one(flipped);
                cache.set_loading(OpKind::Toggle, false);
                Ok(next)
            }
            Err(err) => {
                warn!(family = T::FAMILY, id, field, error = %err, "toggle failed");
                let mut cache = self.cache.write();
                if self.config.optimistic_toggle {
                    cache.revert_pending(id, intent);
                }
                cache.set_error(Some(err.to_string()));
                cache.set_loading(OpKind::Toggle, false);
                Err(err)
            }
        }
    }

    /// Append a child document to a subcollection of a cached parent and
    /// embed the confirmed child into the parent record.
    ///
    /// A parent this client has never fetched is a hard error before any
    /// remote call; the append cannot be reconciled into the cache.
    pub async fn append_child(&self, parent_id: &str, sub: &str, child: Fields) -> Result<()> {
        self.begin(OpKind::AppendChild);
        // Validate the subcollection up front as well.
        if let Err(err) = T::child_selector(sub) {
            self.fail(OpKind::AppendChild, &err);
            return Err(err);
        }
        if let Err(err) = self.require_parent(parent_id, sub) {
            self.fail(OpKind::AppendChild, &err);
            return Err(err);
        }

        let path = subcollection_path(T::COLLECTION, parent_id, sub);
        let wire = time::encode_date_fields(&child, T::child_date_fields(sub));
        let settled = match self.remote.add(&path, wire).await {
            Ok(child_id) => self.embed(parent_id, sub, Document::new(child_id, child)),
            Err(err) => Err(err),
        };
        match settled {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail(OpKind::AppendChild, &err);
                Err(err)
            }
        }
    }

    fn embed(&self, parent_id: &str, sub: &str, doc: Document) -> Result<()> {
        let mut cache = self.cache.write();
        let mut parent = cache
            .get(parent_id)
            .cloned()
            .ok_or_else(|| Error::ParentNotCached {
                parent_id: parent_id.to_string(),
                sub: sub.to_string(),
            })?;
        parent.embed_child(sub, &doc)?;
        cache.upsert_one(parent);
        cache.set_loading(OpKind::AppendChild, false);
        Ok(())
    }

    /// Remove a child from a subcollection of a cached parent. For
    /// field-selected subcollections (likes) the matching remote documents
    /// are located by query first.
    pub async fn remove_child(&self, parent_id: &str, sub: &str, child_id: &str) -> Result<()> {
        self.begin(OpKind::RemoveChild);
        match self.remove_child_inner(parent_id, sub, child_id).await {
            Ok(()) => {
                let mut cache = self.cache.write();
                if let Some(mut parent) = cache.get(parent_id).cloned() {
                    // Ignore an unknown child id; removal is idempotent.
                    let _ = parent.remove_child(sub, child_id);
                    cache.upsert_one(parent);
                }
                cache.set_loading(OpKind::RemoveChild, false);
                Ok(())
            }
            Err(err) => {
                self.fail(OpKind::RemoveChild, &err);
                Err(err)
            }
        }
    }

    async fn remove_child_inner(&self, parent_id: &str, sub: &str, child_id: &str) -> Result<()> {
        let selector = T::child_selector(sub)?;
        self.require_parent(parent_id, sub)?;
        let path = subcollection_path(T::COLLECTION, parent_id, sub);
        match selector {
            ChildSelector::DocId => {
                self.remote.delete(&format!("{path}/{child_id}")).await?;
            }
            ChildSelector::Field(field) => {
                let matches = self
                    .remote
                    .query(
                        &path,
                        &[Predicate::Eq(field.to_string(), WireValue::from(child_id))],
                        None,
                    )
                    .await?;
                for doc in matches {
                    self.remote.delete(&format!("{path}/{}", doc.id)).await?;
                }
            }
        }
        Ok(())
    }

    fn require_parent(&self, parent_id: &str, sub: &str) -> Result<()> {
        if self.cache.read().contains(parent_id) {
            Ok(())
        } else {
            Err(Error::ParentNotCached {
                parent_id: parent_id.to_string(),
                sub: sub.to_string(),
            })
        }
    }
}
