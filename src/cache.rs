//! In-memory entity cache.
//!
//! One instance per entity family. Holds the last-known-good record for each
//! id (insertion-ordered), a per-operation-kind loading flag, and the error
//! slot the UI reads for feedback. Every method is synchronous and performs
//! no I/O; only the dispatcher and the fetch orchestrator write.
//!
//! Entries carry a two-state tag: `Confirmed` records mirror the remote
//! store, `Pending` records are optimistic local writes that revert to their
//! confirmed base if settlement fails.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use ulid::Ulid;

use crate::entity::Entity;

/// Mutation/fetch operation kinds, each with its own loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Fetch,
    Create,
    Update,
    Remove,
    Toggle,
    AppendChild,
    RemoveChild,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Fetch => "fetch",
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Remove => "remove",
            OpKind::Toggle => "toggle",
            OpKind::AppendChild => "append_child",
            OpKind::RemoveChild => "remove_child",
        }
    }
}

/// Identifier of one dispatched intent, used to match a pending entry to
/// the settlement that resolves it.
pub type IntentId = Ulid;

/// Cache entry tag.
#[derive(Debug, Clone)]
pub enum Entry<T> {
    /// Mirrors the remote store.
    Confirmed(T),
    /// Optimistic local write awaiting settlement. `base` is the last
    /// confirmed record; `None` means the entry did not exist before.
    Pending {
        current: T,
        base: Option<T>,
        intent: IntentId,
    },
}

impl<T> Entry<T> {
    /// The record readers see, regardless of confirmation state.
    pub fn record(&self) -> &T {
        match self {
            Entry::Confirmed(record) => record,
            Entry::Pending { current, .. } => current,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Entry::Pending { .. })
    }
}

/// Shared handle to a family cache.
pub type SharedCache<T> = Arc<RwLock<EntityCache<T>>>;

/// Create a fresh shared cache for a family.
pub fn shared<T: Entity>() -> SharedCache<T> {
    Arc::new(RwLock::new(EntityCache::new()))
}

/// In-memory mapping from id to entity record for one family.
#[derive(Debug)]
pub struct EntityCache<T: Entity> {
    entries: HashMap<String, Entry<T>>,
    order: Vec<String>,
    loading: HashMap<OpKind, bool>,
    error: Option<String>,
    generation: u64,
}

impl<T: Entity> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            loading: HashMap::new(),
            error: None,
            generation: 0,
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id).map(|entry| entry.record())
    }

    pub fn entry(&self, id: &str) -> Option<&Entry<T>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All records, in cache insertion order.
    pub fn all(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| entry.record().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_loading(&self, kind: OpKind) -> bool {
        self.loading.get(&kind).copied().unwrap_or(false)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Monotonic mutation counter; the memoization key for derived views.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // Writes (synchronous, no I/O)
    // =========================================================================

    /// Insert or replace a confirmed record. Existing entries keep their
    /// position in insertion order.
    pub fn upsert_one(&mut self, record: T) {
        let id = record.id().to_string();
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.insert(id, Entry::Confirmed(record));
        self.touch();
    }

    /// Insert or replace a batch of confirmed records. Additive: records
    /// absent from the batch stay cached. Idempotent for a repeated batch.
    pub fn upsert_many(&mut self, records: Vec<T>) {
        for record in records {
            let id = record.id().to_string();
            if !self.entries.contains_key(&id) {
                self.order.push(id.clone());
            }
            self.entries.insert(id, Entry::Confirmed(record));
        }
        self.touch();
    }

    /// Replace the whole cache contents with the batch; the fetched set is
    /// authoritative (used on principal switch).
    pub fn replace_all(&mut self, records: Vec<T>) {
        self.entries.clear();
        self.order.clear();
        for record in records {
            let id = record.id().to_string();
            if !self.entries.contains_key(&id) {
                self.order.push(id.clone());
            }
            self.entries.insert(id, Entry::Confirmed(record));
        }
        self.touch();
    }

    pub fn remove_one(&mut self, id: &str) -> Option<T> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.order.retain(|entry| entry != id);
            self.touch();
        }
        removed.map(|entry| match entry {
            Entry::Confirmed(record) => record,
            Entry::Pending { current, .. } => current,
        })
    }

    /// Drop all records and the error slot. Loading flags are kept; they
    /// track in-flight operations, not cache content.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.error = None;
        self.touch();
    }

    pub fn set_loading(&mut self, kind: OpKind, value: bool) {
        self.loading.insert(kind, value);
        self.touch();
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message;
        self.touch();
    }

    // =========================================================================
    // Pending lifecycle
    // =========================================================================

    /// Apply an optimistic write. The previous confirmed record (or the
    /// base of an earlier pending write) is stashed for revert.
    pub fn begin_pending(&mut self, record: T, intent: IntentId) {
        let id = record.id().to_string();
        let base = match self.entries.get(&id) {
            Some(Entry::Confirmed(existing)) => Some(existing.clone()),
            Some(Entry::Pending { base, .. }) => base.clone(),
            None => None,
        };
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.insert(
            id,
            Entry::Pending {
                current: record,
                base,
                intent,
            },
        );
        self.touch();
    }

    /// Revert a failed optimistic write to its confirmed base. A no-op if
    /// the entry has since been confirmed or superseded by another intent.
    pub fn revert_pending(&mut self, id: &str, intent: IntentId) {
        let matches = matches!(
            self.entries.get(id),
            Some(Entry::Pending { intent: found, .. }) if *found == intent
        );
        if !matches {
            return;
        }
        match self.entries.remove(id) {
            Some(Entry::Pending {
                base: Some(base), ..
            }) => {
                self.entries.insert(id.to_string(), Entry::Confirmed(base));
            }
            _ => {
                self.order.retain(|entry| entry != id);
            }
        }
        self.touch();
    }
}
