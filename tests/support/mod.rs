use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use docmirror::error::{Error, Result};
use docmirror::remote::{
    Direction, Document, DocumentStore, Fields, OrderBy, Predicate, WireValue,
};
use docmirror::time;

/// In-memory document store: assigns ids, records calls, and can be armed
/// to fail the next operation.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    next_id: AtomicU64,
    fail_next: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with an explicit id, as if it already existed
    /// remotely.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        let mut collections = self.collections.lock();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, fields));
    }

    /// Make the next store operation fail with the given message.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn doc(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned())
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn take_failure(&self) -> Result<()> {
        match self.fail_next.lock().take() {
            Some(message) => Err(Error::Remote(message)),
            None => Ok(()),
        }
    }

    fn split_path(path: &str) -> (&str, &str) {
        path.rsplit_once('/').unwrap_or(("", path))
    }
}

fn order_key(a: &Document, b: &Document, order: &OrderBy) -> CmpOrdering {
    let left = a.fields.get(&order.field);
    let right = b.fields.get(&order.field);
    let ordering = match (left, right) {
        (Some(WireValue::Integer(l)), Some(WireValue::Integer(r))) => l.cmp(r),
        (Some(WireValue::Timestamp(l)), Some(WireValue::Timestamp(r))) => l.cmp(r),
        (Some(WireValue::Text(l)), Some(WireValue::Text(r))) => l.cmp(r),
        _ => CmpOrdering::Equal,
    };
    match order.direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        self.record(format!("get {path}"));
        self.take_failure()?;
        let (collection, id) = Self::split_path(path);
        Ok(self
            .collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn query(
        &self,
        collection: &str,
        predicates: &[Predicate],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>> {
        self.record(format!("query {collection}"));
        self.take_failure()?;
        let mut docs = self
            .collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default();
        docs.retain(|doc| {
            predicates.iter().all(|predicate| match predicate {
                Predicate::Eq(field, value) => doc.fields.get(field) == Some(value),
            })
        });
        if let Some(order) = order {
            docs.sort_by(|a, b| order_key(a, b, order));
        }
        Ok(docs)
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        self.record(format!("add {collection}"));
        self.take_failure()?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn update(&self, path: &str, patch: Fields) -> Result<()> {
        self.record(format!("update {path}"));
        self.take_failure()?;
        let (collection, id) = Self::split_path(path);
        let mut collections = self.collections.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        for (name, value) in patch {
            doc.fields.insert(name, value);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record(format!("delete {path}"));
        self.take_failure()?;
        let (collection, id) = Self::split_path(path);
        if let Some(docs) = self.collections.lock().get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}

/// Wraps [`MemoryStore`] with a turnstile on mutations: while gating is
/// enabled, `add` and `update` park until the test releases them, so
/// settlement order is under test control.
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryStore,
    gating: AtomicBool,
    gates: Mutex<Vec<Option<oneshot::Sender<()>>>>,
}

impl GatedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_gating(&self) {
        self.gating.store(true, Ordering::SeqCst);
    }

    /// Mutations that have reached the turnstile so far.
    pub fn registered(&self) -> usize {
        self.gates.lock().len()
    }

    /// Let the `index`-th gated mutation proceed.
    pub fn release(&self, index: usize) {
        let sender = self.gates.lock().get_mut(index).and_then(Option::take);
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    async fn gate(&self) {
        if !self.gating.load(Ordering::SeqCst) {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push(Some(tx));
        let _ = rx.await;
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        self.inner.get(path).await
    }

    async fn query(
        &self,
        collection: &str,
        predicates: &[Predicate],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>> {
        self.inner.query(collection, predicates, order).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        self.gate().await;
        self.inner.add(collection, fields).await
    }

    async fn update(&self, path: &str, patch: Fields) -> Result<()> {
        self.gate().await;
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.inner.delete(path).await
    }
}

// =========================================================================
// Wire-form field builders (documents as the remote store holds them)
// =========================================================================

pub fn wire_task_fields(title: &str, deadline_ms: i64, user_id: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".to_string(), WireValue::from(title));
    fields.insert(
        "deadline".to_string(),
        WireValue::Timestamp(time::to_wire(deadline_ms)),
    );
    fields.insert("is_complete".to_string(), WireValue::Bool(false));
    fields.insert("user_id".to_string(), WireValue::from(user_id));
    fields
}

pub fn wire_profile_fields(name: &str, created_at_ms: i64, is_public: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), WireValue::from(name));
    fields.insert("is_public".to_string(), WireValue::Bool(is_public));
    fields.insert(
        "created_at".to_string(),
        WireValue::Timestamp(time::to_wire(created_at_ms)),
    );
    fields
}

pub fn wire_post_fields(
    title: &str,
    time_created_ms: i64,
    user_id: &str,
    user_name: &str,
    is_public: bool,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".to_string(), WireValue::from(title));
    fields.insert("content".to_string(), WireValue::from("content"));
    fields.insert("is_public".to_string(), WireValue::Bool(is_public));
    fields.insert(
        "time_created".to_string(),
        WireValue::Timestamp(time::to_wire(time_created_ms)),
    );
    fields.insert("user_id".to_string(), WireValue::from(user_id));
    fields.insert("user_name".to_string(), WireValue::from(user_name));
    fields
}

pub fn wire_comment_fields(
    post_id: &str,
    user_id: &str,
    name: &str,
    time_created_ms: i64,
    content: &str,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert("post_id".to_string(), WireValue::from(post_id));
    fields.insert("user_id".to_string(), WireValue::from(user_id));
    fields.insert("name".to_string(), WireValue::from(name));
    fields.insert(
        "time_created".to_string(),
        WireValue::Timestamp(time::to_wire(time_created_ms)),
    );
    fields.insert("content".to_string(), WireValue::from(content));
    fields
}
