//! Fetch orchestration.
//!
//! One-shot population of the entity caches, driven by principal changes.
//! Sign-in (or account switch) replaces the Task cache with the new
//! principal's tasks and refetches the profile; sign-out clears both.
//! The community feed is populated on demand via [`Orchestrator::refresh_feed`].
//!
//! Fetched sets are applied with replace semantics: task ownership is
//! principal-scoped, so the fetched batch is authoritative and anything
//! cached for a previous principal must not survive the switch.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{OpKind, SharedCache};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::post::{Post, COMMENTS, LIKES};
use crate::profile::UserProfile;
use crate::remote::{document_path, DocumentStore, OrderBy, Predicate, WireValue};
use crate::task::Task;
use crate::time;

/// Populates and clears the entity caches as the principal changes.
pub struct Orchestrator {
    remote: Arc<dyn DocumentStore>,
    tasks: SharedCache<Task>,
    posts: SharedCache<Post>,
    profiles: SharedCache<UserProfile>,
    principal: Mutex<Option<String>>,
}

impl Orchestrator {
    pub fn new(
        remote: Arc<dyn DocumentStore>,
        tasks: SharedCache<Task>,
        posts: SharedCache<Post>,
        profiles: SharedCache<UserProfile>,
    ) -> Self {
        Self {
            remote,
            tasks,
            posts,
            profiles,
            principal: Mutex::new(None),
        }
    }

    /// The currently signed-in principal, if any.
    pub fn principal(&self) -> Option<String> {
        self.principal.lock().clone()
    }

    /// React to a principal change. `Some` triggers a one-shot fetch of
    /// that principal's tasks and profile; `None` clears the
    /// principal-scoped caches. Re-invoking with an unchanged principal
    /// refetches.
    pub async fn set_principal(&self, principal: Option<String>) -> Result<()> {
        *self.principal.lock() = principal.clone();
        match principal {
            Some(uid) => {
                info!(principal = %uid, "principal signed in, populating caches");
                self.populate_tasks(&uid).await?;
                self.populate_profile(&uid).await
            }
            None => {
                info!("principal signed out, clearing caches");
                self.tasks.write().clear();
                self.profiles.write().clear();
                Ok(())
            }
        }
    }

    async fn populate_tasks(&self, uid: &str) -> Result<()> {
        begin_fetch(&self.tasks);
        let result = self
            .remote
            .query(
                Task::COLLECTION,
                &[Predicate::Eq("user_id".to_string(), WireValue::from(uid))],
                Some(&OrderBy::asc("deadline")),
            )
            .await
            .and_then(|docs| {
                docs.into_iter()
                    .map(|mut doc| {
                        time::decode_document_dates(&mut doc, Task::DATE_FIELDS);
                        Task::from_document(&doc)
                    })
                    .collect::<Result<Vec<_>>>()
            });
        match result {
            Ok(fetched) => {
                debug!(principal = %uid, count = fetched.len(), "task fetch settled");
                let mut cache = self.tasks.write();
                cache.replace_all(fetched);
                cache.set_loading(OpKind::Fetch, false);
                Ok(())
            }
            Err(err) => {
                fail_fetch(&self.tasks, &err);
                Err(err)
            }
        }
    }

    async fn populate_profile(&self, uid: &str) -> Result<()> {
        begin_fetch(&self.profiles);
        let path = document_path(UserProfile::COLLECTION, uid);
        let result = self.remote.get(&path).await.and_then(|found| {
            let mut doc = found.ok_or_else(|| Error::NotFound(path.clone()))?;
            time::decode_document_dates(&mut doc, UserProfile::DATE_FIELDS);
            UserProfile::from_document(&doc)
        });
        match result {
            Ok(profile) => {
                let mut cache = self.profiles.write();
                cache.replace_all(vec![profile]);
                cache.set_loading(OpKind::Fetch, false);
                Ok(())
            }
            Err(err) => {
                fail_fetch(&self.profiles, &err);
                Err(err)
            }
        }
    }

    /// One-shot fetch of the public feed: posts with their comment and
    /// like subcollections embedded, newest first.
    pub async fn refresh_feed(&self) -> Result<()> {
        begin_fetch(&self.posts);
        match self.fetch_feed().await {
            Ok(posts) => {
                debug!(count = posts.len(), "feed fetch settled");
                let mut cache = self.posts.write();
                cache.replace_all(posts);
                cache.set_loading(OpKind::Fetch, false);
                Ok(())
            }
            Err(err) => {
                fail_fetch(&self.posts, &err);
                Err(err)
            }
        }
    }

    async fn fetch_feed(&self) -> Result<Vec<Post>> {
        let docs = self
            .remote
            .query(
                Post::COLLECTION,
                &[Predicate::Eq(
                    "is_public".to_string(),
                    WireValue::Bool(true),
                )],
                Some(&OrderBy::desc("time_created")),
            )
            .await?;

        let mut posts = Vec::with_capacity(docs.len());
        for mut doc in docs {
            time::decode_document_dates(&mut doc, Post::DATE_FIELDS);
            let mut post = Post::from_document(&doc)?;
            self.embed_children(&mut post, COMMENTS, Some(&OrderBy::asc("time_created")))
                .await?;
            self.embed_children(&mut post, LIKES, None).await?;
            posts.push(post);
        }
        Ok(posts)
    }

    async fn embed_children(
        &self,
        post: &mut Post,
        sub: &str,
        order: Option<&OrderBy>,
    ) -> Result<()> {
        let path = crate::remote::subcollection_path(Post::COLLECTION, &post.id, sub);
        let children = self.remote.query(&path, &[], order).await?;
        for mut child in children {
            time::decode_document_dates(&mut child, Post::child_date_fields(sub));
            post.embed_child(sub, &child)?;
        }
        Ok(())
    }
}

fn begin_fetch<T: Entity>(cache: &SharedCache<T>) {
    let mut cache = cache.write();
    cache.set_error(None);
    cache.set_loading(OpKind::Fetch, true);
}

fn fail_fetch<T: Entity>(cache: &SharedCache<T>, err: &Error) {
    tracing::warn!(family = T::FAMILY, error = %err, "fetch failed");
    let mut cache = cache.write();
    cache.set_error(Some(err.to_string()));
    cache.set_loading(OpKind::Fetch, false);
}
