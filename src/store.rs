//! Process-wide store wiring.
//!
//! [`MirrorStore`] owns one cache per entity family and hands out the
//! dispatchers, views and orchestrator bound to them. Everything is
//! injected explicitly; there are no module-level singletons, so tests
//! build a fresh store (and fresh state) per test.

use std::sync::Arc;

use crate::cache::{self, SharedCache};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::fetch::Orchestrator;
use crate::post::Post;
use crate::profile::UserProfile;
use crate::remote::DocumentStore;
use crate::task::Task;
use crate::views::TaskViews;

/// Container for the cache core of one app process.
pub struct MirrorStore {
    tasks: Dispatcher<Task>,
    posts: Dispatcher<Post>,
    profiles: Dispatcher<UserProfile>,
    task_views: TaskViews,
    orchestrator: Orchestrator,
}

impl MirrorStore {
    /// Wire the core against a remote store. Fails if the configuration
    /// is invalid (unknown week start).
    pub fn new(remote: Arc<dyn DocumentStore>, config: Config) -> Result<Self> {
        let week_start = config.views.week_start_day()?;

        let task_cache: SharedCache<Task> = cache::shared();
        let post_cache: SharedCache<Post> = cache::shared();
        let profile_cache: SharedCache<UserProfile> = cache::shared();

        Ok(Self {
            tasks: Dispatcher::new(
                Arc::clone(&remote),
                Arc::clone(&task_cache),
                config.dispatch.clone(),
            ),
            posts: Dispatcher::new(
                Arc::clone(&remote),
                Arc::clone(&post_cache),
                config.dispatch.clone(),
            ),
            profiles: Dispatcher::new(
                Arc::clone(&remote),
                Arc::clone(&profile_cache),
                config.dispatch.clone(),
            ),
            task_views: TaskViews::new(Arc::clone(&task_cache), week_start),
            orchestrator: Orchestrator::new(remote, task_cache, post_cache, profile_cache),
        })
    }

    pub fn tasks(&self) -> &Dispatcher<Task> {
        &self.tasks
    }

    pub fn posts(&self) -> &Dispatcher<Post> {
        &self.posts
    }

    pub fn profiles(&self) -> &Dispatcher<UserProfile> {
        &self.profiles
    }

    pub fn task_views(&self) -> &TaskViews {
        &self.task_views
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Direct cache handles, for consumers that need lifecycle flags or
    /// the error slot (the UI's feedback surface).
    pub fn task_cache(&self) -> &SharedCache<Task> {
        self.tasks.cache()
    }

    pub fn post_cache(&self) -> &SharedCache<Post> {
        self.posts.cache()
    }

    pub fn profile_cache(&self) -> &SharedCache<UserProfile> {
        self.profiles.cache()
    }
}
