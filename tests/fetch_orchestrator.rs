use std::sync::Arc;

use docmirror::cache::OpKind;
use docmirror::config::Config;
use docmirror::MirrorStore;

mod support;

use support::{
    wire_comment_fields, wire_post_fields, wire_profile_fields, wire_task_fields, MemoryStore,
};

fn seeded_remote() -> Arc<MemoryStore> {
    let remote = Arc::new(MemoryStore::new());
    remote.seed("tasks", "a-1", wire_task_fields("A groceries", 10_000, "alice"));
    remote.seed("tasks", "a-2", wire_task_fields("A laundry", 5_000, "alice"));
    remote.seed("tasks", "b-1", wire_task_fields("B taxes", 20_000, "bob"));
    remote.seed("users", "alice", wire_profile_fields("Alice", 1_000, true));
    remote.seed("users", "bob", wire_profile_fields("Bob", 2_000, false));
    remote
}

#[tokio::test]
async fn sign_in_populates_tasks_and_profile_for_the_principal() {
    let remote = seeded_remote();
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .expect("sign in");

    let tasks = store.task_views().select_all();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|task| task.user_id == "alice"));
    // The store ordered by deadline ascending; the cache keeps that order.
    assert_eq!(tasks[0].id, "a-2");
    // Dates arrive as plain integers.
    assert_eq!(tasks[0].deadline, 5_000);

    let profiles = store.profile_cache().read().all();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].name, "Alice");
    assert_eq!(profiles[0].created_at, 1_000);
    assert!(!store.task_cache().read().is_loading(OpKind::Fetch));
}

#[tokio::test]
async fn principal_switch_replaces_the_task_cache() {
    let remote = seeded_remote();
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .expect("sign in as alice");
    store
        .orchestrator()
        .set_principal(Some("bob".to_string()))
        .await
        .expect("switch to bob");

    let tasks = store.task_views().select_all();
    assert_eq!(tasks.len(), 1);
    assert!(tasks.iter().all(|task| task.user_id == "bob"));

    let profiles = store.profile_cache().read().all();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, "bob");
}

#[tokio::test]
async fn sign_out_clears_the_principal_scoped_caches() {
    let remote = seeded_remote();
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .expect("sign in");
    assert!(!store.task_views().select_all().is_empty());

    store
        .orchestrator()
        .set_principal(None)
        .await
        .expect("sign out");

    assert!(store.task_views().select_all().is_empty());
    assert!(store.profile_cache().read().is_empty());
    assert_eq!(store.orchestrator().principal(), None);
}

#[tokio::test]
async fn refetching_the_same_principal_is_idempotent() {
    let remote = seeded_remote();
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .expect("first fetch");
    let first = store.task_views().select_all();
    store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .expect("second fetch");
    let second = store.task_views().select_all();

    assert_eq!(first.len(), second.len());
    assert_eq!(
        first.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        second.iter().map(|t| t.id.as_str()).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn a_failed_fetch_reports_through_the_error_slot() {
    let remote = seeded_remote();
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    remote.fail_next("quota exceeded");
    let err = store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("quota exceeded"));
    let cache = store.task_cache().read();
    assert!(cache.is_empty());
    assert!(!cache.is_loading(OpKind::Fetch));
    assert_eq!(cache.error(), Some("Remote store error: quota exceeded"));
}

#[tokio::test]
async fn a_missing_profile_document_is_not_found() {
    let remote = Arc::new(MemoryStore::new());
    remote.seed("tasks", "a-1", wire_task_fields("A groceries", 10_000, "alice"));
    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");

    let err = store
        .orchestrator()
        .set_principal(Some("alice".to_string()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("users/alice"));

    // Tasks landed before the profile fetch failed.
    assert_eq!(store.task_views().select_all().len(), 1);
    assert!(store.profile_cache().read().error().is_some());
}

#[tokio::test]
async fn the_feed_embeds_comments_and_likes_newest_post_first() {
    let remote = Arc::new(MemoryStore::new());
    remote.seed("posts", "p-old", wire_post_fields("old", 1_000, "bob", "Bob", true));
    remote.seed("posts", "p-new", wire_post_fields("new", 9_000, "alice", "Alice", true));
    remote.seed(
        "posts",
        "p-private",
        wire_post_fields("hidden", 5_000, "carol", "Carol", false),
    );
    remote.seed(
        "posts/p-new/comments",
        "c-2",
        wire_comment_fields("p-new", "bob", "Bob", 9_500, "second!"),
    );
    remote.seed(
        "posts/p-new/comments",
        "c-1",
        wire_comment_fields("p-new", "carol", "Carol", 9_200, "first!"),
    );
    remote.seed("posts/p-new/likes", "l-1", docmirror::post::like_fields("bob"));

    let store = MirrorStore::new(remote.clone(), Config::default()).expect("store");
    store.orchestrator().refresh_feed().await.expect("feed");

    let posts = store.post_cache().read().all();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "p-new");
    assert_eq!(posts[1].id, "p-old");

    let newest = &posts[0];
    assert_eq!(newest.time_created, 9_000);
    // Comments embedded oldest first, timestamps decoded.
    assert_eq!(newest.comments.len(), 2);
    assert_eq!(newest.comments[0].id, "c-1");
    assert_eq!(newest.comments[0].time_created, 9_200);
    assert_eq!(newest.likes, vec!["bob".to_string()]);
}
