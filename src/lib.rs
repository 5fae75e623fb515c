//! docmirror - client-side cache synchronization for remote document
//! collections.
//!
//! This library is the state core of a task-management/social app backed by
//! a hosted document database. It mirrors remote documents into local
//! memory, tracks per-operation lifecycle, reconciles local edits against
//! remote confirmation, and serves derived views to the UI.
//!
//! # Core Concepts
//!
//! - **Entity Cache**: in-memory mapping from id to the last-known-good
//!   record of a remote document family, with per-operation loading flags
//!   and an error slot
//! - **Intents**: named mutations (create/update/remove/toggle/
//!   append-child/remove-child) dispatched against the remote store
//! - **Derived Views**: memoized, read-only projections (date buckets,
//!   completion filter, stable deadline sort)
//! - **Principal**: the signed-in user id scoping task ownership; changes
//!   drive cache population and clearing
//! - **Wire Timestamps**: the store's native date type, confined to the
//!   boundary; the cache holds epoch-ms integers only
//!
//! # Module Organization
//!
//! - `cache`: generic per-family entity cache
//! - `config`: view and dispatch configuration
//! - `dispatch`: mutation dispatcher
//! - `entity`: the family seam (wire mapping, toggles, subcollections)
//! - `error`: error types and result alias
//! - `fetch`: principal-driven fetch orchestration
//! - `post`, `profile`, `task`: the entity families
//! - `remote`: abstract document store boundary
//! - `store`: process-wide wiring (dependency injection)
//! - `time`: wire timestamp codec
//! - `views`: derived, memoized task views

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod post;
pub mod profile;
pub mod remote;
pub mod store;
pub mod task;
pub mod time;
pub mod views;

pub use error::{Error, Result};
pub use store::MirrorStore;
