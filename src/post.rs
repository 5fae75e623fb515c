//! Post family (community feed).
//!
//! Comments and likes live in remote sub-collections of a post but are
//! cached as embedded collections on the record. Likes are a set of liker
//! user ids; the remote like documents carry the id in a `user_id` field,
//! so removal resolves by field rather than document id.
//!
//! `is_public` is copied from the author's profile when the draft is built
//! and never re-synced afterwards.

use serde::{Deserialize, Serialize};

use crate::entity::{ChildSelector, Entity};
use crate::error::{Error, Result};
use crate::remote::{Document, Fields, WireValue};

/// Subcollection name for comments.
pub const COMMENTS: &str = "comments";
/// Subcollection name for likes.
pub const LIKES: &str = "likes";

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-assigned id.
    pub id: String,
    /// Back-reference to the post; not an ownership edge.
    pub post_id: String,
    pub user_id: String,
    /// Display name of the commenter at the time of writing.
    pub name: String,
    /// Epoch milliseconds.
    pub time_created: i64,
    pub content: String,
}

impl Comment {
    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Comment {
            id: doc.id.clone(),
            post_id: doc.require_str("post_id")?,
            user_id: doc.require_str("user_id")?,
            name: doc.require_str("name")?,
            time_created: doc.require_i64("time_created")?,
            content: doc.require_str("content")?,
        })
    }
}

/// Payload for the append-comment intent.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub post_id: String,
    pub user_id: String,
    pub name: String,
    pub time_created: i64,
    pub content: String,
}

impl CommentDraft {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("post_id".to_string(), WireValue::from(self.post_id.as_str()));
        fields.insert("user_id".to_string(), WireValue::from(self.user_id.as_str()));
        fields.insert("name".to_string(), WireValue::from(self.name.as_str()));
        fields.insert(
            "time_created".to_string(),
            WireValue::Integer(self.time_created),
        );
        fields.insert("content".to_string(), WireValue::from(self.content.as_str()));
        fields
    }
}

/// Fields of a like document: just the liker's user id.
pub fn like_fields(user_id: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("user_id".to_string(), WireValue::from(user_id));
    fields
}

/// A cached post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned id.
    pub id: String,
    pub title: String,
    pub content: String,
    /// Copied from the author's profile at creation time.
    pub is_public: bool,
    /// Epoch milliseconds.
    pub time_created: i64,
    pub user_id: String,
    pub user_name: String,
    /// Liker user ids, set semantics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub likes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|liker| liker == user_id)
    }
}

/// Payload for the create intent; the store assigns the id.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// Caller copies this from the author's profile.
    pub is_public: bool,
    pub time_created: i64,
    pub user_id: String,
    pub user_name: String,
}

impl PostDraft {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), WireValue::from(self.title.as_str()));
        fields.insert("content".to_string(), WireValue::from(self.content.as_str()));
        fields.insert("is_public".to_string(), WireValue::Bool(self.is_public));
        fields.insert(
            "time_created".to_string(),
            WireValue::Integer(self.time_created),
        );
        fields.insert("user_id".to_string(), WireValue::from(self.user_id.as_str()));
        fields.insert(
            "user_name".to_string(),
            WireValue::from(self.user_name.as_str()),
        );
        fields
    }
}

impl Entity for Post {
    const FAMILY: &'static str = "post";
    const COLLECTION: &'static str = "posts";
    const DATE_FIELDS: &'static [&'static str] = &["time_created"];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        // Subcollections are not document fields; only the post body goes
        // on the wire.
        let mut fields = Fields::new();
        fields.insert("title".to_string(), WireValue::from(self.title.as_str()));
        fields.insert("content".to_string(), WireValue::from(self.content.as_str()));
        fields.insert("is_public".to_string(), WireValue::Bool(self.is_public));
        fields.insert(
            "time_created".to_string(),
            WireValue::Integer(self.time_created),
        );
        fields.insert("user_id".to_string(), WireValue::from(self.user_id.as_str()));
        fields.insert(
            "user_name".to_string(),
            WireValue::from(self.user_name.as_str()),
        );
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Post {
            id: doc.id.clone(),
            title: doc.require_str("title")?,
            content: doc.require_str("content")?,
            is_public: doc.require_bool("is_public")?,
            time_created: doc.require_i64("time_created")?,
            user_id: doc.require_str("user_id")?,
            user_name: doc.require_str("user_name")?,
            likes: Vec::new(),
            comments: Vec::new(),
        })
    }

    fn flag(&self, field: &str) -> Option<bool> {
        match field {
            "is_public" => Some(self.is_public),
            _ => None,
        }
    }

    fn set_flag(&mut self, field: &str, value: bool) {
        if field == "is_public" {
            self.is_public = value;
        }
    }

    fn child_date_fields(sub: &str) -> &'static [&'static str] {
        match sub {
            COMMENTS => &["time_created"],
            _ => &[],
        }
    }

    fn child_selector(sub: &str) -> Result<ChildSelector> {
        match sub {
            COMMENTS => Ok(ChildSelector::DocId),
            LIKES => Ok(ChildSelector::Field("user_id")),
            _ => Err(Error::UnknownSubcollection {
                family: Self::FAMILY,
                sub: sub.to_string(),
            }),
        }
    }

    fn embed_child(&mut self, sub: &str, doc: &Document) -> Result<()> {
        match sub {
            COMMENTS => {
                let comment = Comment::from_document(doc)?;
                match self.comments.iter_mut().find(|c| c.id == comment.id) {
                    Some(existing) => *existing = comment,
                    None => self.comments.push(comment),
                }
                Ok(())
            }
            LIKES => {
                let user_id = doc.require_str("user_id")?;
                if !self.liked_by(&user_id) {
                    self.likes.push(user_id);
                }
                Ok(())
            }
            _ => Err(Error::UnknownSubcollection {
                family: Self::FAMILY,
                sub: sub.to_string(),
            }),
        }
    }

    fn remove_child(&mut self, sub: &str, child_id: &str) -> Result<()> {
        match sub {
            COMMENTS => {
                self.comments.retain(|comment| comment.id != child_id);
                Ok(())
            }
            LIKES => {
                self.likes.retain(|liker| liker != child_id);
                Ok(())
            }
            _ => Err(Error::UnknownSubcollection {
                family: Self::FAMILY,
                sub: sub.to_string(),
            }),
        }
    }
}
