//! User profile family.
//!
//! The profile document id is the auth principal id; creation happens during
//! sign-up, outside this core. In here profiles are fetched by the
//! orchestrator and mutated through update/toggle intents.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::Result;
use crate::remote::{Document, Fields, WireValue};

/// A cached user profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth principal id.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
    /// Whether new posts by this user are publicly visible.
    pub is_public: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Entity for UserProfile {
    const FAMILY: &'static str = "profile";
    const COLLECTION: &'static str = "users";
    const DATE_FIELDS: &'static [&'static str] = &["created_at"];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), WireValue::from(self.name.as_str()));
        if let Some(avatar_path) = &self.avatar_path {
            fields.insert(
                "avatar_path".to_string(),
                WireValue::from(avatar_path.as_str()),
            );
        }
        fields.insert("is_public".to_string(), WireValue::Bool(self.is_public));
        fields.insert("created_at".to_string(), WireValue::Integer(self.created_at));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(UserProfile {
            id: doc.id.clone(),
            name: doc.require_str("name")?,
            avatar_path: doc.opt_str("avatar_path"),
            is_public: doc.require_bool("is_public")?,
            created_at: doc.require_i64("created_at")?,
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
}
