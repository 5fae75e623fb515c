//! Task family.
//!
//! Tasks are owned by exactly one user (`user_id` is the scoping key) and
//! carry a deadline as a plain epoch-ms integer inside the cache. Tag names
//! are case-insensitively unique within a task; that invariant belongs to
//! the creator (the form building the draft), not to the cache or the
//! dispatcher — [`tag_name_conflicts`] is the helper callers use.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::remote::{Document, Fields, WireValue};

/// A colored label on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub color: String,
}

/// A line item under a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// A cached task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Epoch milliseconds.
    pub deadline: i64,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    pub user_id: String,
}

/// Payload for the create intent; the store assigns the id.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub details: Option<String>,
    pub deadline: i64,
    pub category: Option<String>,
    pub tags: Vec<Tag>,
    pub subtasks: Vec<Subtask>,
    pub user_id: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, deadline: i64, user_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: None,
            deadline,
            category: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            user_id: user_id.into(),
        }
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), WireValue::from(self.title.as_str()));
        if let Some(details) = &self.details {
            fields.insert("details".to_string(), WireValue::from(details.as_str()));
        }
        fields.insert("deadline".to_string(), WireValue::Integer(self.deadline));
        fields.insert("is_complete".to_string(), WireValue::Bool(false));
        if let Some(category) = &self.category {
            fields.insert("category".to_string(), WireValue::from(category.as_str()));
        }
        fields.insert("tags".to_string(), tags_to_wire(&self.tags));
        fields.insert("subtasks".to_string(), subtasks_to_wire(&self.subtasks));
        fields.insert("user_id".to_string(), WireValue::from(self.user_id.as_str()));
        fields
    }
}

/// True if `candidate` collides case-insensitively with an existing tag name.
pub fn tag_name_conflicts(tags: &[Tag], candidate: &str) -> bool {
    let candidate = candidate.trim();
    tags.iter()
        .any(|tag| tag.name.trim().eq_ignore_ascii_case(candidate))
}

fn tags_to_wire(tags: &[Tag]) -> WireValue {
    WireValue::Array(
        tags.iter()
            .map(|tag| {
                let mut entry = Fields::new();
                entry.insert("name".to_string(), WireValue::from(tag.name.as_str()));
                entry.insert("color".to_string(), WireValue::from(tag.color.as_str()));
                WireValue::Map(entry)
            })
            .collect(),
    )
}

fn subtasks_to_wire(subtasks: &[Subtask]) -> WireValue {
    WireValue::Array(
        subtasks
            .iter()
            .map(|subtask| {
                let mut entry = Fields::new();
                entry.insert(
                    "description".to_string(),
                    WireValue::from(subtask.description.as_str()),
                );
                entry.insert("completed".to_string(), WireValue::Bool(subtask.completed));
                WireValue::Map(entry)
            })
            .collect(),
    )
}

fn tags_from_wire(doc: &Document) -> Result<Vec<Tag>> {
    let Some(value) = doc.fields.get("tags") else {
        return Ok(Vec::new());
    };
    let entries = value
        .as_array()
        .ok_or_else(|| Error::malformed(&doc.id, "'tags' is not an array"))?;
    entries
        .iter()
        .map(|entry| {
            let map = entry
                .as_map()
                .ok_or_else(|| Error::malformed(&doc.id, "tag entry is not a map"))?;
            Ok(Tag {
                name: wire_str(map, "name", doc)?,
                color: wire_str(map, "color", doc)?,
            })
        })
        .collect()
}

fn subtasks_from_wire(doc: &Document) -> Result<Vec<Subtask>> {
    let Some(value) = doc.fields.get("subtasks") else {
        return Ok(Vec::new());
    };
    let entries = value
        .as_array()
        .ok_or_else(|| Error::malformed(&doc.id, "'subtasks' is not an array"))?;
    entries
        .iter()
        .map(|entry| {
            let map = entry
                .as_map()
                .ok_or_else(|| Error::malformed(&doc.id, "subtask entry is not a map"))?;
            Ok(Subtask {
                description: wire_str(map, "description", doc)?,
                completed: map
                    .get("completed")
                    .and_then(WireValue::as_bool)
                    .unwrap_or(false),
            })
        })
        .collect()
}

fn wire_str(map: &Fields, name: &str, doc: &Document) -> Result<String> {
    map.get(name)
        .and_then(WireValue::as_str)
        .map(String::from)
        .ok_or_else(|| Error::malformed(&doc.id, format!("missing string field '{name}'")))
}

impl Entity for Task {
    const FAMILY: &'static str = "task";
    const COLLECTION: &'static str = "tasks";
    const DATE_FIELDS: &'static [&'static str] = &["deadline"];

    fn id(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), WireValue::from(self.title.as_str()));
        if let Some(details) = &self.details {
            fields.insert("details".to_string(), WireValue::from(details.as_str()));
        }
        fields.insert("deadline".to_string(), WireValue::Integer(self.deadline));
        fields.insert("is_complete".to_string(), WireValue::Bool(self.is_complete));
        if let Some(category) = &self.category {
            fields.insert("category".to_string(), WireValue::from(category.as_str()));
        }
        fields.insert("tags".to_string(), tags_to_wire(&self.tags));
        fields.insert("subtasks".to_string(), subtasks_to_wire(&self.subtasks));
        fields.insert("user_id".to_string(), WireValue::from(self.user_id.as_str()));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Task {
            id: doc.id.clone(),
            title: doc.require_str("title")?,
            details: doc.opt_str("details"),
            deadline: doc.require_i64("deadline")?,
            is_complete: doc.require_bool("is_complete")?,
            category: doc.opt_str("category"),
            tags: tags_from_wire(doc)?,
            subtasks: subtasks_from_wire(doc)?,
            user_id: doc.require_str("user_id")?,
        })
    }

    fn flag(&self, field: &str) -> Option<bool> {
        match field {
            "is_complete" => Some(self.is_complete),
            _ => None,
        }
    }

    fn set_flag(&mut self, field: &str, value: bool) {
        if field == "is_complete" {
            self.is_complete = value;
        }
    }
}
