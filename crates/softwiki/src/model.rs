//! # Data Model
//!
//! Records exchanged through the storage contract ([`crate::DataProvider`]).
//!
//! Every record carries a string `id` assigned by the backend. For the
//! filesystem backend note and category ids come from the in-memory tree and
//! are only stable for the lifetime of the process; tag ids are UUIDs stored in
//! the tag sidecar and survive restarts.
//!
//! Updates are partial: every field of [`NoteUpdate`], [`TagUpdate`] and
//! [`CategoryUpdate`] left as `None` keeps its current value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tag_ids: Vec<String>,
    /// `None` for uncategorized notes.
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TagRecord {
    /// Creates a tag with a fresh id.
    ///
    /// Note: This does not validate the name, see
    /// [`crate::validation::validate_tag_name`].
    pub fn new(name: String, color: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            color,
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    /// Ids of the notes currently filed under this category.
    pub note_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
    pub tag_ids: Vec<String>,
    pub category_id: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tag_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_ids = tag_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tag_ids: Option<Vec<String>>,
    /// `Some(None)` moves the note back to the uncategorized root.
    pub category_id: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
}
