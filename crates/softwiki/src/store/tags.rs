//! Tag index.
//!
//! Tags are not part of the note tree. They live in a single sidecar JSON
//! document (an array of [`TagRecord`]) and in two in-memory views kept in
//! sync with it: the ordered list handed to callers and a name→record map used
//! to resolve the tag names found in note metadata back to ids.
//!
//! Mutations start from the in-memory list rather than re-reading the sidecar
//! and always persist the whole list. Cascading a rename or deletion into the
//! notes is the caller's job (see [`super::fs_provider`]).

use super::vfs::FileSystem;
use crate::error::{EntityKind, Result, WikiError};
use crate::model::{NewTag, TagRecord, TagUpdate};
use crate::validation::validate_tag_name;
use std::collections::HashMap;
use std::path::PathBuf;

/// Separator between tag names in a note's `tags` metadata value.
const NAME_SEPARATOR: &str = ", ";

pub struct TagsStore {
    path: PathBuf,
    tags: Vec<TagRecord>,
    by_name: HashMap<String, TagRecord>,
}

impl TagsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            tags: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Read the sidecar and refresh the in-memory views.
    ///
    /// A missing sidecar means no tags. An unreadable or unparsable one is
    /// logged and reported as empty, leaving the in-memory views untouched.
    pub fn list<F: FileSystem>(&mut self, fs: &F) -> Vec<TagRecord> {
        if !fs.exists(&self.path) {
            self.tags.clear();
            self.rebuild_cache();
            return Vec::new();
        }
        let content = match fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Cannot read tags from {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<TagRecord>>(&content) {
            Ok(tags) => {
                self.tags = tags;
                self.rebuild_cache();
                self.tags.clone()
            }
            Err(e) => {
                log::warn!("No tags found, {} is not valid: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn create<F: FileSystem>(&mut self, fs: &F, data: NewTag) -> Result<TagRecord> {
        validate_tag_name(&data.name)?;
        self.ensure_name_free(&data.name, None)?;

        let tag = TagRecord::new(data.name, data.color);
        let mut tags = self.tags.clone();
        tags.push(tag.clone());
        self.persist(fs, &tags)?;

        self.tags = tags;
        self.rebuild_cache();
        log::debug!("Created tag '{}' ({})", tag.name, tag.id);
        Ok(tag)
    }

    /// Apply `data` to the tag and persist. Returns the updated record.
    pub fn update<F: FileSystem>(
        &mut self,
        fs: &F,
        id: &str,
        data: TagUpdate,
    ) -> Result<TagRecord> {
        let index = self.index_of(id)?;
        let mut tag = self.tags[index].clone();
        if let Some(name) = data.name {
            if name != tag.name {
                validate_tag_name(&name)?;
                self.ensure_name_free(&name, Some(id))?;
                tag.name = name;
            }
        }
        if let Some(color) = data.color {
            tag.color = color;
        }

        let mut tags = self.tags.clone();
        tags[index] = tag.clone();
        self.persist(fs, &tags)?;

        self.tags = tags;
        self.rebuild_cache();
        Ok(tag)
    }

    /// Remove the tag and persist. Returns the removed record.
    pub fn delete<F: FileSystem>(&mut self, fs: &F, id: &str) -> Result<TagRecord> {
        let index = self.index_of(id)?;
        let mut tags = self.tags.clone();
        let removed = tags.remove(index);
        self.persist(fs, &tags)?;

        self.tags = tags;
        self.rebuild_cache();
        log::debug!("Deleted tag '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&TagRecord> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&TagRecord> {
        self.by_name.get(name)
    }

    /// Resolve a `tags` metadata value to tag ids. Unknown names are dropped.
    pub fn resolve_names(&self, value: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match self.by_name(name) {
                Some(tag) if !ids.contains(&tag.id) => ids.push(tag.id.clone()),
                Some(_) => {}
                None => log::debug!("Dropping unknown tag '{}'", name),
            }
        }
        ids
    }

    /// Render tag ids as a `tags` metadata value. Unknown ids are dropped.
    pub fn names_value(&self, ids: &[String]) -> String {
        ids.iter()
            .filter_map(|id| self.get(id))
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tags
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| WikiError::unknown(EntityKind::Tag, id))
    }

    fn ensure_name_free(&self, name: &str, except: Option<&str>) -> Result<()> {
        match self.by_name(name) {
            Some(tag) if Some(tag.id.as_str()) != except => Err(WikiError::Validation(format!(
                "Tag '{}' already exists",
                name
            ))),
            _ => Ok(()),
        }
    }

    fn persist<F: FileSystem>(&self, fs: &F, tags: &[TagRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(tags)?;
        fs.write_atomic(&self.path, &content)?;
        Ok(())
    }

    fn rebuild_cache(&mut self) {
        self.by_name = self
            .tags
            .iter()
            .map(|t| (t.name.clone(), t.clone()))
            .collect();
    }
}
