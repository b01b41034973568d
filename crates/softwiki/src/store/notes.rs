//! Notes on top of the tree.
//!
//! A note is a file node: its title is the file name, its category is the
//! parent directory (the root meaning "uncategorized") and its tags are the
//! comma-separated names stored under the `tags` key of the file's metadata
//! block, resolved through the [`TagsStore`].
//!
//! The store keeps, per note, the record and the metadata it last read or
//! wrote. Updates diff against that record to decide whether a rename or a
//! move is needed, and rewrite the file with the cached metadata so keys other
//! than `tags` survive.

use super::node_id;
use super::tags::TagsStore;
use super::tree::{NodeId, Tree};
use super::vfs::FileSystem;
use crate::error::{EntityKind, Result, WikiError};
use crate::metadata::{self, Metadata};
use crate::model::{NewNote, NoteRecord, NoteUpdate};
use crate::validation::validate_entry_name;
use std::collections::HashMap;

/// Metadata key holding the note's tag names.
pub const TAGS_KEY: &str = "tags";

#[derive(Debug, Clone)]
struct CachedNote {
    record: NoteRecord,
    meta: Metadata,
}

#[derive(Default)]
pub struct NotesStore {
    cache: HashMap<NodeId, CachedNote>,
}

impl NotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<F: FileSystem>(
        &mut self,
        tree: &mut Tree<F>,
        tags: &TagsStore,
        data: NewNote,
    ) -> Result<NoteRecord> {
        validate_entry_name(&data.title, "title")?;
        let directory = match &data.category_id {
            Some(category) => resolve_directory(tree, category)?,
            None => tree.root(),
        };
        tree.ensure_free(directory, &data.title, false)?;

        let file = tree.add_file(directory, &data.title)?;
        let record = NoteRecord {
            id: file.to_string(),
            title: data.title,
            body: data.body,
            tag_ids: known_tags(tags, data.tag_ids),
            category_id: category_of(tree, directory),
        };
        if let Err(e) = self.write_note(tree, tags, file, record.clone(), Metadata::new()) {
            tree.forget(file);
            return Err(e);
        }
        log::debug!("Created note '{}' ({})", record.title, record.id);
        Ok(record)
    }

    /// Read every note in the tree.
    ///
    /// A note whose metadata block is malformed is skipped with a warning;
    /// I/O failures abort the listing.
    pub fn list<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
    ) -> Result<Vec<NoteRecord>> {
        self.cache.retain(|id, _| tree.file(*id).is_some());

        let mut notes = Vec::new();
        for directory in tree.walk_directories() {
            let Some(node) = tree.directory(directory) else {
                continue;
            };
            for file in node.files() {
                let Some(title) = tree.file(file).map(|n| n.name().to_string()) else {
                    continue;
                };
                let source = tree.read(file)?;
                let parsed = match metadata::parse(&source) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        log::warn!("Skipping note '{}' ({}): {}", title, file, e);
                        continue;
                    }
                };
                let tag_ids = parsed
                    .meta
                    .get(TAGS_KEY)
                    .map(|value| tags.resolve_names(value))
                    .unwrap_or_default();

                let record = NoteRecord {
                    id: file.to_string(),
                    title,
                    body: parsed.body,
                    tag_ids,
                    category_id: category_of(tree, directory),
                };
                self.cache.insert(
                    file,
                    CachedNote {
                        record: record.clone(),
                        meta: parsed.meta,
                    },
                );
                notes.push(record);
            }
        }
        Ok(notes)
    }

    /// Apply a partial update, computed against the note's cached record.
    pub fn update<F: FileSystem>(
        &mut self,
        tree: &mut Tree<F>,
        tags: &TagsStore,
        id: &str,
        data: NoteUpdate,
    ) -> Result<()> {
        let (file, prior) = self.fetch(tree, tags, id)?;
        let mut record = prior.record;

        if let Some(title) = data.title {
            if title != record.title {
                validate_entry_name(&title, "title")?;
                tree.rename(file, &title)?;
                record.title = title;
                self.remember_record(file, &record);
            }
        }

        if let Some(category) = data.category_id {
            if category != record.category_id {
                let destination = match &category {
                    Some(category) => resolve_directory(tree, category)?,
                    None => tree.root(),
                };
                tree.move_to(file, destination)?;
                record.category_id = category_of(tree, destination);
                self.remember_record(file, &record);
            }
        }

        if let Some(body) = data.body {
            record.body = body;
        }
        if let Some(tag_ids) = data.tag_ids {
            record.tag_ids = known_tags(tags, tag_ids);
        }
        self.write_note(tree, tags, file, record, prior.meta)
    }

    /// Attach a tag. Attaching a tag the note already has changes nothing.
    pub fn add_tag<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        note_id: &str,
        tag_id: &str,
    ) -> Result<()> {
        let (file, cached) = self.fetch(tree, tags, note_id)?;
        if tags.get(tag_id).is_none() {
            return Err(WikiError::unknown(EntityKind::Tag, tag_id));
        }
        if cached.record.tag_ids.iter().any(|t| t == tag_id) {
            return Ok(());
        }
        let mut record = cached.record;
        record.tag_ids.push(tag_id.to_string());
        self.write_note(tree, tags, file, record, cached.meta)
    }

    /// Detach a tag. Detaching a tag the note does not have changes nothing.
    pub fn remove_tag<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        note_id: &str,
        tag_id: &str,
    ) -> Result<()> {
        let (file, cached) = self.fetch(tree, tags, note_id)?;
        if !cached.record.tag_ids.iter().any(|t| t == tag_id) {
            return Ok(());
        }
        let mut record = cached.record;
        record.tag_ids.retain(|t| t != tag_id);
        self.write_note(tree, tags, file, record, cached.meta)
    }

    pub fn delete<F: FileSystem>(&mut self, tree: &mut Tree<F>, id: &str) -> Result<()> {
        let file = node_id(id, EntityKind::Note)?;
        if tree.file(file).is_none() {
            return Err(WikiError::unknown(EntityKind::Note, id));
        }
        tree.delete(file)?;
        self.cache.remove(&file);
        log::debug!("Deleted note {}", id);
        Ok(())
    }

    /// Drop cache entries for notes removed by other means (category delete).
    pub fn forget(&mut self, files: &[NodeId]) {
        for file in files {
            self.cache.remove(file);
        }
    }

    /// Rewrite every cached note carrying `tag_id`, so its `tags` metadata
    /// reflects the tag's current name. Returns how many notes were written.
    pub fn rewrite_tagged<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        tag_id: &str,
    ) -> Result<usize> {
        let files = self.tagged_with(tree, tag_id);
        for file in &files {
            if let Some(cached) = self.cache.get(file).cloned() {
                self.write_note(tree, tags, *file, cached.record, cached.meta)?;
            }
        }
        Ok(files.len())
    }

    /// Remove `tag_id` from every cached note carrying it. Returns how many
    /// notes were written.
    pub fn detach_tag<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        tag_id: &str,
    ) -> Result<usize> {
        let files = self.tagged_with(tree, tag_id);
        for file in &files {
            if let Some(mut cached) = self.cache.get(file).cloned() {
                cached.record.tag_ids.retain(|t| t != tag_id);
                self.write_note(tree, tags, *file, cached.record, cached.meta)?;
            }
        }
        Ok(files.len())
    }

    fn tagged_with<F: FileSystem>(&self, tree: &Tree<F>, tag_id: &str) -> Vec<NodeId> {
        let mut files: Vec<NodeId> = self
            .cache
            .iter()
            .filter(|(id, cached)| {
                tree.file(**id).is_some() && cached.record.tag_ids.iter().any(|t| t == tag_id)
            })
            .map(|(id, _)| *id)
            .collect();
        files.sort();
        files
    }

    /// The cached state of a note, reading its file if it was never listed.
    fn fetch<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        note_id: &str,
    ) -> Result<(NodeId, CachedNote)> {
        let file = node_id(note_id, EntityKind::Note)?;
        let Some(node) = tree.file(file) else {
            return Err(WikiError::unknown(EntityKind::Note, note_id));
        };
        if let Some(cached) = self.cache.get(&file) {
            return Ok((file, cached.clone()));
        }

        let parsed = metadata::parse(&tree.read(file)?)?;
        let directory = node.parent().unwrap_or_else(|| tree.root());
        let record = NoteRecord {
            id: file.to_string(),
            title: node.name().to_string(),
            body: parsed.body,
            tag_ids: parsed
                .meta
                .get(TAGS_KEY)
                .map(|value| tags.resolve_names(value))
                .unwrap_or_default(),
            category_id: category_of(tree, directory),
        };
        let cached = CachedNote {
            record,
            meta: parsed.meta,
        };
        self.cache.insert(file, cached.clone());
        Ok((file, cached))
    }

    fn remember_record(&mut self, file: NodeId, record: &NoteRecord) {
        if let Some(cached) = self.cache.get_mut(&file) {
            cached.record = record.clone();
        }
    }

    /// Serialize `record` with `meta` (its `tags` key recomputed) into the
    /// note's file and cache the result.
    fn write_note<F: FileSystem>(
        &mut self,
        tree: &Tree<F>,
        tags: &TagsStore,
        file: NodeId,
        record: NoteRecord,
        mut meta: Metadata,
    ) -> Result<()> {
        meta.insert(TAGS_KEY, tags.names_value(&record.tag_ids));
        tree.write(file, &metadata::generate(&record.body, &meta))?;
        self.cache.insert(file, CachedNote { record, meta });
        Ok(())
    }
}

fn resolve_directory<F: FileSystem>(tree: &Tree<F>, category: &str) -> Result<NodeId> {
    let id = node_id(category, EntityKind::Category)?;
    tree.directory(id)
        .map(|node| node.id())
        .ok_or_else(|| WikiError::unknown(EntityKind::Category, category))
}

fn category_of<F: FileSystem>(tree: &Tree<F>, directory: NodeId) -> Option<String> {
    (directory != tree.root()).then(|| directory.to_string())
}

/// Keep ids of existing tags, first occurrence only.
fn known_tags(tags: &TagsStore, ids: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if tags.get(&id).is_some() && !kept.contains(&id) {
            kept.push(id);
        }
    }
    kept
}
