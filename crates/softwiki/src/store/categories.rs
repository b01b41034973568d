//! Categories are the directories of the note tree, minus the root which
//! stands for "uncategorized".

use super::node_id;
use super::tree::{NodeId, Tree};
use super::vfs::FileSystem;
use crate::error::{EntityKind, Result, WikiError};
use crate::model::{CategoryRecord, CategoryUpdate, NewCategory};
use crate::validation::validate_entry_name;

#[derive(Default)]
pub struct CategoriesStore;

impl CategoriesStore {
    pub fn new() -> Self {
        Self
    }

    pub fn create<F: FileSystem>(
        &self,
        tree: &mut Tree<F>,
        data: NewCategory,
    ) -> Result<CategoryRecord> {
        validate_entry_name(&data.name, "category name")?;
        let root = tree.root();
        let directory = tree.create_directory(root, &data.name)?;
        Ok(CategoryRecord {
            id: directory.to_string(),
            name: data.name,
            note_ids: Vec::new(),
        })
    }

    pub fn list<F: FileSystem>(&self, tree: &Tree<F>) -> Vec<CategoryRecord> {
        tree.walk_directories()
            .into_iter()
            .filter(|id| *id != tree.root())
            .filter_map(|id| tree.directory(id))
            .map(|node| CategoryRecord {
                id: node.id().to_string(),
                name: node.name().to_string(),
                note_ids: node.files().map(|f| f.to_string()).collect(),
            })
            .collect()
    }

    /// Rename the category. Notes beneath it keep their ids.
    pub fn update<F: FileSystem>(
        &self,
        tree: &mut Tree<F>,
        id: &str,
        data: CategoryUpdate,
    ) -> Result<()> {
        let directory = resolve(tree, id)?;
        if let Some(name) = data.name {
            let current = tree.directory(directory).map(|n| n.name().to_string());
            if current.as_deref() != Some(name.as_str()) {
                validate_entry_name(&name, "category name")?;
                tree.rename(directory, &name)?;
            }
        }
        Ok(())
    }

    /// Delete the category directory and everything in it. Returns the ids
    /// of the notes that went with it.
    pub fn delete<F: FileSystem>(&self, tree: &mut Tree<F>, id: &str) -> Result<Vec<NodeId>> {
        let directory = resolve(tree, id)?;
        let removed = tree.delete(directory)?;
        if !removed.is_empty() {
            log::debug!(
                "Deleted category {} along with {} notes",
                id,
                removed.len()
            );
        }
        Ok(removed)
    }
}

fn resolve<F: FileSystem>(tree: &Tree<F>, id: &str) -> Result<NodeId> {
    let directory = node_id(id, EntityKind::Category)?;
    if directory == tree.root() || tree.directory(directory).is_none() {
        return Err(WikiError::unknown(EntityKind::Category, id));
    }
    Ok(directory)
}
