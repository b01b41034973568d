use super::categories::CategoriesStore;
use super::notes::NotesStore;
use super::tags::TagsStore;
use super::tree::{NodeId, Tree};
use super::vfs::{FileSystem, OsFs};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::{
    CategoryRecord, CategoryUpdate, NewCategory, NewNote, NewTag, NoteRecord, NoteUpdate,
    TagRecord, TagUpdate,
};
use crate::provider::DataProvider;
use std::path::{Path, PathBuf};

/// Filesystem backend: notes are files, categories are directories and tags
/// live in a sidecar index.
///
/// The directory tree and the tag index are loaded on the first call, whatever
/// it is. Tag renames and deletions are propagated into the note files before
/// the call returns.
pub struct FileSystemProvider<F: FileSystem = OsFs> {
    tree: Tree<F>,
    notes: NotesStore,
    tags: TagsStore,
    categories: CategoriesStore,
    initialized: bool,
}

impl FileSystemProvider<OsFs> {
    /// A provider over `base_path` with default configuration.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_fs(OsFs, base_path.into(), &StoreConfig::default())
    }

    /// A provider over `base_path`, configured from the environment and
    /// `<base_path>/.softwiki.toml`.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        let config = StoreConfig::load(&base_path)?;
        Ok(Self::with_fs(OsFs, base_path, &config))
    }
}

impl<F: FileSystem> FileSystemProvider<F> {
    pub fn with_fs(fs: F, base_path: PathBuf, config: &StoreConfig) -> Self {
        let tags_path = base_path.join(&config.tags_file);
        Self {
            tree: Tree::new(fs, base_path, config.file_ext()).with_sidecar(&config.tags_file),
            notes: NotesStore::new(),
            tags: TagsStore::new(tags_path),
            categories: CategoriesStore::new(),
            initialized: false,
        }
    }

    pub fn base_path(&self) -> &Path {
        self.tree.base_path()
    }

    pub fn tree(&self) -> &Tree<F> {
        &self.tree
    }

    /// Where a note or category currently lives on disk.
    pub fn path_of(&self, id: &str) -> Option<PathBuf> {
        let node: NodeId = id.parse().ok()?;
        self.tree.path(node)
    }

    fn ensure_init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.tree.init()?;
        let tags = self.tags.list(self.tree.fs());
        log::debug!(
            "Opened store at {} with {} tags",
            self.tree.base_path().display(),
            tags.len()
        );
        self.initialized = true;
        Ok(())
    }

    /// Re-read every note so cascades see the notes' current tags.
    fn refresh_notes(&mut self) -> Result<()> {
        self.notes.list(&self.tree, &self.tags)?;
        Ok(())
    }
}

impl<F: FileSystem> DataProvider for FileSystemProvider<F> {
    fn create_note(&mut self, data: NewNote) -> Result<NoteRecord> {
        self.ensure_init()?;
        self.notes.create(&mut self.tree, &self.tags, data)
    }

    fn list_notes(&mut self) -> Result<Vec<NoteRecord>> {
        self.ensure_init()?;
        self.tags.list(self.tree.fs());
        self.notes.list(&self.tree, &self.tags)
    }

    fn update_note(&mut self, id: &str, data: NoteUpdate) -> Result<()> {
        self.ensure_init()?;
        self.notes.update(&mut self.tree, &self.tags, id, data)
    }

    fn delete_note(&mut self, id: &str) -> Result<()> {
        self.ensure_init()?;
        self.notes.delete(&mut self.tree, id)
    }

    fn add_tag_to_note(&mut self, note_id: &str, tag_id: &str) -> Result<()> {
        self.ensure_init()?;
        self.notes.add_tag(&self.tree, &self.tags, note_id, tag_id)
    }

    fn remove_tag_from_note(&mut self, note_id: &str, tag_id: &str) -> Result<()> {
        self.ensure_init()?;
        self.notes.remove_tag(&self.tree, &self.tags, note_id, tag_id)
    }

    fn create_tag(&mut self, data: NewTag) -> Result<TagRecord> {
        self.ensure_init()?;
        self.tags.create(self.tree.fs(), data)
    }

    fn list_tags(&mut self) -> Result<Vec<TagRecord>> {
        self.ensure_init()?;
        Ok(self.tags.list(self.tree.fs()))
    }

    fn update_tag(&mut self, id: &str, data: TagUpdate) -> Result<()> {
        self.ensure_init()?;
        self.refresh_notes()?;
        let tag = self.tags.update(self.tree.fs(), id, data)?;
        let written = self.notes.rewrite_tagged(&self.tree, &self.tags, id)?;
        log::debug!("Tag '{}' updated on {} notes", tag.name, written);
        Ok(())
    }

    fn delete_tag(&mut self, id: &str) -> Result<()> {
        self.ensure_init()?;
        self.refresh_notes()?;
        self.tags.delete(self.tree.fs(), id)?;
        let written = self.notes.detach_tag(&self.tree, &self.tags, id)?;
        log::debug!("Tag {} removed from {} notes", id, written);
        Ok(())
    }

    fn create_category(&mut self, data: NewCategory) -> Result<CategoryRecord> {
        self.ensure_init()?;
        self.categories.create(&mut self.tree, data)
    }

    fn list_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        self.ensure_init()?;
        Ok(self.categories.list(&self.tree))
    }

    fn update_category(&mut self, id: &str, data: CategoryUpdate) -> Result<()> {
        self.ensure_init()?;
        self.categories.update(&mut self.tree, id, data)
    }

    fn delete_category(&mut self, id: &str) -> Result<()> {
        self.ensure_init()?;
        let removed = self.categories.delete(&mut self.tree, id)?;
        self.notes.forget(&removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_fs::MemFs;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_lazy_init_on_first_call() {
        let env = TestEnv::new();
        std::fs::write(env.root.join("Existing"), "hello").unwrap();
        let mut provider = FileSystemProvider::new(env.root.clone());
        assert!(!provider.tree().is_initialized());

        let notes = provider.list_notes().unwrap();

        assert!(provider.tree().is_initialized());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Existing");
        assert_eq!(notes[0].body, "hello");
    }

    #[test]
    fn test_missing_base_path_is_io_error() {
        let env = TestEnv::new();
        let mut provider = FileSystemProvider::new(env.root.join("nope"));
        assert!(matches!(
            provider.list_categories(),
            Err(crate::WikiError::Io(_))
        ));
    }

    #[test]
    fn test_update_tag_cascades_to_note_files() {
        let mut env = TestEnv::new();
        let tag = env.provider.create_tag(NewTag::new("urgent", "#f00")).unwrap();
        let note = env
            .provider
            .create_note(NewNote::new("Plan", "body").with_tags([tag.id.clone()]))
            .unwrap();

        env.provider
            .update_tag(
                &tag.id,
                TagUpdate {
                    name: Some("asap".to_string()),
                    color: None,
                },
            )
            .unwrap();

        let raw = std::fs::read_to_string(env.provider.path_of(&note.id).unwrap()).unwrap();
        assert_eq!(raw, "---\ntags: asap\n---\nbody");
        let notes = env.provider.list_notes().unwrap();
        assert_eq!(notes[0].tag_ids, vec![tag.id]);
    }

    #[test]
    fn test_delete_category_prunes_notes() {
        let mut env = TestEnv::new();
        let work = env
            .provider
            .create_category(NewCategory::new("Work"))
            .unwrap();
        let note = env
            .provider
            .create_note(NewNote::new("Plan", "").in_category(work.id.clone()))
            .unwrap();

        env.provider.delete_category(&work.id).unwrap();

        assert!(env
            .provider
            .update_note(&note.id, NoteUpdate::default())
            .unwrap_err()
            .is_unknown_id());
        assert!(env.provider.list_notes().unwrap().is_empty());
        assert!(!env.root.join("Work").exists());
    }

    #[test]
    fn test_visible_sidecar_is_not_a_note() {
        let env = TestEnv::new();
        let config = StoreConfig {
            tags_file: "tags.json".to_string(),
            ..Default::default()
        };
        let mut provider = FileSystemProvider::with_fs(OsFs, env.root.clone(), &config);
        let tag = provider.create_tag(NewTag::new("urgent", "#f00")).unwrap();
        provider
            .create_note(NewNote::new("Plan", "").with_tags([tag.id.clone()]))
            .unwrap();
        assert!(provider
            .create_note(NewNote::new("tags.json", ""))
            .unwrap_err()
            .is_validation());

        let mut reopened = FileSystemProvider::with_fs(OsFs, env.root.clone(), &config);
        let notes = reopened.list_notes().unwrap();

        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Plan"]);
        assert_eq!(notes[0].tag_ids, vec![tag.id]);
        assert_eq!(reopened.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_works_over_memory_fs() {
        let base = PathBuf::from("/wiki");
        let mut provider =
            FileSystemProvider::with_fs(MemFs::with_root(&base), base, &StoreConfig::default());
        let tag = provider.create_tag(NewTag::new("idea", "")).unwrap();
        provider
            .create_note(NewNote::new("Spark", "text").with_tags([tag.id.clone()]))
            .unwrap();

        assert_eq!(
            provider.tree().fs().file_content(Path::new("/wiki/Spark")).as_deref(),
            Some("---\ntags: idea\n---\ntext")
        );
        assert!(provider
            .tree()
            .fs()
            .file_content(Path::new("/wiki/.tags.json"))
            .is_some());
    }
}
