use crate::error::Result;
use crate::model::{
    CategoryRecord, CategoryUpdate, NewCategory, NewNote, NewTag, NoteRecord, NoteUpdate,
    TagRecord, TagUpdate,
};

/// Abstract interface for knowledge-base storage.
///
/// Every backend implements the same contract: create/list/update/delete for
/// notes, tags and categories, plus attaching and detaching tags on notes.
/// List operations never fail on a missing id; update, delete and attach
/// operations report one as [`crate::WikiError::UnknownId`].
pub trait DataProvider {
    fn create_note(&mut self, data: NewNote) -> Result<NoteRecord>;

    fn list_notes(&mut self) -> Result<Vec<NoteRecord>>;

    fn update_note(&mut self, id: &str, data: NoteUpdate) -> Result<()>;

    fn delete_note(&mut self, id: &str) -> Result<()>;

    fn add_tag_to_note(&mut self, note_id: &str, tag_id: &str) -> Result<()>;

    fn remove_tag_from_note(&mut self, note_id: &str, tag_id: &str) -> Result<()>;

    fn create_tag(&mut self, data: NewTag) -> Result<TagRecord>;

    fn list_tags(&mut self) -> Result<Vec<TagRecord>>;

    fn update_tag(&mut self, id: &str, data: TagUpdate) -> Result<()>;

    fn delete_tag(&mut self, id: &str) -> Result<()>;

    fn create_category(&mut self, data: NewCategory) -> Result<CategoryRecord>;

    fn list_categories(&mut self) -> Result<Vec<CategoryRecord>>;

    fn update_category(&mut self, id: &str, data: CategoryUpdate) -> Result<()>;

    fn delete_category(&mut self, id: &str) -> Result<()>;
}
