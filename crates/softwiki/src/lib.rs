//! # SoftWiki
//!
//! A personal knowledge-base store: notes with a title, a body, tags and an
//! optional category, kept behind a fixed storage contract
//! ([`DataProvider`]).
//!
//! The filesystem backend ([`FileSystemProvider`]) stores each note as a plain
//! text file, each category as a directory and all tags in one sidecar index:
//!
//! ```no_run
//! use softwiki::{DataProvider, NewCategory, NewNote, NewTag};
//!
//! # fn main() -> softwiki::Result<()> {
//! let mut wiki = softwiki::open("/home/me/wiki")?;
//! let work = wiki.create_category(NewCategory::new("Work"))?;
//! let urgent = wiki.create_tag(NewTag::new("urgent", "#ff0000"))?;
//! wiki.create_note(
//!     NewNote::new("Plan", "Ship it.")
//!         .with_tags([urgent.id])
//!         .in_category(work.id),
//! )?;
//! for note in wiki.list_notes()? {
//!     println!("{} ({} tags)", note.title, note.tag_ids.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod provider;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

pub use config::StoreConfig;
pub use error::{EntityKind, Result, WikiError};
pub use model::{
    CategoryRecord, CategoryUpdate, NewCategory, NewNote, NewTag, NoteRecord, NoteUpdate,
    TagRecord, TagUpdate,
};
pub use provider::DataProvider;
pub use store::fs_provider::FileSystemProvider;

use std::path::Path;

/// Open the knowledge base at `base_path` with the filesystem backend.
pub fn open(base_path: impl AsRef<Path>) -> Result<Box<dyn DataProvider>> {
    let provider = FileSystemProvider::open(base_path.as_ref())?;
    Ok(Box::new(provider))
}
