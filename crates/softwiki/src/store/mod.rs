//! # Filesystem Storage
//!
//! The filesystem backend keeps a knowledge base as plain files a person can
//! read and edit with any tool:
//!
//! ```text
//! <base>/
//! ├── .softwiki.toml      # Optional configuration
//! ├── .tags.json          # Tag sidecar index
//! ├── Groceries           # Uncategorized note
//! └── Work/               # Category
//!     └── Plan            # Note filed under "Work"
//! ```
//!
//! ## Layers
//!
//! - [`vfs`]: the raw disk calls ([`vfs::FileSystem`]), with [`vfs::OsFs`] for
//!   production and [`mem_fs::MemFs`] for tests.
//! - [`tree`]: the in-memory mirror of the directory tree, one node per
//!   category directory and note file.
//! - [`notes`], [`tags`], [`categories`]: map each entity onto the tree or
//!   the tag sidecar.
//! - [`fs_provider`]: the [`crate::DataProvider`] implementation tying them
//!   together.
//!
//! ## Note Files
//!
//! A note file opens with a metadata block (see [`crate::metadata`]) whose
//! `tags` key lists the note's tag *names*; names are resolved back to ids
//! through the sidecar on every listing. Other keys found in the block are
//! kept when the note is rewritten.

use crate::error::{EntityKind, Result, WikiError};
use tree::NodeId;

pub mod categories;
pub mod fs_provider;
pub mod mem_fs;
pub mod notes;
pub mod tags;
pub mod tree;
pub mod vfs;

/// Parse a record id into a tree node id. Anything that is not a node id
/// cannot name a note or category.
pub(crate) fn node_id(id: &str, kind: EntityKind) -> Result<NodeId> {
    id.parse().map_err(|_| WikiError::unknown(kind, id))
}
