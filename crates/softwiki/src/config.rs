//! # Configuration
//!
//! Store configuration is managed by [`confique`], layering environment
//! variables over an optional file in the base directory over compiled
//! defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `SOFTWIKI_TAGS_FILE`, `SOFTWIKI_FILE_EXT`.
//! 2. **Store file**: `<base>/.softwiki.toml`.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `tags_file` | `.tags.json` | File name of the tag sidecar index under the base path |
//! | `file_ext` | `""` | Extension appended to note titles on disk (e.g. `.md`) |
//!
//! `tags_file` must be a bare file name: the sidecar always sits directly in
//! the base directory, where tree discovery skips it.

use crate::error::{Result, WikiError};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = ".softwiki.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Tag sidecar file name, relative to the base path.
    #[config(env = "SOFTWIKI_TAGS_FILE", default = ".tags.json")]
    pub tags_file: String,

    /// Extension for note files. Empty means the file name is the title.
    #[config(env = "SOFTWIKI_FILE_EXT", default = "")]
    pub file_ext: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tags_file: ".tags.json".to_string(),
            file_ext: String::new(),
        }
    }
}

impl StoreConfig {
    /// Load the layered configuration for a store rooted at `base`.
    pub fn load(base: &Path) -> Result<Self> {
        let config = StoreConfig::builder()
            .env()
            .file(base.join(CONFIG_FILE))
            .load()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that the type alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        let name = self.tags_file.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(WikiError::Validation(format!(
                "tags_file must be a file name in the base directory, got '{}'",
                name
            )));
        }
        Ok(())
    }

    /// Get the note extension, normalized to start with a dot (or empty).
    pub fn file_ext(&self) -> String {
        if self.file_ext.is_empty() || self.file_ext.starts_with('.') {
            self.file_ext.clone()
        } else {
            format!(".{}", self.file_ext)
        }
    }
}
