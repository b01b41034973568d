//! Name validation for note titles, category names and tag names.
//!
//! Titles and category names become file and directory names on disk, so they
//! must not contain sequences that escape or hide the entry:
//! - leading `~` or `.`
//! - `..` anywhere
//! - `/`, `\` or `*` anywhere
//!
//! Tag names are stored as a comma-separated list inside each note's metadata
//! block and so must not contain `,` or line breaks.

use crate::error::{Result, WikiError};

/// Returns the first forbidden sequence found in `name`, in table order.
///
/// # Examples
/// ```
/// use softwiki::validation::forbidden_sequence;
///
/// assert_eq!(forbidden_sequence("Plan"), None);
/// assert_eq!(forbidden_sequence(".hidden"), Some("."));
/// assert_eq!(forbidden_sequence("a/b"), Some("/"));
/// assert_eq!(forbidden_sequence("~/a..b"), Some("~"));
/// ```
pub fn forbidden_sequence(name: &str) -> Option<&'static str> {
    if name.starts_with('~') {
        return Some("~");
    }
    if name.starts_with('.') {
        return Some(".");
    }
    ["..", "/", "\\", "*"]
        .into_iter()
        .find(|seq| name.contains(seq))
}

/// Validates a name that will be used as a file or directory name.
///
/// `field` names what is being validated ("title", "category name") and is
/// carried into the error message.
pub fn validate_entry_name(name: &str, field: &'static str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(WikiError::Validation(format!("{} cannot be empty", field)));
    }
    if let Some(sequence) = forbidden_sequence(name) {
        return Err(WikiError::ForbiddenSequence { sequence, field });
    }
    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(WikiError::Validation("tag name cannot be empty".to_string()));
    }
    if name.trim() != name {
        return Err(WikiError::Validation(format!(
            "tag name '{}' cannot start or end with whitespace",
            name
        )));
    }
    if let Some(ch) = name.chars().find(|c| matches!(c, ',' | '\n' | '\r')) {
        return Err(WikiError::Validation(format!(
            "tag name contains invalid character {:?}",
            ch
        )));
    }
    Ok(())
}
