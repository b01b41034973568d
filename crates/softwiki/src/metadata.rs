//! # Metadata Block Codec
//!
//! A note file may start with a small key-value header:
//!
//! ```text
//! ---
//! tags: urgent, work
//! author: me
//! ---
//! The note body starts here.
//! ```
//!
//! [`parse`] splits such a text into its [`Metadata`] and body, and
//! [`generate`] does the reverse. For any metadata whose keys contain no `:`
//! and whose values have no surrounding whitespace or line breaks,
//! `generate(parsed.body, parsed.meta)` reproduces the original text exactly.
//!
//! Text that does not open with the delimiter line is all body.

use thiserror::Error;

pub const DELIMITER: &str = "---";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("file ends before the metadata block is closed")]
    Unclosed,

    #[error("metadata line {line} has no ':' separator")]
    MissingSeparator { line: usize },
}

/// Ordered string map used for the metadata block.
///
/// Iteration follows insertion order; re-inserting an existing key replaces
/// the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Metadata::new();
        for (k, v) in iter {
            meta.insert(k, v);
        }
        meta
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub meta: Metadata,
    pub body: String,
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}

/// Split `text` into its leading metadata block and the body that follows.
pub fn parse(text: &str) -> Result<Parsed, ParseError> {
    let Some((first, mut rest)) = split_line(text) else {
        return Ok(unblocked(text));
    };
    if !is_delimiter(first) {
        return Ok(unblocked(text));
    }

    let mut meta = Metadata::new();
    let mut line_no = 1;
    loop {
        line_no += 1;
        let Some((line, after)) = split_line(rest) else {
            return Err(ParseError::Unclosed);
        };
        if is_delimiter(line) {
            return Ok(Parsed {
                meta,
                body: after.to_string(),
            });
        }
        if after.is_empty() && !rest.ends_with('\n') {
            return Err(ParseError::Unclosed);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::MissingSeparator { line: line_no })?;
        meta.insert(key, value.trim());
        rest = after;
    }
}

/// Render `body` behind a metadata block. Empty metadata yields `body` as is.
pub fn generate(body: &str, meta: &Metadata) -> String {
    if meta.is_empty() {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(DELIMITER);
    out.push('\n');
    for (key, value) in meta.iter() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    out
}

fn unblocked(text: &str) -> Parsed {
    Parsed {
        meta: Metadata::new(),
        body: text.to_string(),
    }
}

/// Returns the first line and the remainder after its newline.
/// A final line without a trailing newline is still a line.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(i) => Some((&text[..i], &text[i + 1..])),
        None => Some((text, "")),
    }
}
