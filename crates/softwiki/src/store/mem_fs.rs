use super::vfs::{DirEntry, FileSystem};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum MemEntry {
    Dir,
    File(String),
}

/// In-memory [`FileSystem`] for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// Paths are compared component-wise, so callers should build them the same
/// way the tree does (`base.join(name)`).
#[derive(Debug, Default)]
pub struct MemFs {
    entries: RefCell<BTreeMap<PathBuf, MemEntry>>,
    simulate_write_error: Cell<bool>,
}

impl MemFs {
    /// Creates a filesystem where `root` (and its ancestors) already exist.
    pub fn with_root(root: &Path) -> Self {
        let fs = Self::default();
        {
            let mut entries = fs.entries.borrow_mut();
            for ancestor in root.ancestors() {
                if !ancestor.as_os_str().is_empty() {
                    entries.insert(ancestor.to_path_buf(), MemEntry::Dir);
                }
            }
        }
        fs
    }

    /// Make every mutating call fail, for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Test helper: content of a file, if present.
    pub fn file_content(&self, path: &Path) -> Option<String> {
        match self.entries.borrow().get(path) {
            Some(MemEntry::File(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.borrow().get(path), Some(MemEntry::Dir))
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.simulate_write_error.get() {
            return Err(io::Error::other("Simulated write error"));
        }
        Ok(())
    }

    fn require_parent_dir(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| not_found(path))?;
        if self.is_dir(parent) {
            Ok(())
        } else {
            Err(not_found(parent))
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}

impl FileSystem for MemFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if !self.is_dir(path) {
            return Err(not_found(path));
        }
        let entries = self.entries.borrow();
        let listed = entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, entry)| {
                let name = p.file_name()?.to_str()?.to_string();
                Some(DirEntry {
                    name,
                    is_dir: matches!(entry, MemEntry::Dir),
                })
            })
            .collect();
        Ok(listed)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.file_content(path).ok_or_else(|| not_found(path))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        self.check_writable()?;
        self.require_parent_dir(path)?;
        if self.is_dir(path) {
            return Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            )));
        }
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), MemEntry::File(content.to_string()));
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        self.require_parent_dir(path)?;
        if self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), MemEntry::Dir);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_writable()?;
        if !self.exists(from) {
            return Err(not_found(from));
        }
        self.require_parent_dir(to)?;

        let mut entries = self.entries.borrow_mut();
        let moved: Vec<PathBuf> = entries
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = entries.remove(&old) {
                let new = match old.strip_prefix(from) {
                    Ok(rest) if !rest.as_os_str().is_empty() => to.join(rest),
                    _ => to.to_path_buf(),
                };
                entries.insert(new, entry);
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        if self.file_content(path).is_none() {
            return Err(not_found(path));
        }
        self.entries.borrow_mut().remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        if !self.is_dir(path) {
            return Err(not_found(path));
        }
        self.entries
            .borrow_mut()
            .retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.borrow().contains_key(path)
    }
}
