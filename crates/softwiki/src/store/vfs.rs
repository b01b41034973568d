use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A directory entry as seen by [`FileSystem::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Abstract interface for the raw disk calls the note tree performs.
///
/// The tree decides *what* to touch; implementations only decide *how*
/// (real filesystem vs. memory). All methods take `&self`; in-memory
/// implementations use interior mutability.
pub trait FileSystem {
    /// List the immediate children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write content to `path`.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create a single directory. Fails if it already exists.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Rename or move a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("Skipping non UTF-8 entry in {}", path.display());
                continue;
            };
            entries.push(DirEntry {
                name,
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        let tmp_path = temp_path_for(path);
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Hidden sibling temp file, e.g. `dir/.Plan-<uuid>.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}-{}.tmp", name, Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_leaves_no_tmp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Plan");

        OsFs.write_atomic(&target, "first").unwrap();
        OsFs.write_atomic(&target, "second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        let entries = OsFs.list_dir(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![DirEntry {
                name: "Plan".to_string(),
                is_dir: false
            }]
        );
    }

    #[test]
    fn test_list_dir_is_sorted_and_typed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b-dir")).unwrap();
        fs::write(dir.path().join("c-file"), "").unwrap();
        fs::write(dir.path().join("a-file"), "").unwrap();

        let entries = OsFs.list_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.is_dir)).collect();
        assert_eq!(
            names,
            vec![("a-file", false), ("b-dir", true), ("c-file", false)]
        );
    }

    #[test]
    fn test_list_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(OsFs.list_dir(&dir.path().join("missing")).is_err());
    }
}
