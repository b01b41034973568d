//! # Note Tree
//!
//! In-memory mirror of the base directory. Directories and files are nodes in
//! an arena keyed by [`NodeId`]; every node stores its name and a pointer to
//! its parent directory, and every directory keeps the ids of its children.
//! Paths are never stored: [`Tree::path`] rebuilds them from the parent chain,
//! so renaming a directory implicitly relocates everything beneath it.
//!
//! Every mutation that has a disk counterpart performs the disk call first and
//! only touches the arena once it succeeded, so a failed call leaves memory and
//! disk as they were.
//!
//! ## Discovery
//!
//! [`Tree::init`] reads one level of subdirectories under the base path (each
//! one a category) plus the files inside them and inside the base directory
//! itself. Hidden entries are skipped: the configuration file and in-flight
//! temp files start with a dot, and no valid title or category name can. The
//! tag sidecar is skipped by name (see [`Tree::with_sidecar`]), and that name
//! cannot be taken by a note or category in the base directory.
//!
//! Nothing is added to the arena until every directory has been listed, so a
//! failed discovery can simply be retried.
//!
//! ## Identifiers
//!
//! Ids come from a process-wide counter. They are unique for the lifetime of
//! the process but are reassigned by discovery on every run.

use super::vfs::FileSystem;
use crate::error::{EntityKind, Result, WikiError};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Name of the root directory. It stands for "no category".
pub const ROOT_NAME: &str = ".";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(NodeId)
    }
}

#[derive(Debug)]
enum NodeKind {
    Directory {
        directories: BTreeSet<NodeId>,
        files: BTreeSet<NodeId>,
    },
    File,
}

#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Child directory ids, in creation order. Empty for files.
    pub fn directories(&self) -> impl Iterator<Item = NodeId> + '_ {
        let set = match &self.kind {
            NodeKind::Directory { directories, .. } => Some(directories),
            NodeKind::File => None,
        };
        set.into_iter().flatten().copied()
    }

    /// Child file ids, in creation order. Empty for files.
    pub fn files(&self) -> impl Iterator<Item = NodeId> + '_ {
        let set = match &self.kind {
            NodeKind::Directory { files, .. } => Some(files),
            NodeKind::File => None,
        };
        set.into_iter().flatten().copied()
    }
}

pub struct Tree<F: FileSystem> {
    fs: F,
    base_path: PathBuf,
    file_ext: String,
    sidecar: Option<String>,
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    initialized: bool,
}

impl<F: FileSystem> Tree<F> {
    /// Creates an empty tree rooted at `base_path`. Nothing is read until
    /// [`Tree::init`].
    ///
    /// `file_ext` (empty or starting with `.`) is appended to file names on
    /// disk and only files carrying it are discovered.
    pub fn new(fs: F, base_path: PathBuf, file_ext: String) -> Self {
        let root = NodeId::next();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                id: root,
                name: ROOT_NAME.to_string(),
                parent: None,
                kind: empty_directory(),
            },
        );
        Self {
            fs,
            base_path,
            file_ext,
            sidecar: None,
            root,
            nodes,
            initialized: false,
        }
    }

    /// Reserve `name` in the base directory for a file the tree does not own.
    pub fn with_sidecar(mut self, name: impl Into<String>) -> Self {
        self.sidecar = Some(name.into());
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Discover the directories and files under the base path. Runs once;
    /// later calls return immediately.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let mut directories = Vec::new();
        let mut root_files = Vec::new();
        for entry in self.fs.list_dir(&self.base_path)? {
            if !self.is_discoverable(&entry.name, true) {
                continue;
            }
            if entry.is_dir {
                directories.push(entry.name);
            } else if let Some(title) = self.strip_ext(&entry.name) {
                root_files.push(title.to_string());
            }
        }
        let mut listed = Vec::with_capacity(directories.len());
        for name in directories {
            let files = self.discover_files(&self.base_path.join(&name))?;
            listed.push((name, files));
        }

        let root = self.root;
        let mut discovered = root_files.len();
        for title in root_files {
            self.add_file(root, &title)?;
        }
        let directory_count = listed.len();
        for (name, files) in listed {
            let directory = self.add_directory(root, &name)?;
            discovered += files.len();
            for title in files {
                self.add_file(directory, &title)?;
            }
        }

        log::debug!(
            "Discovered {} directories and {} files under {}",
            directory_count,
            discovered,
            self.base_path.display()
        );
        self.initialized = true;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn directory(&self, id: NodeId) -> Option<&Node> {
        self.node(id).filter(|n| n.is_directory())
    }

    pub fn file(&self, id: NodeId) -> Option<&Node> {
        self.node(id).filter(|n| !n.is_directory())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Every directory, root first, then depth-first in creation order.
    pub fn walk_directories(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.directory(id) {
                out.push(id);
                let children: Vec<NodeId> = node.directories().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// The child of `directory` named `name`, of the given kind.
    pub fn child_named(&self, directory: NodeId, name: &str, is_dir: bool) -> Option<NodeId> {
        let dir = self.directory(directory)?;
        let mut children: Box<dyn Iterator<Item = NodeId> + '_> = if is_dir {
            Box::new(dir.directories())
        } else {
            Box::new(dir.files())
        };
        children.find(|child| self.node(*child).is_some_and(|n| n.name == name))
    }

    pub fn path(&self, id: NodeId) -> Option<PathBuf> {
        let node = self.node(id)?;
        if id == self.root {
            return Some(self.base_path.clone());
        }
        let parent = self.path(node.parent?)?;
        Some(parent.join(self.disk_name(node)))
    }

    /// Allocate a directory node without touching the disk.
    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.attach(parent, name, empty_directory())
    }

    /// Allocate a file node without touching the disk. Callers write the
    /// content themselves.
    pub fn add_file(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.attach(parent, name, NodeKind::File)
    }

    /// Create a directory on disk and, once that succeeded, in the tree.
    pub fn create_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.ensure_free(parent, name, true)?;
        let path = self.directory_path(parent)?.join(name);
        self.fs.create_dir(&path)?;
        let id = self.add_directory(parent, name)?;
        log::debug!("Created directory {} ({})", path.display(), id);
        Ok(id)
    }

    pub fn read(&self, id: NodeId) -> Result<String> {
        let path = self.file_path(id)?;
        Ok(self.fs.read_to_string(&path)?)
    }

    pub fn write(&self, id: NodeId, content: &str) -> Result<()> {
        let path = self.file_path(id)?;
        self.fs.write_atomic(&path, content)?;
        Ok(())
    }

    /// Rename on disk, then in memory. Paths of descendants follow.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let (parent, is_dir, old_name) = match self.node(id) {
            Some(_) if id == self.root => {
                return Err(WikiError::Store(
                    "cannot rename the root directory".to_string(),
                ))
            }
            Some(node) => (
                node.parent.ok_or_else(|| orphan(id))?,
                node.is_directory(),
                node.name.clone(),
            ),
            None => return Err(unknown_node(id)),
        };
        if old_name == new_name {
            return Ok(());
        }
        self.ensure_free(parent, new_name, is_dir)?;

        let from = self.path(id).ok_or_else(|| orphan(id))?;
        let to = from.with_file_name(self.disk_name_for(new_name, is_dir));
        self.fs.rename(&from, &to)?;

        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = new_name.to_string();
        }
        log::debug!("Renamed {} to {}", from.display(), to.display());
        Ok(())
    }

    /// Move a node under `destination`, on disk then in memory.
    pub fn move_to(&mut self, id: NodeId, destination: NodeId) -> Result<()> {
        if self.directory(destination).is_none() {
            return Err(WikiError::unknown(
                EntityKind::Directory,
                destination.to_string(),
            ));
        }
        let (parent, is_dir, name) = match self.node(id) {
            Some(_) if id == self.root => {
                return Err(WikiError::Store(
                    "cannot move the root directory".to_string(),
                ))
            }
            Some(node) => (
                node.parent.ok_or_else(|| orphan(id))?,
                node.is_directory(),
                node.name.clone(),
            ),
            None => return Err(unknown_node(id)),
        };
        if parent == destination {
            return Ok(());
        }
        if is_dir && self.is_within(destination, id) {
            return Err(WikiError::Validation(format!(
                "cannot move directory '{}' into itself",
                name
            )));
        }
        self.ensure_free(destination, &name, is_dir)?;

        let from = self.path(id).ok_or_else(|| orphan(id))?;
        let to = self
            .directory_path(destination)?
            .join(self.disk_name_for(&name, is_dir));
        self.fs.rename(&from, &to)?;

        self.unlink(parent, id);
        self.link(destination, id, is_dir);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(destination);
        }
        log::debug!("Moved {} to {}", from.display(), to.display());
        Ok(())
    }

    /// Delete a node (recursively for directories) from disk, then from the
    /// tree. Returns the ids of every file that was removed.
    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if id == self.root {
            return Err(WikiError::Store(
                "cannot delete the root directory".to_string(),
            ));
        }
        let node = self.node(id).ok_or_else(|| unknown_node(id))?;
        let is_dir = node.is_directory();
        let parent = node.parent.ok_or_else(|| orphan(id))?;
        if self.directory(parent).is_none() {
            return Err(orphan(id));
        }

        let path = self.path(id).ok_or_else(|| orphan(id))?;
        if is_dir {
            self.fs.remove_dir_all(&path)?;
        } else {
            self.fs.remove_file(&path)?;
        }

        let removed = self.forget(id);
        log::debug!("Deleted {}", path.display());
        Ok(removed)
    }

    /// Drop a node and its subtree from memory only. Returns removed file ids.
    pub fn forget(&mut self, id: NodeId) -> Vec<NodeId> {
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
        let mut removed_files = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(&current) else {
                continue;
            };
            match node.kind {
                NodeKind::Directory { directories, files } => {
                    stack.extend(directories);
                    stack.extend(files);
                }
                NodeKind::File => removed_files.push(current),
            }
        }
        removed_files
    }

    fn attach(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        if self.directory(parent).is_none() {
            return Err(WikiError::unknown(EntityKind::Directory, parent.to_string()));
        }
        let id = NodeId::next();
        let is_dir = matches!(kind, NodeKind::Directory { .. });
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_string(),
                parent: Some(parent),
                kind,
            },
        );
        self.link(parent, id, is_dir);
        Ok(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, is_dir: bool) {
        if let Some(Node {
            kind: NodeKind::Directory { directories, files },
            ..
        }) = self.nodes.get_mut(&parent)
        {
            if is_dir {
                directories.insert(child);
            } else {
                files.insert(child);
            }
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Node {
            kind: NodeKind::Directory { directories, files },
            ..
        }) = self.nodes.get_mut(&parent)
        {
            directories.remove(&child);
            files.remove(&child);
        }
    }

    /// Fail unless `name` can be given to a new child of `directory`.
    pub fn ensure_free(&self, directory: NodeId, name: &str, is_dir: bool) -> Result<()> {
        if directory == self.root
            && self.sidecar.as_deref() == Some(self.disk_name_for(name, is_dir).as_str())
        {
            return Err(WikiError::Validation(format!(
                "'{}' is reserved for the tag index",
                name
            )));
        }
        if self.child_named(directory, name, is_dir).is_some() {
            let what = if is_dir { "directory" } else { "note" };
            return Err(WikiError::Validation(format!(
                "a {} named '{}' already exists",
                what, name
            )));
        }
        Ok(())
    }

    /// True if `id` is `ancestor` or lies beneath it.
    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn directory_path(&self, id: NodeId) -> Result<PathBuf> {
        self.directory(id)
            .and_then(|_| self.path(id))
            .ok_or_else(|| WikiError::unknown(EntityKind::Directory, id.to_string()))
    }

    fn file_path(&self, id: NodeId) -> Result<PathBuf> {
        self.file(id)
            .and_then(|_| self.path(id))
            .ok_or_else(|| WikiError::unknown(EntityKind::Note, id.to_string()))
    }

    fn disk_name(&self, node: &Node) -> String {
        self.disk_name_for(&node.name, node.is_directory())
    }

    fn disk_name_for(&self, name: &str, is_dir: bool) -> String {
        if is_dir {
            name.to_string()
        } else {
            format!("{}{}", name, self.file_ext)
        }
    }

    fn discover_files(&self, path: &Path) -> Result<Vec<String>> {
        let mut titles = Vec::new();
        for entry in self.fs.list_dir(path)? {
            if entry.is_dir || !self.is_discoverable(&entry.name, false) {
                continue;
            }
            if let Some(title) = self.strip_ext(&entry.name) {
                titles.push(title.to_string());
            }
        }
        Ok(titles)
    }

    fn is_discoverable(&self, name: &str, in_base: bool) -> bool {
        !is_hidden(name) && !(in_base && self.sidecar.as_deref() == Some(name))
    }

    fn strip_ext<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if self.file_ext.is_empty() {
            return Some(file_name);
        }
        file_name
            .strip_suffix(self.file_ext.as_str())
            .filter(|title| !title.is_empty())
    }
}

fn empty_directory() -> NodeKind {
    NodeKind::Directory {
        directories: BTreeSet::new(),
        files: BTreeSet::new(),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn unknown_node(id: NodeId) -> WikiError {
    WikiError::unknown(EntityKind::Node, id.to_string())
}

fn orphan(id: NodeId) -> WikiError {
    WikiError::Store(format!("corrupted tree: node {} has no parent directory", id))
}
