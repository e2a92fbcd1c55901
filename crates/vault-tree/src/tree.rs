//! Pure in-memory hierarchical projection of a flat entry list
//!
//! A [`VirtualTree`] is built once per snapshot. Directories that are not
//! explicitly listed but are implied by deeper paths are synthesized as
//! implicit nodes; they answer `exists`/`stat`/`list` like real
//! directories but are not reported by [`VirtualTree::walk`].

use std::collections::BTreeMap;

use vault_fs::VaultPath;

use crate::{Entry, Error, Result};

#[derive(Debug, Default, Clone)]
struct Node {
    /// `None` marks an implicit directory synthesized from deeper paths.
    entry: Option<Entry>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn is_file(&self) -> bool {
        self.entry.as_ref().is_some_and(|e| !e.is_dir)
    }
}

/// In-memory tree projection over [`Entry`] values.
#[derive(Debug, Default, Clone)]
pub struct VirtualTree {
    root: Node,
}

impl VirtualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat entry list.
    ///
    /// Duplicate paths collapse last-write-wins. Basenames are recomputed
    /// from paths. Entries at the root path are ignored.
    pub fn build(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(entry);
        }
        tree
    }

    /// Insert or replace one entry, synthesizing implicit ancestors.
    pub fn insert(&mut self, entry: Entry) {
        let entry = entry.normalized();
        if entry.path.is_root() {
            return;
        }
        let segments: Vec<String> = entry.path.segments().map(str::to_string).collect();
        let mut node = &mut self.root;
        for segment in &segments[..segments.len() - 1] {
            node = node.children.entry(segment.clone()).or_default();
        }
        let leaf = node
            .children
            .entry(segments[segments.len() - 1].clone())
            .or_default();
        leaf.entry = Some(entry);
    }

    /// Flatten the tree back to entries, root excluded.
    ///
    /// Only explicit entries are reported; implicit directories stay
    /// implicit. Returned entries are clones — mutating them never
    /// aliases the tree. Order is depth-first over sorted child names.
    pub fn walk(&self) -> Vec<Entry> {
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// True for explicit nodes and implicit directories alike.
    pub fn exists(&self, path: &VaultPath) -> bool {
        self.find(path).is_some()
    }

    /// Entry at `path`, synthesizing a zero-size directory entry for
    /// implicit directories. `None` when the path does not exist.
    pub fn stat(&self, path: &VaultPath) -> Option<Entry> {
        let node = self.find(path)?;
        Some(match &node.entry {
            Some(entry) => entry.clone(),
            None => Entry::dir(path.clone()),
        })
    }

    /// Direct children of a directory, explicit and synthesized.
    ///
    /// # Errors
    ///
    /// `NotFound` when the directory does not exist, `NotADirectory`
    /// when the path names a file.
    pub fn list(&self, dir: &VaultPath) -> Result<Vec<Entry>> {
        let node = self.find(dir).ok_or_else(|| Error::NotFound {
            path: dir.clone(),
        })?;
        if node.is_file() {
            return Err(Error::NotADirectory { path: dir.clone() });
        }
        Ok(node
            .children
            .iter()
            .map(|(name, child)| match &child.entry {
                Some(entry) => entry.clone(),
                None => Entry::dir(dir.join(name)),
            })
            .collect())
    }

    /// Delete a path.
    ///
    /// Returns `Ok(false)` when the path does not exist. Descendants are
    /// removed only with `recursive`; a non-recursive delete of a
    /// non-empty directory fails with `NotEmpty`. Deleting the root
    /// requires `recursive` and clears the whole tree. Emptied implicit
    /// ancestors are pruned.
    pub fn delete(&mut self, path: &VaultPath, recursive: bool) -> Result<bool> {
        if path.is_root() {
            if !recursive {
                return Err(Error::NotEmpty { path: path.clone() });
            }
            self.root = Node::default();
            return Ok(true);
        }
        let segments: Vec<String> = path.segments().map(str::to_string).collect();
        delete_in(&mut self.root, path, &segments, recursive)
    }

    /// Create or refresh a file entry, like `touch`.
    ///
    /// Intermediate directories are implied. Fails with `IsADirectory`
    /// when the path already names a directory (explicit or implicit).
    /// Returns `true` when the file was newly created, `false` when an
    /// existing entry was updated.
    pub fn touch(&mut self, entry: Entry) -> Result<bool> {
        let entry = entry.normalized();
        if entry.path.is_root() {
            return Err(Error::IsADirectory {
                path: entry.path.clone(),
            });
        }
        if let Some(node) = self.find(&entry.path)
            && (!node.children.is_empty() || node.entry.as_ref().is_none_or(|e| e.is_dir))
        {
            return Err(Error::IsADirectory {
                path: entry.path.clone(),
            });
        }
        let created = self.find(&entry.path).is_none();
        self.insert(Entry { is_dir: false, ..entry });
        Ok(created)
    }

    /// Idempotent `mkdir -p`.
    ///
    /// Every created or implicit segment becomes an explicit directory.
    /// Fails with `NotADirectory` when any segment is occupied by a file.
    /// Returns `true` when the final directory was not explicit before.
    pub fn mkdir(&mut self, path: &VaultPath) -> Result<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let segments: Vec<String> = path.segments().map(str::to_string).collect();
        let mut node = &mut self.root;
        let mut so_far = VaultPath::root();
        let mut created = false;
        for segment in &segments {
            so_far = so_far.join(segment);
            let child = node.children.entry(segment.clone()).or_default();
            if child.is_file() {
                return Err(Error::NotADirectory { path: so_far });
            }
            if child.entry.is_none() {
                child.entry = Some(Entry::dir(so_far.clone()));
                created = true;
            }
            node = child;
        }
        Ok(created)
    }

    fn find(&self, path: &VaultPath) -> Option<&Node> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

fn collect(node: &Node, out: &mut Vec<Entry>) {
    for child in node.children.values() {
        if let Some(entry) = &child.entry {
            out.push(entry.clone());
        }
        collect(child, out);
    }
}

fn delete_in(
    node: &mut Node,
    full: &VaultPath,
    segments: &[String],
    recursive: bool,
) -> Result<bool> {
    let (head, rest) = segments.split_first().expect("non-empty segments");
    if rest.is_empty() {
        let Some(child) = node.children.get(head) else {
            return Ok(false);
        };
        if !child.children.is_empty() && !recursive {
            return Err(Error::NotEmpty { path: full.clone() });
        }
        node.children.remove(head);
        return Ok(true);
    }
    let Some(child) = node.children.get_mut(head) else {
        return Ok(false);
    };
    let deleted = delete_in(child, full, rest, recursive)?;
    // Prune implicit directories that lost their last descendant.
    if deleted && child.entry.is_none() && child.children.is_empty() {
        node.children.remove(head);
    }
    Ok(deleted)
}
