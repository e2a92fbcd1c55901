//! In-memory local adapter

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_local::{Error, Listing, LocalAdapter, Result};
use vault_tree::Entry;

#[derive(Debug, Clone)]
enum Node {
    File { bytes: Vec<u8>, mtime: i64 },
    Dir,
}

/// An in-memory vault behind the [`LocalAdapter`] port.
///
/// Writes through the port stamp files with a monotonically increasing
/// clock; fixtures that need specific mtimes use [`MemoryVault::put`].
pub struct MemoryVault {
    nodes: Mutex<BTreeMap<VaultPath, Node>>,
    clock: Mutex<i64>,
    root_id: String,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(BTreeMap::new()),
            clock: Mutex::new(1_000),
            root_id: "memory-vault".to_string(),
        }
    }

    pub fn with_root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = id.into();
        self
    }

    fn tick(&self) -> i64 {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        *clock
    }

    fn ensure_parents(nodes: &mut BTreeMap<VaultPath, Node>, path: &VaultPath) {
        for ancestor in path.ancestors() {
            if !ancestor.is_root() {
                nodes.entry(ancestor).or_insert(Node::Dir);
            }
        }
    }

    /// Place a file with an explicit mtime, creating parents.
    pub fn put(&self, path: &str, bytes: impl AsRef<[u8]>, mtime: i64) {
        let path = VaultPath::new(path);
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(
            path,
            Node::File {
                bytes: bytes.as_ref().to_vec(),
                mtime,
            },
        );
    }

    /// Place a directory, creating parents.
    pub fn put_dir(&self, path: &str) {
        let path = VaultPath::new(path);
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(path, Node::Dir);
    }

    /// Drop a path and everything below it, as a user deletion would.
    pub fn delete_path(&self, path: &str) {
        let path = VaultPath::new(path);
        self.nodes
            .lock()
            .unwrap()
            .retain(|p, _| !p.starts_with(&path));
    }

    /// Current content of a file, or `None` when absent or a directory.
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.lock().unwrap().get(&VaultPath::new(path)) {
            Some(Node::File { bytes, .. }) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes
            .lock()
            .unwrap()
            .contains_key(&VaultPath::new(path))
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.nodes
            .lock()
            .unwrap()
            .keys()
            .map(|p| p.to_string())
            .collect()
    }

    fn entry_for(path: &VaultPath, node: &Node) -> Entry {
        match node {
            Node::File { bytes, mtime } => Entry::file(path.clone(), *mtime, bytes.len() as u64),
            Node::Dir => Entry::dir(path.clone()),
        }
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalAdapter for MemoryVault {
    async fn list(&self, dir: &VaultPath) -> Result<Listing> {
        let nodes = self.nodes.lock().unwrap();
        let mut listing = Listing::default();
        for (path, node) in nodes.iter() {
            if path.parent().as_ref() != Some(dir) {
                continue;
            }
            let entry = Self::entry_for(path, node);
            if entry.is_dir {
                listing.folders.push(entry);
            } else {
                listing.files.push(entry);
            }
        }
        Ok(listing)
    }

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes.get(path).map(|node| Self::entry_for(path, node)))
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        match self.nodes.lock().unwrap().get(path) {
            Some(Node::File { bytes, .. }) => Ok(bytes.clone()),
            _ => Err(Error::NotFound { path: path.clone() }),
        }
    }

    async fn write(&self, path: &VaultPath, bytes: &[u8]) -> Result<()> {
        let mtime = self.tick();
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, path);
        nodes.insert(
            path.clone(),
            Node::File {
                bytes: bytes.to_vec(),
                mtime,
            },
        );
        Ok(())
    }

    async fn create_folder(&self, path: &VaultPath) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        Self::ensure_parents(&mut nodes, path);
        nodes.insert(path.clone(), Node::Dir);
        Ok(())
    }

    async fn remove(&self, path: &VaultPath) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    async fn exists(&self, path: &VaultPath) -> Result<bool> {
        Ok(self.nodes.lock().unwrap().contains_key(path))
    }

    fn root_id(&self) -> String {
        self.root_id.clone()
    }
}
