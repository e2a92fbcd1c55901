//! Scriptable in-memory remote

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vault_fs::VaultPath;
use vault_remote::{DeltaEntry, DeltaPage, Error, ListPage, RemoteClient, Result};
use vault_tree::Entry;

#[derive(Debug, Clone)]
enum Node {
    File { bytes: Vec<u8>, mtime: i64 },
    Dir,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<VaultPath, Node>,
    /// Full change history; a cursor is an index into it.
    feed: Vec<DeltaEntry>,
    clock: i64,
    revision: u64,
    /// Remaining calls that answer with a throttle error.
    throttled_calls: usize,
    /// The next delta call reports a server-side history reset.
    pending_reset: bool,
    list_calls: usize,
    delta_calls: usize,
    write_calls: usize,
}

/// An in-memory remote store behind the [`RemoteClient`] port.
///
/// Every mutation, whether scripted by the test or performed through
/// the port, appends to an internal change feed so delta replay behaves
/// like a real server. Pagination sizes and throttling are scriptable.
pub struct MockRemote {
    state: Mutex<State>,
    list_page_size: usize,
    delta_page_size: usize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                clock: 10_000,
                ..State::default()
            }),
            list_page_size: 100,
            delta_page_size: 100,
        }
    }

    /// Shrink the traversal / feed pages to force pagination.
    pub fn with_page_sizes(mut self, list: usize, delta: usize) -> Self {
        self.list_page_size = list.max(1);
        self.delta_page_size = delta.max(1);
        self
    }

    /// Script a file with an explicit mtime, recording it in the feed.
    pub fn put(&self, path: &str, bytes: impl AsRef<[u8]>, mtime: i64) {
        let path = VaultPath::new(path);
        let mut state = self.state.lock().unwrap();
        for ancestor in path.ancestors() {
            if !ancestor.is_root() && !state.nodes.contains_key(&ancestor) {
                state.nodes.insert(ancestor.clone(), Node::Dir);
                record(&mut state, ancestor, 0, false, true);
            }
        }
        let size = bytes.as_ref().len() as u64;
        state.nodes.insert(
            path.clone(),
            Node::File {
                bytes: bytes.as_ref().to_vec(),
                mtime,
            },
        );
        record(&mut state, path, size, false, false);
    }

    pub fn put_dir(&self, path: &str) {
        let path = VaultPath::new(path);
        let mut state = self.state.lock().unwrap();
        state.nodes.insert(path.clone(), Node::Dir);
        record(&mut state, path, 0, false, true);
    }

    /// Script a deletion, recording the tombstone in the feed.
    pub fn delete_path(&self, path: &str) {
        let path = VaultPath::new(path);
        let mut state = self.state.lock().unwrap();
        let removed: Vec<VaultPath> = state
            .nodes
            .keys()
            .filter(|p| p.starts_with(&path))
            .cloned()
            .collect();
        for p in removed {
            let was_dir = matches!(state.nodes.remove(&p), Some(Node::Dir));
            record(&mut state, p, 0, true, was_dir);
        }
    }

    /// Answer the next `calls` port calls with a throttle error.
    pub fn throttle_next(&self, calls: usize) {
        self.state.lock().unwrap().throttled_calls = calls;
    }

    /// Report a history reset on the next delta request.
    pub fn force_reset(&self) {
        self.state.lock().unwrap().pending_reset = true;
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(&VaultPath::new(path)) {
            Some(Node::File { bytes, .. }) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .nodes
            .contains_key(&VaultPath::new(path))
    }

    pub fn paths(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .keys()
            .map(|p| p.to_string())
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn delta_calls(&self) -> usize {
        self.state.lock().unwrap().delta_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    fn gate(state: &mut State) -> Result<()> {
        if state.throttled_calls > 0 {
            state.throttled_calls -= 1;
            return Err(Error::Throttled {
                retry_after: Some(Duration::from_secs(1)),
            });
        }
        Ok(())
    }

    fn entry_for(path: &VaultPath, node: &Node) -> Entry {
        match node {
            Node::File { bytes, mtime } => Entry::file(path.clone(), *mtime, bytes.len() as u64),
            Node::Dir => Entry::dir(path.clone()),
        }
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn record(state: &mut State, path: VaultPath, size: u64, is_deleted: bool, is_dir: bool) {
    state.clock += 1;
    state.revision += 1;
    let modified = match state.nodes.get(&path) {
        Some(Node::File { mtime, .. }) => *mtime,
        _ => state.clock,
    };
    let revision = format!("rev-{}", state.revision);
    state.feed.push(DeltaEntry {
        path,
        size,
        is_deleted,
        is_dir,
        modified,
        revision,
    });
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn list_page(&self, link: Option<&str>) -> Result<ListPage> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        state.list_calls += 1;
        let offset = match link {
            None => 0,
            Some(link) => link
                .parse::<usize>()
                .map_err(|_| Error::Protocol(format!("bad continuation link {link}")))?,
        };
        let entries: Vec<Entry> = state
            .nodes
            .iter()
            .skip(offset)
            .take(self.list_page_size)
            .map(|(p, n)| Self::entry_for(p, n))
            .collect();
        let next = (offset + entries.len() < state.nodes.len())
            .then(|| (offset + entries.len()).to_string());
        Ok(ListPage { entries, next })
    }

    async fn stat(&self, path: &VaultPath) -> Result<Option<Entry>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        Ok(state.nodes.get(path).map(|n| Self::entry_for(path, n)))
    }

    async fn read(&self, path: &VaultPath) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        match state.nodes.get(path) {
            Some(Node::File { bytes, .. }) => Ok(bytes.clone()),
            _ => Err(Error::NotFound { path: path.clone() }),
        }
    }

    async fn write(&self, path: &VaultPath, bytes: &[u8], overwrite: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        state.write_calls += 1;
        if !overwrite && state.nodes.contains_key(path) {
            return Err(Error::Protocol(format!("{path} already exists")));
        }
        state.clock += 1;
        let mtime = state.clock;
        state.nodes.insert(
            path.clone(),
            Node::File {
                bytes: bytes.to_vec(),
                mtime,
            },
        );
        let size = bytes.len() as u64;
        record(&mut state, path.clone(), size, false, false);
        Ok(())
    }

    async fn mkdir(&self, path: &VaultPath, recursive: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        if recursive {
            for ancestor in path.ancestors() {
                if !ancestor.is_root() && !state.nodes.contains_key(&ancestor) {
                    state.nodes.insert(ancestor.clone(), Node::Dir);
                    record(&mut state, ancestor, 0, false, true);
                }
            }
        }
        if !state.nodes.contains_key(path) {
            state.nodes.insert(path.clone(), Node::Dir);
            record(&mut state, path.clone(), 0, false, true);
        }
        Ok(())
    }

    async fn delete(&self, path: &VaultPath) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        let removed: Vec<VaultPath> = state
            .nodes
            .keys()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        if removed.is_empty() {
            return Err(Error::NotFound { path: path.clone() });
        }
        for p in removed {
            let was_dir = matches!(state.nodes.remove(&p), Some(Node::Dir));
            record(&mut state, p, 0, true, was_dir);
        }
        Ok(())
    }

    async fn latest_cursor(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        Ok(state.feed.len().to_string())
    }

    async fn delta(&self, cursor: &str) -> Result<DeltaPage> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state)?;
        state.delta_calls += 1;
        if state.pending_reset {
            state.pending_reset = false;
            return Ok(DeltaPage {
                cursor: cursor.to_string(),
                reset: true,
                has_more: false,
                entries: Vec::new(),
            });
        }
        let from = cursor
            .parse::<usize>()
            .map_err(|_| Error::Protocol(format!("bad cursor {cursor}")))?;
        let from = from.min(state.feed.len());
        let entries: Vec<DeltaEntry> = state
            .feed
            .iter()
            .skip(from)
            .take(self.delta_page_size)
            .cloned()
            .collect();
        let next = from + entries.len();
        Ok(DeltaPage {
            cursor: next.to_string(),
            reset: false,
            has_more: next < state.feed.len(),
            entries,
        })
    }
}
