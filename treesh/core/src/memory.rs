//! In-memory tree backend.
//!
//! Keeps the node semantics the shell relies on: parents must exist before children,
//! every change gets a transaction id, payload and children versions move independently.
//! Clones share the same tree.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::client::{child_path, ClientError, NodeStat, TreeClient};

const ROOT: &str = "/";
const SERVER_VERSION: &str = concat!("treesh-memory-", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
struct Node {
    data: Vec<u8>,
    stat: NodeStat,
    children: BTreeSet<String>,
}

impl Node {
    fn new(data: Vec<u8>, zxid: i64, now: i64) -> Self {
        Self {
            data,
            stat: NodeStat {
                czxid: zxid,
                mzxid: zxid,
                pzxid: zxid,
                ctime: now,
                mtime: now,
                ..NodeStat::default()
            },
            children: BTreeSet::new(),
        }
    }

    fn describe(&self) -> NodeStat {
        NodeStat {
            data_length: i32::try_from(self.data.len()).unwrap_or(i32::MAX),
            num_children: i32::try_from(self.children.len()).unwrap_or(i32::MAX),
            ..self.stat
        }
    }
}

#[derive(Debug)]
struct TreeState {
    nodes: BTreeMap<String, Node>,
    last_zxid: i64,
}

impl TreeState {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT.to_owned(), Node::new(Vec::new(), 0, now_millis()));
        Self {
            nodes,
            last_zxid: 0,
        }
    }

    fn next_zxid(&mut self) -> i64 {
        self.last_zxid += 1;
        self.last_zxid
    }

    fn node(&self, path: &str) -> Result<&Node, ClientError> {
        self.nodes
            .get(path)
            .ok_or_else(|| ClientError::NoNode(path.to_owned()))
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut Node, ClientError> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| ClientError::NoNode(path.to_owned()))
    }

    fn touch_parent(&mut self, parent: &str, zxid: i64) -> Result<&mut BTreeSet<String>, ClientError> {
        let node = self.node_mut(parent)?;
        node.stat.cversion += 1;
        node.stat.pzxid = zxid;
        Ok(&mut node.children)
    }

    fn create(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
        let (parent, name) = split_parent(path)?;
        if self.nodes.contains_key(path) {
            return Err(ClientError::NodeExists(path.to_owned()));
        }
        self.node(parent)?;
        let zxid = self.next_zxid();
        self.touch_parent(parent, zxid)?.insert(name.to_owned());
        self.nodes
            .insert(path.to_owned(), Node::new(data.to_vec(), zxid, now_millis()));
        Ok(())
    }

    fn remove_subtree(&mut self, path: &str) {
        let prefix = format!("{path}/");
        let doomed: Vec<String> = self
            .nodes
            .keys()
            .filter(|key| key.as_str() == path || key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in doomed {
            self.nodes.remove(&key);
        }
    }

    fn data_size(&self) -> usize {
        self.nodes.values().map(|node| node.data.len()).sum()
    }
}

/// Tree kept entirely in process memory.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    state: Arc<RwLock<TreeState>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// A tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TreeState::new())),
        }
    }

    /// Builds a tree from a `{ "/path": payload }` document. See [`seed`](Self::seed).
    pub fn from_seed(entries: &Map<String, Value>) -> Result<Self, ClientError> {
        let mut tree = Self::new();
        tree.seed(entries)?;
        Ok(tree)
    }

    /// Writes every entry, creating missing parents. String payloads are stored verbatim,
    /// `null` as an empty payload, anything else as its JSON text. Returns the entry count.
    pub fn seed(&mut self, entries: &Map<String, Value>) -> Result<usize, ClientError> {
        for (path, value) in entries {
            let data = match value {
                Value::String(text) => text.clone().into_bytes(),
                Value::Null => Vec::new(),
                other => other.to_string().into_bytes(),
            };
            let path = normalize(path)?;
            if let Ok((parent, _)) = split_parent(&path) {
                self.ensure_path(parent)?;
            }
            self.write_payload(&path, &data)?;
        }
        Ok(entries.len())
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    fn server_summary(state: &TreeState) -> String {
        format!(
            "Zookeeper version: {SERVER_VERSION}\nLatency min/avg/max: 0/0/0\nReceived: 0\nSent: 0\nConnections: 1\nOutstanding: 0\nZxid: 0x{:x}\nMode: standalone\nNode count: {}\n",
            state.last_zxid,
            state.nodes.len()
        )
    }
}

impl TreeClient for MemoryTree {
    fn list_children(&self, path: &str) -> Result<Vec<String>, ClientError> {
        let path = normalize(path)?;
        let state = self.state.read();
        Ok(state.node(&path)?.children.iter().cloned().collect())
    }

    fn read_payload(&self, path: &str) -> Result<Option<Vec<u8>>, ClientError> {
        let path = normalize(path)?;
        Ok(self.state.read().nodes.get(&path).map(|node| node.data.clone()))
    }

    fn path_exists(&self, path: &str) -> Result<bool, ClientError> {
        let path = normalize(path)?;
        Ok(self.state.read().nodes.contains_key(&path))
    }

    fn ensure_path(&mut self, path: &str) -> Result<(), ClientError> {
        let path = normalize(path)?;
        let mut state = self.state.write();
        let mut current = String::new();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = child_path(if current.is_empty() { ROOT } else { &current }, segment);
            if !state.nodes.contains_key(&current) {
                state.create(&current, &[])?;
            }
        }
        Ok(())
    }

    fn create_node(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
        let path = normalize(path)?;
        self.state.write().create(&path, data)
    }

    fn set_payload(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
        let path = normalize(path)?;
        let mut state = self.state.write();
        state.node(&path)?;
        let zxid = state.next_zxid();
        let node = state.node_mut(&path)?;
        node.data = data.to_vec();
        node.stat.version += 1;
        node.stat.mzxid = zxid;
        node.stat.mtime = now_millis();
        Ok(())
    }

    fn delete_node(&mut self, path: &str, recursive: bool) -> Result<(), ClientError> {
        let path = normalize(path)?;
        let (parent, name) = split_parent(&path)?;
        let mut state = self.state.write();
        if !state.node(&path)?.children.is_empty() && !recursive {
            return Err(ClientError::NotEmpty(path.clone()));
        }
        let zxid = state.next_zxid();
        state.remove_subtree(&path);
        state.touch_parent(parent, zxid)?.remove(name);
        Ok(())
    }

    fn describe(&self, path: &str) -> Result<NodeStat, ClientError> {
        let path = normalize(path)?;
        Ok(self.state.read().node(&path)?.describe())
    }

    fn send_admin(&self, word: &str) -> Result<String, ClientError> {
        let state = self.state.read();
        let response = match word {
            "ruok" => "imok".to_owned(),
            "isro" => "rw".to_owned(),
            "srvr" => Self::server_summary(&state),
            "stat" => format!("{}Clients:\n /127.0.0.1:0[1](queued=0,recved=0,sent=0)\n", Self::server_summary(&state)),
            "mntr" => format!(
                "zk_version\t{SERVER_VERSION}\nzk_server_state\tstandalone\nzk_znode_count\t{}\nzk_approximate_data_size\t{}\nzk_outstanding_requests\t0\n",
                state.nodes.len(),
                state.data_size()
            ),
            "envi" => format!(
                "Environment:\nzookeeper.version={SERVER_VERSION}\nhost.name=localhost\nos.name={}\nos.arch={}\n",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            "conf" => "clientPort=2181\ndataDir=memory\ntickTime=2000\nmaxClientCnxns=60\n".to_owned(),
            "dirs" => format!("datadir_size: {}\nlogdir_size: 0\n", state.data_size()),
            other => format!("{other} is not executed because it is not in the whitelist.\n"),
        };
        Ok(response)
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Canonical form of `path`: absolute, no empty, `.` or `..` segments, no trailing slash.
fn normalize(path: &str) -> Result<String, ClientError> {
    let invalid = || ClientError::InvalidPath(path.to_owned());
    if !path.starts_with('/') {
        return Err(invalid());
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ROOT.to_owned());
    }
    if trimmed[1..]
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(trimmed.to_owned())
}

/// Splits a canonical non-root path into its parent and its last segment.
fn split_parent(path: &str) -> Result<(&str, &str), ClientError> {
    match path.rsplit_once('/') {
        Some((_, "")) | None => Err(ClientError::InvalidPath(path.to_owned())),
        Some(("", name)) => Ok((ROOT, name)),
        Some((parent, name)) => Ok((parent, name)),
    }
}
