//! Capability set the shell needs from a tree-service client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by a tree backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No node exists at the path.
    #[error("no node at {0}")]
    NoNode(String),
    /// The node still has children.
    #[error("node {0} has children")]
    NotEmpty(String),
    /// A node already exists at the path.
    #[error("node {0} already exists")]
    NodeExists(String),
    /// The path is not a valid node path.
    #[error("invalid path {0:?}")]
    InvalidPath(String),
    /// The session with the service is unusable.
    #[error("connection failure: {0}")]
    Connection(String),
}

/// Node metadata as reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStat {
    /// Transaction id of the creation.
    pub czxid: i64,
    /// Transaction id of the last payload change.
    pub mzxid: i64,
    /// Transaction id of the last child change.
    pub pzxid: i64,
    /// Creation time, epoch milliseconds.
    pub ctime: i64,
    /// Last modification time, epoch milliseconds.
    pub mtime: i64,
    /// Payload version.
    pub version: i32,
    /// Children version.
    pub cversion: i32,
    /// ACL version.
    pub aversion: i32,
    /// Session owning an ephemeral node, zero otherwise.
    pub ephemeral_owner: i64,
    /// Payload size in bytes.
    pub data_length: i32,
    /// Number of direct children.
    pub num_children: i32,
}

/// Operations the shell performs against the tree service.
///
/// Paths are absolute, `/`-separated. Implementations report a missing node through
/// [`ClientError::NoNode`] except where the method documents an `Option`/`bool` answer.
pub trait TreeClient {
    /// Names of the direct children of `path`, in backend order.
    fn list_children(&self, path: &str) -> Result<Vec<String>, ClientError>;

    /// Payload of `path`, `None` when the node does not exist.
    fn read_payload(&self, path: &str) -> Result<Option<Vec<u8>>, ClientError>;

    /// Whether a node exists at `path`.
    fn path_exists(&self, path: &str) -> Result<bool, ClientError>;

    /// Creates every missing node from the root down to `path`. Existing nodes are left alone.
    fn ensure_path(&mut self, path: &str) -> Result<(), ClientError>;

    /// Creates one node; its parent must exist.
    fn create_node(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError>;

    /// Replaces the payload of an existing node.
    fn set_payload(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError>;

    /// Creates the node with `data`, or overwrites its payload when it already exists.
    fn write_payload(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
        if self.path_exists(path)? {
            self.set_payload(path, data)
        } else {
            self.create_node(path, data)
        }
    }

    /// Deletes `path`, and all its descendants when `recursive` is set.
    fn delete_node(&mut self, path: &str, recursive: bool) -> Result<(), ClientError>;

    /// Metadata of `path`.
    fn describe(&self, path: &str) -> Result<NodeStat, ClientError>;

    /// Sends a four-letter admin word and returns the raw answer.
    fn send_admin(&self, word: &str) -> Result<String, ClientError>;
}

/// Joins a child name onto its parent path.
#[must_use]
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_child_paths() {
        assert_eq!(child_path("/", "a"), "/a");
        assert_eq!(child_path("/a", "b"), "/a/b");
        assert_eq!(child_path("/a/", "b"), "/a/b");
    }

    #[test]
    fn errors_name_the_path() {
        assert_eq!(ClientError::NoNode("/x".into()).to_string(), "no node at /x");
        assert_eq!(
            ClientError::InvalidPath("a//b".into()).to_string(),
            "invalid path \"a//b\""
        );
    }
}
