//! Interfaces to the graph store and the path index, with in-memory implementations.
//!
//! The assembler only talks to the stores through [`GraphStore`] and [`PathIndex`].
//! SQLite implementations are in [`crate::db`].
//! [`MemoryGraph`] and [`MemoryIndex`] keep everything in memory.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;


//-----------------------------------------------------------------------------

/// Node identifier assigned by a [`GraphStore`].
pub type NodeId = u64;

/// A k-mer node in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
    pub id: NodeId,
    pub sequence: Vec<u8>,
}

/// A directed edge between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphEdge {
    pub source: NodeId,
    pub destination: NodeId,
}

/// The nodes visited by a contig, in walk order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContigPath {
    pub header: String,
    pub nodes: Vec<NodeId>,
}

impl ContigPath {
    /// Creates an empty path for the contig with the given header.
    pub fn new(header: &str) -> Self {
        ContigPath { header: header.to_string(), nodes: Vec::new() }
    }

    /// Returns the number of nodes in the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the path is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// A value stored in a [`PathIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// An integer.
    Int(i64),
    /// A string.
    Text(String),
    /// An ordered sequence of node identifiers or other unsigned integers.
    Path(Vec<u64>),
}

impl Value {
    /// Returns the path stored in the value, or [`None`] if this is not a path.
    pub fn as_path(&self) -> Option<&[u64]> {
        match self {
            Value::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "{}", value),
            Value::Path(path) => {
                let ids: Vec<String> = path.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", ids.join(", "))
            },
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u64>> for Value {
    fn from(value: Vec<u64>) -> Self {
        Value::Path(value)
    }
}

//-----------------------------------------------------------------------------

/// Durable storage for graph nodes and edges.
///
/// Errors are reported as strings and passed through by the caller.
pub trait GraphStore {
    /// Creates a new node with the given sequence and returns its identifier.
    ///
    /// Every call allocates a new identifier, even if a node with the same sequence already exists.
    fn create_node(&mut self, sequence: &[u8]) -> Result<NodeId, String>;

    /// Creates a directed edge from `source` to `destination`.
    ///
    /// Duplicate edges are not rejected.
    fn create_edge(&mut self, source: NodeId, destination: NodeId) -> Result<(), String>;

    /// Returns the smallest identifier of a node with the given sequence, or [`None`] if there is no such node.
    fn query(&mut self, term: &[u8]) -> Result<Option<NodeId>, String>;

    /// Deletes all nodes and edges.
    fn drop_all(&mut self) -> Result<(), String>;
}

/// Durable key-value storage for contig paths and other values.
pub trait PathIndex {
    /// Stores the value under the key, replacing any existing value.
    fn set(&mut self, key: &str, value: &Value) -> Result<(), String>;

    /// Returns the value stored under the key, or [`None`] if there is no such key.
    fn get(&mut self, key: &str) -> Result<Option<Value>, String>;
}

//-----------------------------------------------------------------------------

/// An in-memory [`GraphStore`].
///
/// Node identifiers start from 1 and are never reused, even after [`GraphStore::drop_all`].
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeId, Vec<u8>>,
    edges: Vec<GraphEdge>,
    by_sequence: HashMap<Vec<u8>, NodeId>,
    next_id: NodeId,
}

impl MemoryGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges, including duplicates.
    pub fn edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns the node with the given identifier.
    pub fn get_node(&self, id: NodeId) -> Option<GraphNode> {
        self.nodes.get(&id).map(|sequence| GraphNode { id, sequence: sequence.clone() })
    }

    /// Returns all edges in creation order.
    pub fn edge_list(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Returns the destinations of edges starting from the given node, in creation order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges.iter().filter(|edge| edge.source == id).map(|edge| edge.destination).collect()
    }
}

impl GraphStore for MemoryGraph {
    fn create_node(&mut self, sequence: &[u8]) -> Result<NodeId, String> {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.insert(id, sequence.to_vec());
        self.by_sequence.entry(sequence.to_vec()).or_insert(id);
        Ok(id)
    }

    fn create_edge(&mut self, source: NodeId, destination: NodeId) -> Result<(), String> {
        for id in [source, destination] {
            if !self.nodes.contains_key(&id) {
                return Err(format!("The graph does not contain node {}", id));
            }
        }
        self.edges.push(GraphEdge { source, destination });
        Ok(())
    }

    fn query(&mut self, term: &[u8]) -> Result<Option<NodeId>, String> {
        Ok(self.by_sequence.get(term).copied())
    }

    fn drop_all(&mut self) -> Result<(), String> {
        self.nodes.clear();
        self.edges.clear();
        self.by_sequence.clear();
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// An in-memory [`PathIndex`].
#[derive(Clone, Debug, Default)]
pub struct MemoryIndex {
    values: BTreeMap<String, Value>,
}

impl MemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|x| x.as_str())
    }
}

impl PathIndex for MemoryIndex {
    fn set(&mut self, key: &str, value: &Value) -> Result<(), String> {
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, String> {
        Ok(self.values.get(key).cloned())
    }
}

//-----------------------------------------------------------------------------
