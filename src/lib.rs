//! # prairiedog: k-mer pangenome graphs stored in SQLite.
//!
//! This crate builds a pangenome-style graph from FASTA-style sequence files.
//! Each pair of consecutive k-mers in the same contig becomes a directed edge between nodes for the two k-mers.
//! For each contig, the nodes visited by the contig are stored as a path with the contig header as the key.
//!
//! The pipeline has three stages:
//!
//! * [`load_sequences`] reads a sequence file into a list of [`SequenceRecord`]s.
//! * [`KmerStream`] slides a window of width k over each contig and produces [`KmerWindow`]s in order.
//! * [`GraphAssembler`] creates the nodes and edges in a [`GraphStore`] and the contig paths in a [`PathIndex`].
//!
//! [`ingest_file`] runs all three stages for a single file.
//!
//! ### Stores
//!
//! The graph and the path index are accessed through the [`GraphStore`] and [`PathIndex`] traits.
//! [`GraphBase`] and [`KeyValueBase`] store them in a SQLite database (see [`db`]).
//! [`MemoryGraph`] and [`MemoryIndex`] keep them in memory.
//!
//! ### Nodes
//!
//! By default ([`NodePolicy::PerEdge`]), every edge gets two new nodes, so the graph is a multigraph rather than a de Bruijn graph.
//! With [`NodePolicy::PerOccurrence`], adjacent edges share the node of the k-mer between them.
//! With [`NodePolicy::Distinct`], each distinct k-mer sequence becomes a single node.
//!
//! ### Contigs
//!
//! Contigs shorter than k have no k-mers.
//! They are skipped with a warning and contribute no nodes, edges, or paths.
//! A contig of length exactly k becomes a single node with a one-node path.

pub mod assembler;
pub mod db;
pub mod error;
pub mod kmers;
pub mod sequence;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod internal;

pub use assembler::{ingest_file, AssemblyParams, Cancellation, GraphAssembler, IngestConfig, NodePolicy};
pub use db::{GraphBase, KeyValueBase};
pub use error::IngestError;
pub use kmers::{KmerStream, KmerWindow};
pub use sequence::{load_sequences, read_sequences, SequenceRecord};
pub use store::{ContigPath, GraphEdge, GraphNode, GraphStore, NodeId, PathIndex, Value};
pub use store::{MemoryGraph, MemoryIndex};
