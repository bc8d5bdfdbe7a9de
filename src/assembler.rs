//! Building the k-mer graph and the contig paths from a stream of k-mers.

use crate::{ContigPath, GraphStore, IngestError, KmerStream, KmerWindow, NodeId, PathIndex, Value};
use crate::sequence;

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};


//-----------------------------------------------------------------------------

/// How k-mers are mapped to graph nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodePolicy {
    /// Every edge gets two new nodes, one for each of its k-mers.
    ///
    /// Adjacent edges of a contig do not share nodes, so the edge from a k-mer and the edge into it start and end at different nodes.
    /// The path of a contig lists the source node of each edge and the destination node of the last edge.
    #[default]
    PerEdge,
    /// Every occurrence of a k-mer becomes a single new node.
    ///
    /// Consecutive edges of a contig share the node between them, so the path is connected in the graph.
    PerOccurrence,
    /// Each distinct k-mer sequence becomes a single node.
    ///
    /// Nodes created in earlier runs are found with [`GraphStore::query`].
    Distinct,
}

impl NodePolicy {
    /// Returns the name of the policy, as accepted by [`str::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            NodePolicy::PerEdge => "per-edge",
            NodePolicy::PerOccurrence => "per-occurrence",
            NodePolicy::Distinct => "distinct",
        }
    }
}

impl FromStr for NodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-edge" => Ok(NodePolicy::PerEdge),
            "per-occurrence" => Ok(NodePolicy::PerOccurrence),
            "distinct" => Ok(NodePolicy::Distinct),
            _ => Err(format!("Unknown node policy: {} (expected per-edge, per-occurrence, or distinct)", s)),
        }
    }
}

/// Graph construction parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyParams {
    /// K-mer length.
    pub k: usize,
    /// Mapping from k-mers to nodes.
    pub node_policy: NodePolicy,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        AssemblyParams {
            k: KmerStream::DEFAULT_K,
            node_policy: NodePolicy::default(),
        }
    }
}

//-----------------------------------------------------------------------------

/// A handle for stopping an assembly run between store operations.
///
/// Clones share the same flag.
/// Writes committed before the cancellation remain in the stores.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// Creates a new handle that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), IngestError> {
        if self.is_cancelled() {
            Err(IngestError::Cancelled)
        } else {
            Ok(())
        }
    }
}

//-----------------------------------------------------------------------------

// Statistics for a single assembly run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct AssemblyStats {
    contigs: usize,
    kmers: usize,
    nodes: usize,
    edges: usize,
}

/// Builds the graph from a [`KmerStream`].
///
/// Each pair of consecutive k-mers in the same contig becomes an edge between nodes for the two k-mers.
/// [`NodePolicy`] decides whether the nodes are new for each edge, shared by adjacent edges, or shared by all occurrences of the k-mer.
/// The nodes visited by each contig are stored in the [`PathIndex`] with the contig header as the key.
/// Any store failure ends the run immediately with [`IngestError::StoreWrite`].
///
/// # Examples
///
/// ```
/// use prairiedog::{GraphAssembler, AssemblyParams, KmerStream, SequenceRecord};
/// use prairiedog::{MemoryGraph, MemoryIndex, PathIndex, Value};
///
/// let records = vec![SequenceRecord { header: String::from(">A"), sequence: b"ACGTACGTACGTA".to_vec() }];
/// let mut graph = MemoryGraph::new();
/// let mut paths = MemoryIndex::new();
///
/// let params = AssemblyParams::default();
/// let mut stream = KmerStream::new(&records, params.k).unwrap();
/// let mut assembler = GraphAssembler::new(&mut graph, &mut paths, params);
/// assembler.assemble(&mut stream).unwrap();
///
/// // Two edges with two new nodes each.
/// assert_eq!(graph.nodes(), 4);
/// assert_eq!(graph.edges(), 2);
/// let path = paths.get(">A").unwrap().unwrap();
/// assert_eq!(path, Value::Path(vec![1, 3, 4]));
/// ```
pub struct GraphAssembler<'a> {
    graph: &'a mut dyn GraphStore,
    paths: &'a mut dyn PathIndex,
    params: AssemblyParams,
    cancellation: Cancellation,
    cache: HashMap<Vec<u8>, NodeId>,
    stats: AssemblyStats,
}

impl<'a> GraphAssembler<'a> {
    /// Creates a new assembler writing to the given stores.
    pub fn new(graph: &'a mut dyn GraphStore, paths: &'a mut dyn PathIndex, params: AssemblyParams) -> Self {
        GraphAssembler {
            graph,
            paths,
            params,
            cancellation: Cancellation::new(),
            cache: HashMap::new(),
            stats: AssemblyStats::default(),
        }
    }

    /// Uses the given cancellation handle for the following runs.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the construction parameters.
    pub fn params(&self) -> &AssemblyParams {
        &self.params
    }

    /// Consumes the stream and writes the graph and the contig paths to the stores.
    ///
    /// A contig with n > 0 edges has a path of n + 1 nodes.
    /// A contig with a single k-mer becomes a single node with a one-node path.
    /// Contigs shorter than `k` are skipped by the stream.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidParameter`] if the stream and the parameters disagree on `k`.
    /// Returns [`IngestError::StoreWrite`] if a store operation fails and [`IngestError::Cancelled`] if the run was cancelled.
    /// Writes made before the error remain in the stores.
    pub fn assemble(&mut self, stream: &mut KmerStream) -> Result<(), IngestError> {
        if stream.k() != self.params.k {
            return Err(IngestError::InvalidParameter(format!(
                "The stream uses k = {} but the assembler expects k = {}", stream.k(), self.params.k
            )));
        }

        let start_time = Instant::now();
        self.stats = AssemblyStats::default();
        while stream.has_more_contigs() {
            let Some(first) = stream.produce_next() else {
                break;
            };
            self.assemble_contig(first, stream)?;
        }

        info!(
            "Assembled {} contigs ({} skipped) with {} k-mers into {} new nodes and {} edges in {:.3} seconds",
            self.stats.contigs, stream.skipped_contigs().len(), self.stats.kmers,
            self.stats.nodes, self.stats.edges,
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }

    // Builds the path for the contig starting with `previous` and stores it.
    fn assemble_contig<'s>(&mut self, mut previous: KmerWindow<'s>, stream: &mut KmerStream<'s>) -> Result<(), IngestError> {
        let mut path = ContigPath::new(previous.header);
        self.stats.kmers += 1;

        // Node for `previous` if the policy shares it with the next edge.
        let mut shared: Option<NodeId> = None;
        let mut last: Option<NodeId> = None;
        while stream.current_contig_has_more_windows() {
            let Some(current) = stream.produce_next() else {
                break;
            };
            self.stats.kmers += 1;
            let source = match shared {
                Some(id) => id,
                None => self.node_for(previous.kmer)?,
            };
            path.nodes.push(source);
            let destination = self.node_for(current.kmer)?;
            self.cancellation.check()?;
            self.graph.create_edge(source, destination).map_err(IngestError::StoreWrite)?;
            self.stats.edges += 1;
            if self.params.node_policy != NodePolicy::PerEdge {
                shared = Some(destination);
            }
            last = Some(destination);
            previous = current;
        }

        // The last window closes the path. A contig with a single window still gets its node.
        let last = match last {
            Some(id) => id,
            None => self.node_for(previous.kmer)?,
        };
        path.nodes.push(last);

        debug!("Contig {}: path with {} nodes", path.header, path.len());
        self.cancellation.check()?;
        self.paths.set(&path.header, &Value::Path(path.nodes)).map_err(IngestError::StoreWrite)?;
        self.stats.contigs += 1;
        Ok(())
    }

    // Returns the node for the k-mer, creating it if necessary.
    fn node_for(&mut self, kmer: &[u8]) -> Result<NodeId, IngestError> {
        if self.params.node_policy == NodePolicy::Distinct {
            if let Some(id) = self.cache.get(kmer) {
                return Ok(*id);
            }
            self.cancellation.check()?;
            if let Some(id) = self.graph.query(kmer).map_err(IngestError::StoreWrite)? {
                self.cache.insert(kmer.to_vec(), id);
                return Ok(id);
            }
        }

        self.cancellation.check()?;
        let id = self.graph.create_node(kmer).map_err(IngestError::StoreWrite)?;
        self.stats.nodes += 1;
        if self.params.node_policy == NodePolicy::Distinct {
            self.cache.insert(kmer.to_vec(), id);
        }
        Ok(id)
    }
}

//-----------------------------------------------------------------------------

/// Configuration for ingesting a sequence file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    /// Input sequence file, which may be gzip-compressed.
    pub input: PathBuf,
    /// Graph construction parameters.
    pub params: AssemblyParams,
}

impl IngestConfig {
    /// Creates a configuration for the given input with default parameters.
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        IngestConfig { input: input.into(), params: AssemblyParams::default() }
    }
}

/// Loads the input file and builds its graph and contig paths in the given stores.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, before anything is written to the stores.
/// Passes through any errors from [`GraphAssembler::assemble`].
pub fn ingest_file(
    config: &IngestConfig,
    graph: &mut dyn GraphStore,
    paths: &mut dyn PathIndex,
    cancellation: &Cancellation
) -> Result<(), IngestError> {
    info!("Ingesting {} with k = {}", config.input.display(), config.params.k);
    let records = sequence::load_sequences(&config.input)?;
    let mut stream = KmerStream::new(&records, config.params.k)?;
    let mut assembler = GraphAssembler::new(graph, paths, config.params.clone())
        .with_cancellation(cancellation.clone());
    assembler.assemble(&mut stream)
}

//-----------------------------------------------------------------------------
