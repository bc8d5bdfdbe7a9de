//! SQLite databases storing the graph and the path index.
//!
//! A single database file contains both the graph (tables `Nodes` and `Edges`) and the path index (table `KeyValues`).
//! The graph is accessed through [`GraphBase`] and the path index through [`KeyValueBase`].
//! Each of them has its own connection, so both can be borrowed mutably at the same time.

use crate::{utils, GraphNode, GraphStore, NodeId, PathIndex, Value};

use std::path::Path;
use std::time::Duration;

use log::info;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use rusqlite::types::Value as SqlValue;


//-----------------------------------------------------------------------------

// Key for database version.
const KEY_VERSION: &str = "version";

/// Current database version.
pub const VERSION: &str = "prairiedog-base v0.1.0";

// How long a connection waits for the other connection to release a lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

// Value kinds in table `KeyValues`.
const KIND_INT: i64 = 0;
const KIND_TEXT: i64 = 1;
const KIND_PATH: i64 = 2;

/// Creates a new database in the given file.
///
/// # Errors
///
/// Returns an error if the database already exists.
/// Passes through any database errors.
pub fn create<P: AsRef<Path>>(filename: P) -> Result<(), String> {
    info!("Creating database {}", filename.as_ref().display());
    if utils::file_exists(&filename) {
        return Err(format!("Database {} already exists", filename.as_ref().display()));
    }

    let mut connection = Connection::open(filename).map_err(|x| x.to_string())?;
    create_tables(&mut connection).map_err(|x| x.to_string())
}

fn create_tables(connection: &mut Connection) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;

    transaction.execute(
        "CREATE TABLE Tags (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) STRICT",
        (),
    )?;
    transaction.execute(
        "INSERT INTO Tags(key, value) VALUES (?1, ?2)",
        (KEY_VERSION, VERSION),
    )?;

    // AUTOINCREMENT guarantees that identifiers are never reused.
    transaction.execute(
        "CREATE TABLE Nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sequence BLOB NOT NULL
        ) STRICT",
        (),
    )?;
    transaction.execute(
        "CREATE INDEX NodeSequence ON Nodes(sequence)",
        (),
    )?;

    // No primary key, as duplicate edges are allowed.
    transaction.execute(
        "CREATE TABLE Edges (
            source INTEGER NOT NULL REFERENCES Nodes(id),
            destination INTEGER NOT NULL REFERENCES Nodes(id)
        ) STRICT",
        (),
    )?;
    transaction.execute(
        "CREATE INDEX EdgeSource ON Edges(source)",
        (),
    )?;

    transaction.execute(
        "CREATE TABLE KeyValues (
            key TEXT PRIMARY KEY,
            kind INTEGER NOT NULL,
            value ANY NOT NULL
        ) STRICT",
        (),
    )?;

    transaction.commit()
}

// Opens a read-write connection to an existing database and checks the version.
fn open_connection<P: AsRef<Path>>(filename: P) -> Result<Connection, String> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = Connection::open_with_flags(filename, flags).map_err(|x| x.to_string())?;

    let version: String = connection.query_row(
        "SELECT value FROM Tags WHERE key = ?1",
        (KEY_VERSION,),
        |row| row.get(0)
    ).map_err(|x| format!("Key not found: {} ({})", KEY_VERSION, x))?;
    if version != VERSION {
        return Err(format!("Unsupported database version: {} (expected {})", version, VERSION));
    }

    // Every write is a separate transaction, so we do not want to wait for the disk after each of them.
    connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|x| x.to_string())?;
    connection.pragma_update(None, "synchronous", "NORMAL").map_err(|x| x.to_string())?;
    connection.pragma_update(None, "foreign_keys", "ON").map_err(|x| x.to_string())?;
    connection.busy_timeout(BUSY_TIMEOUT).map_err(|x| x.to_string())?;

    Ok(connection)
}

//-----------------------------------------------------------------------------

/// A database connection for the graph.
///
/// # Examples
///
/// ```
/// use prairiedog::db::{self, GraphBase};
/// use prairiedog::GraphStore;
///
/// let dir = std::env::temp_dir().join(format!("graph-base-{}", std::process::id()));
/// std::fs::create_dir_all(&dir).unwrap();
/// let db_file = dir.join("example.db");
/// let _ = std::fs::remove_file(&db_file);
///
/// db::create(&db_file).unwrap();
/// let mut graph = GraphBase::open(&db_file).unwrap();
/// let first = graph.create_node(b"GATTACA").unwrap();
/// let second = graph.create_node(b"ATTACAG").unwrap();
/// graph.create_edge(first, second).unwrap();
///
/// assert_eq!(graph.nodes(), Ok(2));
/// assert_eq!(graph.successors(first), Ok(vec![second]));
/// assert_eq!(graph.query(b"ATTACAG"), Ok(Some(second)));
///
/// drop(graph);
/// let _ = std::fs::remove_dir_all(&dir);
/// ```
#[derive(Debug)]
pub struct GraphBase {
    connection: Connection,
}

impl GraphBase {
    /// Opens a connection to the database in the given file.
    ///
    /// Passes through any database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let connection = open_connection(filename)?;
        Ok(GraphBase { connection })
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Returns the number of nodes in the graph.
    pub fn nodes(&self) -> Result<usize, String> {
        self.connection.query_row(
            "SELECT COUNT(*) FROM Nodes", (), |row| row.get(0)
        ).map_err(|x| x.to_string())
    }

    /// Returns the number of edges in the graph, including duplicates.
    pub fn edges(&self) -> Result<usize, String> {
        self.connection.query_row(
            "SELECT COUNT(*) FROM Edges", (), |row| row.get(0)
        ).map_err(|x| x.to_string())
    }

    /// Returns the node with the given identifier, or [`None`] if there is no such node.
    pub fn get_node(&self, id: NodeId) -> Result<Option<GraphNode>, String> {
        let mut get_node = self.connection.prepare_cached(
            "SELECT sequence FROM Nodes WHERE id = ?1"
        ).map_err(|x| x.to_string())?;
        get_node.query_row(
            (id,),
            |row| Ok(GraphNode { id, sequence: row.get(0)? })
        ).optional().map_err(|x| x.to_string())
    }

    /// Returns the destinations of all edges starting from the given node, in creation order.
    pub fn successors(&self, id: NodeId) -> Result<Vec<NodeId>, String> {
        let mut successors = self.connection.prepare_cached(
            "SELECT destination FROM Edges WHERE source = ?1 ORDER BY rowid"
        ).map_err(|x| x.to_string())?;
        let mut result = Vec::new();
        let mut rows = successors.query((id,)).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            result.push(row.get(0).map_err(|x| x.to_string())?);
        }
        Ok(result)
    }
}

impl GraphStore for GraphBase {
    fn create_node(&mut self, sequence: &[u8]) -> Result<NodeId, String> {
        let mut insert = self.connection.prepare_cached(
            "INSERT INTO Nodes(sequence) VALUES (?1)"
        ).map_err(|x| x.to_string())?;
        let id = insert.insert((sequence,)).map_err(|x| x.to_string())?;
        Ok(id as NodeId)
    }

    fn create_edge(&mut self, source: NodeId, destination: NodeId) -> Result<(), String> {
        let mut insert = self.connection.prepare_cached(
            "INSERT INTO Edges(source, destination) VALUES (?1, ?2)"
        ).map_err(|x| x.to_string())?;
        insert.execute((source, destination)).map_err(
            |x| format!("Cannot create edge {} -> {}: {}", source, destination, x)
        )?;
        Ok(())
    }

    fn query(&mut self, term: &[u8]) -> Result<Option<NodeId>, String> {
        let mut find = self.connection.prepare_cached(
            "SELECT id FROM Nodes WHERE sequence = ?1 ORDER BY id LIMIT 1"
        ).map_err(|x| x.to_string())?;
        find.query_row((term,), |row| row.get(0)).optional().map_err(|x| x.to_string())
    }

    fn drop_all(&mut self) -> Result<(), String> {
        let transaction = self.connection.transaction().map_err(|x| x.to_string())?;
        transaction.execute("DELETE FROM Edges", ()).map_err(|x| x.to_string())?;
        transaction.execute("DELETE FROM Nodes", ()).map_err(|x| x.to_string())?;
        transaction.commit().map_err(|x| x.to_string())
    }
}

//-----------------------------------------------------------------------------

/// A database connection for the path index.
///
/// Values are stored in table `KeyValues` together with their kind.
/// Paths are stored as blobs of little-endian 64-bit integers.
#[derive(Debug)]
pub struct KeyValueBase {
    connection: Connection,
}

impl KeyValueBase {
    /// Opens a connection to the database in the given file.
    ///
    /// Passes through any database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let connection = open_connection(filename)?;
        Ok(KeyValueBase { connection })
    }

    /// Returns all keys in sorted order.
    pub fn keys(&self) -> Result<Vec<String>, String> {
        let mut statement = self.connection.prepare_cached(
            "SELECT key FROM KeyValues ORDER BY key"
        ).map_err(|x| x.to_string())?;
        let mut result = Vec::new();
        let mut rows = statement.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            result.push(row.get(0).map_err(|x| x.to_string())?);
        }
        Ok(result)
    }
}

impl PathIndex for KeyValueBase {
    fn set(&mut self, key: &str, value: &Value) -> Result<(), String> {
        let mut insert = self.connection.prepare_cached(
            "INSERT OR REPLACE INTO KeyValues(key, kind, value) VALUES (?1, ?2, ?3)"
        ).map_err(|x| x.to_string())?;
        let result = match value {
            Value::Int(value) => insert.execute((key, KIND_INT, value)),
            Value::Text(value) => insert.execute((key, KIND_TEXT, value)),
            Value::Path(path) => insert.execute((key, KIND_PATH, encode_path(path))),
        };
        result.map_err(|x| format!("Cannot set key {}: {}", key, x))?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, String> {
        let mut get_value = self.connection.prepare_cached(
            "SELECT kind, value FROM KeyValues WHERE key = ?1"
        ).map_err(|x| x.to_string())?;
        let row: Option<(i64, SqlValue)> = get_value.query_row(
            (key,),
            |row| Ok((row.get(0)?, row.get(1)?))
        ).optional().map_err(|x| x.to_string())?;

        let Some((kind, value)) = row else {
            return Ok(None);
        };
        match (kind, value) {
            (KIND_INT, SqlValue::Integer(value)) => Ok(Some(Value::Int(value))),
            (KIND_TEXT, SqlValue::Text(value)) => Ok(Some(Value::Text(value))),
            (KIND_PATH, SqlValue::Blob(bytes)) => Ok(Some(Value::Path(decode_path(&bytes)?))),
            (kind, _) => Err(format!("Invalid value of kind {} for key {}", kind, key)),
        }
    }
}

//-----------------------------------------------------------------------------

// Encodes a path as little-endian 64-bit integers.
fn encode_path(path: &[u64]) -> Vec<u8> {
    let mut result = Vec::with_capacity(path.len() * 8);
    for id in path {
        result.extend_from_slice(&id.to_le_bytes());
    }
    result
}

// Decodes a path encoded with `encode_path`.
fn decode_path(bytes: &[u8]) -> Result<Vec<u64>, String> {
    if bytes.len() % 8 != 0 {
        return Err(format!("Invalid path encoding of {} bytes", bytes.len()));
    }
    let mut result = Vec::with_capacity(bytes.len() / 8);
    for chunk in bytes.chunks_exact(8) {
        let mut buf = [0; 8];
        buf.copy_from_slice(chunk);
        result.push(u64::from_le_bytes(buf));
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
