use crate::db::{self, GraphBase, KeyValueBase};
use crate::{utils, SequenceRecord};

use std::path::{Path, PathBuf};

use tempfile::TempDir;

//-----------------------------------------------------------------------------

// Sequence files.

pub(crate) fn load_test_sequences(filename: &'static str) -> Vec<SequenceRecord> {
    let input = utils::get_test_data(filename);
    let records = crate::load_sequences(&input);
    if let Err(err) = records {
        panic!("Failed to load sequences from {}: {}", input.display(), err);
    }
    records.unwrap()
}

//-----------------------------------------------------------------------------

// Databases.

// The database is deleted when the directory is dropped.
pub(crate) fn create_test_database() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db_file = dir.path().join("graph.db");
    let result = db::create(&db_file);
    assert!(result.is_ok(), "Failed to create database: {}", result.unwrap_err());
    (dir, db_file)
}

pub(crate) fn open_graph_base(filename: &Path) -> GraphBase {
    let database = GraphBase::open(filename);
    assert!(database.is_ok(), "Failed to open graph database: {}", database.unwrap_err());
    database.unwrap()
}

pub(crate) fn open_key_value_base(filename: &Path) -> KeyValueBase {
    let database = KeyValueBase::open(filename);
    assert!(database.is_ok(), "Failed to open key-value database: {}", database.unwrap_err());
    database.unwrap()
}

//-----------------------------------------------------------------------------
