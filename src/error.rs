//! Errors reported by the ingestion pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

//-----------------------------------------------------------------------------

/// A fatal error that ends an ingestion run.
///
/// Short contigs are not errors.
/// They are reported with [`log::warn!`] and listed by [`crate::KmerStream::skipped_contigs`].
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file could not be opened or read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A construction parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A node, edge, or path write failed.
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// The run was stopped through a [`crate::Cancellation`] handle.
    #[error("Assembly cancelled")]
    Cancelled,
}

impl IngestError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        IngestError::Io { path: path.into(), source }
    }
}

//-----------------------------------------------------------------------------
