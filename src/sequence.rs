//! Loading contigs from FASTA-style sequence files.

use crate::utils;
use crate::IngestError;

use std::io::BufRead;
use std::path::Path;

use log::debug;


//-----------------------------------------------------------------------------

/// A contig loaded from a sequence file.
///
/// The header is the full header line, including the leading `>`.
/// The sequence is stored as raw bytes without any alphabet checks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceRecord {
    pub header: String,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    /// Returns the length of the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns `true` if the sequence is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// Loads all contigs from the given file, which may be gzip-compressed.
///
/// See [`read_sequences`] for the parsing rules.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be opened or read.
pub fn load_sequences<P: AsRef<Path>>(filename: P) -> Result<Vec<SequenceRecord>, IngestError> {
    let filename = filename.as_ref();
    let reader = utils::open_file(filename).map_err(|x| IngestError::io(filename, x))?;
    let records = read_sequences(reader).map_err(|x| IngestError::io(filename, x))?;
    debug!("Loaded {} contigs from {}", records.len(), filename.display());
    Ok(records)
}

/// Reads all contigs from the given reader.
///
/// A line beginning with `>` starts a new record, and trailing whitespace is removed from the header.
/// All other lines are trimmed and concatenated into the sequence of the current record.
/// Non-empty lines before the first header belong to a record with an empty header.
/// An input without header lines, including an empty input, has exactly one record with an empty header.
pub fn read_sequences<R: BufRead>(reader: R) -> std::io::Result<Vec<SequenceRecord>> {
    let mut result: Vec<SequenceRecord> = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        if line.first() == Some(&b'>') {
            let header = String::from_utf8_lossy(line.trim_ascii_end()).into_owned();
            result.push(SequenceRecord { header, sequence: Vec::new() });
            continue;
        }
        let line = line.trim_ascii();
        if !line.is_empty() {
            if result.is_empty() {
                result.push(SequenceRecord::default());
            }
            if let Some(record) = result.last_mut() {
                record.sequence.extend_from_slice(line);
            }
        }
    }
    if result.is_empty() {
        result.push(SequenceRecord::default());
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
