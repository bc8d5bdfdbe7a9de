//! Sliding k-mer windows over loaded contigs.

use crate::{IngestError, SequenceRecord};

use log::warn;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A k-mer in a contig.
///
/// This is a view into a [`SequenceRecord`], so it is cheap to create and to copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KmerWindow<'a> {
    /// Index of the contig in the records.
    pub contig: usize,
    /// Header of the contig.
    pub header: &'a str,
    /// Starting offset of the k-mer in the contig.
    pub offset: usize,
    /// The k-mer itself, always of length k.
    pub kmer: &'a [u8],
}

//-----------------------------------------------------------------------------

/// An ordered stream of k-mers over a list of contigs.
///
/// The stream visits the contigs in order and slides a window of width `k` over each of them one position at a time.
/// Consecutive k-mers in the same contig overlap by `k - 1` bases.
/// Contigs shorter than `k` are skipped with a warning.
///
/// The stream can be restarted from the beginning with [`KmerStream::restart`], and it always produces the same k-mers in the same order.
/// [`KmerStream::current_contig_has_more_windows`] and [`KmerStream::has_more_contigs`] let the consumer detect contig boundaries before pulling the next k-mer.
///
/// # Examples
///
/// ```
/// use prairiedog::{KmerStream, SequenceRecord};
///
/// let records = vec![SequenceRecord { header: String::from(">A"), sequence: b"GATTACA".to_vec() }];
/// let mut stream = KmerStream::new(&records, 5).unwrap();
///
/// let first = stream.produce_next().unwrap();
/// assert_eq!(first.header, ">A");
/// assert_eq!(first.kmer, b"GATTA");
/// assert!(stream.current_contig_has_more_windows());
///
/// let kmers: Vec<&[u8]> = stream.map(|window| window.kmer).collect();
/// assert_eq!(kmers, vec![&b"ATTAC"[..], &b"TTACA"[..]]);
/// ```
#[derive(Clone, Debug)]
pub struct KmerStream<'a> {
    records: &'a [SequenceRecord],
    contig: usize,
    offset: usize,
    k: usize,
    skipped: Vec<usize>,
}

impl<'a> KmerStream<'a> {
    /// Default k-mer length.
    pub const DEFAULT_K: usize = 11;

    /// Creates a new stream over the given records with k-mer length `k`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidParameter`] if `k` is zero.
    pub fn new(records: &'a [SequenceRecord], k: usize) -> Result<Self, IngestError> {
        if k == 0 {
            return Err(IngestError::InvalidParameter(String::from("k-mer length must be positive")));
        }
        Ok(KmerStream {
            records,
            contig: 0,
            offset: 0,
            k,
            skipped: Vec::new(),
        })
    }

    /// Returns the k-mer length.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the records the stream iterates over.
    #[inline]
    pub fn records(&self) -> &'a [SequenceRecord] {
        self.records
    }

    /// Returns the indexes of the contigs skipped so far for being shorter than `k`.
    pub fn skipped_contigs(&self) -> &[usize] {
        &self.skipped
    }

    /// Moves the stream back to the first k-mer of the first contig.
    pub fn restart(&mut self) {
        self.contig = 0;
        self.offset = 0;
        self.skipped.clear();
    }

    // Returns `true` if contig `contig` has a window starting at `offset`.
    fn has_window(&self, contig: usize, offset: usize) -> bool {
        self.records.get(contig).is_some_and(|record| offset + self.k <= record.len())
    }

    /// Returns the next k-mer, or [`None`] if the stream is exhausted.
    ///
    /// Logs a warning for each contig that is skipped for being shorter than `k`.
    pub fn produce_next(&mut self) -> Option<KmerWindow<'a>> {
        loop {
            let record = self.records.get(self.contig)?;
            if self.offset + self.k <= record.len() {
                let window = KmerWindow {
                    contig: self.contig,
                    header: &record.header,
                    offset: self.offset,
                    kmer: &record.sequence[self.offset..self.offset + self.k],
                };
                self.offset += 1;
                return Some(window);
            }
            if self.offset == 0 {
                warn!(
                    "Contig {} is shorter than the k-mer length {} ({} bp); skipping it",
                    record.header, self.k, record.len()
                );
                self.skipped.push(self.contig);
            }
            self.contig += 1;
            self.offset = 0;
        }
    }

    /// Returns `true` if the next call to [`KmerStream::produce_next`] returns a k-mer from the same contig as the previous call.
    ///
    /// Before the first call, this refers to the first contig.
    pub fn current_contig_has_more_windows(&self) -> bool {
        self.has_window(self.contig, self.offset)
    }

    /// Returns `true` if the stream can still produce k-mers from the current contig or any later contig.
    pub fn has_more_contigs(&self) -> bool {
        self.current_contig_has_more_windows() ||
            (self.contig + 1..self.records.len()).any(|contig| self.has_window(contig, 0))
    }
}

impl<'a> Iterator for KmerStream<'a> {
    type Item = KmerWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.produce_next()
    }
}

//-----------------------------------------------------------------------------
