use super::*;

use crate::internal;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//-----------------------------------------------------------------------------

fn create_stream(records: &[SequenceRecord], k: usize) -> KmerStream<'_> {
    let stream = KmerStream::new(records, k);
    assert!(stream.is_ok(), "Failed to create a stream with k = {}: {}", k, stream.unwrap_err());
    stream.unwrap()
}

fn collect_pairs(records: &[SequenceRecord], k: usize) -> Vec<(String, Vec<u8>)> {
    create_stream(records, k).map(|window| (window.header.to_string(), window.kmer.to_vec())).collect()
}

fn random_records(rng: &mut StdRng, contigs: usize, max_len: usize) -> Vec<SequenceRecord> {
    let mut result = Vec::with_capacity(contigs);
    for i in 0..contigs {
        let len = rng.gen_range(0..=max_len);
        let sequence: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        result.push(SequenceRecord { header: format!(">random_{}", i), sequence });
    }
    result
}

//-----------------------------------------------------------------------------

#[test]
fn example_contig() {
    let records = internal::load_test_sequences("single.fa");
    let kmers: Vec<Vec<u8>> = collect_pairs(&records, KmerStream::DEFAULT_K).into_iter().map(|(_, kmer)| kmer).collect();
    assert_eq!(
        kmers,
        vec![b"ACGTACGTACG".to_vec(), b"CGTACGTACGT".to_vec(), b"GTACGTACGTA".to_vec()]
    );
}

#[test]
fn short_first_contig() {
    let records = internal::load_test_sequences("short-first.fa");
    let mut stream = create_stream(&records, KmerStream::DEFAULT_K);
    let windows: Vec<KmerWindow> = stream.by_ref().collect();
    assert_eq!(windows.len(), 4, "Wrong number of k-mers");
    assert!(windows.iter().all(|x| x.header == ">long" && x.contig == 1), "K-mers from the wrong contig");
    assert_eq!(stream.skipped_contigs(), &[0usize], "The short contig was not recorded");
}

#[test]
fn contig_boundaries() {
    let records = internal::load_test_sequences("contigs.fa");
    let mut stream = create_stream(&records, KmerStream::DEFAULT_K);
    assert!(stream.has_more_contigs());

    // (contig, number of k-mers)
    let expected: [(usize, usize); 3] = [(0, 22), (2, 1), (3, 20)];
    for (contig, count) in expected {
        for i in 0..count {
            let window = stream.produce_next();
            assert!(window.is_some(), "Stream ended early in contig {} at k-mer {}", contig, i);
            let window = window.unwrap();
            assert_eq!(window.contig, contig, "Wrong contig for k-mer {}", i);
            assert_eq!(window.offset, i, "Wrong offset in contig {}", contig);
            assert_eq!(window.kmer, &records[contig].sequence[i..i + 11], "Wrong k-mer in contig {} at {}", contig, i);
            assert_eq!(stream.current_contig_has_more_windows(), i + 1 < count, "Wrong lookahead in contig {} at {}", contig, i);
        }
    }
    assert!(!stream.has_more_contigs(), "The stream should be exhausted");
    assert!(stream.produce_next().is_none());
    assert!(stream.produce_next().is_none(), "Exhausted stream produced a k-mer");
    assert_eq!(stream.skipped_contigs(), &[1usize]);
}

#[test]
fn trailing_short_contig() {
    let records = vec![
        SequenceRecord { header: String::from(">long"), sequence: b"ACGTACGT".to_vec() },
        SequenceRecord { header: String::from(">short"), sequence: b"ACG".to_vec() },
    ];
    let mut stream = create_stream(&records, 4);
    let count = records[0].len() - 4 + 1;
    for i in 0..count {
        assert!(stream.has_more_contigs(), "No more contigs before k-mer {}", i);
        assert!(stream.current_contig_has_more_windows(), "No more windows before k-mer {}", i);
        assert!(stream.produce_next().is_some(), "Stream ended early at k-mer {}", i);
    }
    assert!(!stream.current_contig_has_more_windows());
    assert!(!stream.has_more_contigs(), "Only a short contig remains");
    assert!(stream.produce_next().is_none());
    assert_eq!(stream.skipped_contigs(), &[1usize]);
}

#[test]
fn invalid_k() {
    let records = internal::load_test_sequences("single.fa");
    let result = KmerStream::new(&records, 0);
    assert!(matches!(result, Err(IngestError::InvalidParameter(_))), "Accepted k = 0");
}

#[test]
fn empty_input() {
    let records: Vec<SequenceRecord> = Vec::new();
    let mut stream = create_stream(&records, 3);
    assert!(!stream.has_more_contigs());
    assert!(stream.produce_next().is_none());
}

//-----------------------------------------------------------------------------

#[test]
fn restart_is_deterministic() {
    let records = internal::load_test_sequences("contigs.fa");
    let mut stream = create_stream(&records, 7);
    let first: Vec<KmerWindow> = stream.by_ref().collect();
    stream.restart();
    assert!(stream.skipped_contigs().is_empty(), "Restart did not clear skipped contigs");
    let second: Vec<KmerWindow> = stream.by_ref().collect();
    assert_eq!(first, second, "Restarted stream differs");

    let reloaded = internal::load_test_sequences("contigs.fa");
    assert_eq!(collect_pairs(&reloaded, 7), collect_pairs(&records, 7), "Reloaded input differs");
}

#[test]
fn random_contigs() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for k in [1, 2, 5, 11, 21] {
        let records = random_records(&mut rng, 20, 40);
        let mut stream = create_stream(&records, k);
        let windows: Vec<KmerWindow> = stream.by_ref().collect();

        // Number of k-mers per contig and skipped contigs.
        for (contig, record) in records.iter().enumerate() {
            let count = windows.iter().filter(|x| x.contig == contig).count();
            if record.len() >= k {
                assert_eq!(count, record.len() - k + 1, "Wrong number of k-mers for contig {} with k = {}", contig, k);
            } else {
                assert_eq!(count, 0, "Short contig {} produced k-mers with k = {}", contig, k);
                assert!(stream.skipped_contigs().contains(&contig), "Short contig {} not reported with k = {}", contig, k);
            }
        }

        // Consecutive k-mers of the same contig overlap by k - 1.
        for pair in windows.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            assert_eq!(prev.kmer.len(), k);
            if prev.contig == next.contig {
                assert_eq!(next.offset, prev.offset + 1, "Offsets not consecutive with k = {}", k);
                assert_eq!(prev.kmer[1..], next.kmer[..k - 1], "K-mers do not overlap with k = {}", k);
            } else {
                assert!(prev.contig < next.contig, "Contigs out of order with k = {}", k);
                assert_eq!(next.offset, 0, "Contig does not start at offset 0 with k = {}", k);
            }
        }
    }
}

//-----------------------------------------------------------------------------
