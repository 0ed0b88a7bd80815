//! Frequency Scan Tests

use crate::common::*;
use railstat::{
    BitSet, CancellationToken, FrequencyScanner, IndexSnapshot, RailCache, RailConfig, RailError,
    RailStore, ScanOptions, ScanStrategy,
};

#[test]
fn matches_brute_force() {
    let corpus = TestCorpus::synthetic(31, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let freqs = FrequencyScanner::scan(&store, &ScanOptions::new()).unwrap();
    assert_eq!(freqs.len(), corpus.dictionary_size());
    assert_eq!(freqs, brute_force_freqs(&corpus.index, None));
    assert_eq!(freqs.iter().sum::<u64>(), store.total_tokens());
}

#[test]
fn filter_restricts_documents() {
    let corpus = TestCorpus::synthetic(37, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    for percent in [0, 10, 50, 100] {
        let filter = random_filter(percent as u64, corpus.index.doc_count() as usize, percent);
        let freqs =
            FrequencyScanner::scan(&store, &ScanOptions::new().with_filter(&filter)).unwrap();
        assert_eq!(freqs, brute_force_freqs(&corpus.index, Some(&filter)), "{percent}%");
    }
}

#[test]
fn filter_longer_than_rail_is_clamped() {
    let corpus = TestCorpus::from_streams(&streams(&[&["a"], &["b"]]));
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let filter = BitSet::full(64);
    let freqs = FrequencyScanner::scan(&store, &ScanOptions::new().with_filter(&filter)).unwrap();
    assert_eq!(freqs[corpus.id("a") as usize], 1);
    assert_eq!(freqs[corpus.id("b") as usize], 1);
}

#[test]
fn deleted_documents_skipped_when_live_only() {
    let mut corpus = TestCorpus::from_streams(&streams(&[&["a", "b"], &["a"], &["a", "c"]]));
    corpus.builder.delete(1);
    corpus.index = corpus.builder.commit();
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();

    let all = FrequencyScanner::scan(&store, &ScanOptions::new()).unwrap();
    assert_eq!(all[corpus.id("a") as usize], 3);

    let live = FrequencyScanner::scan(&store, &ScanOptions::new().live_in(&corpus.index)).unwrap();
    assert_eq!(live[corpus.id("a") as usize], 2);
    assert_eq!(live[corpus.id("c") as usize], 1);
}

#[test]
fn sparse_agrees_with_dense() {
    let corpus = TestCorpus::synthetic(41, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let dense = FrequencyScanner::scan(&store, &ScanOptions::new()).unwrap();
    let sparse = FrequencyScanner::scan_sparse(&store, &ScanOptions::new()).unwrap();

    assert_eq!(sparse.len(), dense.iter().filter(|&&c| c > 0).count());
    for (term, &count) in dense.iter().enumerate() {
        if count == 0 {
            assert!(!sparse.contains_key(term as u64));
        } else {
            assert_eq!(sparse.get(term as u64), count as i64);
        }
    }
}

#[test]
fn partitioned_matches_sequential() {
    let corpus = TestCorpus::synthetic(43, CorpusShape { docs: 500, ..CorpusShape::default() });
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let filter = random_filter(3, 500, 70);
    let sequential =
        FrequencyScanner::scan(&store, &ScanOptions::new().with_filter(&filter)).unwrap();
    for partitions in [0, 1, 3, 16, 1000] {
        let options = ScanOptions::new()
            .with_filter(&filter)
            .with_strategy(ScanStrategy::PartitionedParallel { partitions });
        assert_eq!(FrequencyScanner::scan(&store, &options).unwrap(), sequential);
    }
}

#[test]
fn cancelled_scan_reports_cancellation() {
    let corpus = TestCorpus::synthetic(47, CorpusShape::default());
    let store = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let err = FrequencyScanner::scan(&store, &ScanOptions::new().with_cancel(&token)).unwrap_err();
    assert!(matches!(err, RailError::Cancelled));
}

#[test]
fn in_memory_store_agrees_with_file() {
    let corpus = TestCorpus::synthetic(53, CorpusShape::default());
    let on_disk = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let in_memory = RailStore::in_memory(FIELD, &corpus.index).unwrap();
    assert!(in_memory.path().is_none());
    assert_eq!(
        FrequencyScanner::scan(&in_memory, &ScanOptions::new()).unwrap(),
        FrequencyScanner::scan(&on_disk, &ScanOptions::new()).unwrap()
    );
}

#[test]
fn configured_strategy_drives_cache_scans() {
    let corpus = TestCorpus::synthetic(101, CorpusShape::default());
    let cache = RailCache::new(RailConfig {
        scan_strategy: "partitioned".to_string(),
        partitions: 5,
        ..RailConfig::default()
    });
    let store = cache.get(FIELD, &corpus.index).unwrap();
    let options = cache.scan_options().unwrap();
    assert_eq!(options.strategy, ScanStrategy::PartitionedParallel { partitions: 5 });
    assert_eq!(
        FrequencyScanner::scan(&store, &options).unwrap(),
        brute_force_freqs(&corpus.index, None)
    );
}
