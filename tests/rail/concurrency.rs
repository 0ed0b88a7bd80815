//! Concurrent Reader Tests
//!
//! A loaded store is immutable: many threads read and scan it at once.

use std::sync::Arc;
use std::thread;

use crate::common::*;
use railstat::{FrequencyScanner, RailStore, ScanOptions};

#[test]
fn readers_share_one_store() {
    let corpus = TestCorpus::synthetic(17, CorpusShape::default());
    let store = Arc::new(RailStore::for_field(FIELD, &corpus.index).unwrap());
    let expected: Arc<Vec<Vec<u32>>> =
        Arc::new((0..store.doc_count()).map(|d| corpus.tokens(d)).collect());

    let handles: Vec<_> = (0..8u32)
        .map(|t| {
            let store = Arc::clone(&store);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                // each thread walks the docs from a different offset
                let docs = store.doc_count();
                for i in 0..docs {
                    let doc = (i + t * 13) % docs;
                    assert_eq!(store.rail_slice(doc).to_vec(), expected[doc as usize]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn concurrent_scans_agree() {
    let corpus = TestCorpus::synthetic(23, CorpusShape::default());
    let store = Arc::new(RailStore::for_field(FIELD, &corpus.index).unwrap());
    let expected = brute_force_freqs(&corpus.index, None);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || FrequencyScanner::scan(&store, &ScanOptions::new()).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn store_outlives_newer_generation() {
    let mut corpus = TestCorpus::synthetic(29, CorpusShape::default());
    let old = RailStore::for_field(FIELD, &corpus.index).unwrap();
    let old_rails: Vec<_> = (0..old.doc_count()).map(|d| old.rail_slice(d).to_vec()).collect();

    corpus.append(&streams(&[&["w1", "w2"]]));
    let new = RailStore::for_field(FIELD, &corpus.index).unwrap();
    assert_eq!(new.doc_count(), old.doc_count() + 1);

    // the replaced file stays readable through the old mapping
    for (doc, rail) in old_rails.iter().enumerate() {
        assert_eq!(&old.rail_slice(doc as u32).to_vec(), rail);
    }
}
